pub mod meshlet;
