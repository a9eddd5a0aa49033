pub mod attributes;
pub mod error;
pub mod process;

#[cfg(test)]
mod tests;
