use meshlet_payload_disk::error::PayloadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
	#[error(transparent)]
	Payload(#[from] PayloadError),

	#[error("{found} streams per meshlet are not supported, must be within 1..={max}")]
	UnsupportedStreamCount { found: usize, max: usize },
}
