//! Error kinds of the assembler.
use packed_sequence::CodecError;

pub type Result<T> = std::result::Result<T, AssemblyError>;

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// No reads, or reads that could not be ingested.
    #[error("input error: {0}")]
    Input(String),
    /// A contig operation called with ids it can not accept. Nothing is modified.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// No platform/device matched the selectors.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    /// Transfer, build, or execution failure of the compute device.
    #[error("device operation failed: {0}")]
    DeviceOperationFailed(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
