use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SGError
{
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    #[error("unsupported B-spline degree {0}")]
    UnsupportedDegree(usize),
    #[error("point lies outside of the grid domain")]
    OutOfDomain,
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("number of points and values do not match")]
    NumberOfPointsAndValuesMismatch,
    #[error("resource exhausted while allocating grid data")]
    ResourceExhausted,
    #[error("invalid sequence number {0}")]
    InvalidIndex(usize),
    #[error("LZ4 decompression failed")]
    LZ4DecompressionFailed,
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
    #[error("deserialization failed: {0}")]
    DeserializationFailed(String),
    #[error("file I/O error: {0}")]
    FileIOError(String),
}

impl From<std::io::Error> for SGError
{
    fn from(value: std::io::Error) -> Self {
        SGError::FileIOError(value.to_string())
    }
}

impl From<std::collections::TryReserveError> for SGError
{
    fn from(_value: std::collections::TryReserveError) -> Self {
        SGError::ResourceExhausted
    }
}
