use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors a [`super::DurableStore`] implementation may raise.
///
/// The cache layer logs these and keeps serving from memory; they never
/// propagate to SDK callers.
#[derive(Debug, Error, uniffi::Error)]
pub enum StoreError {
    /// The host storage backend failed to read or write.
    #[error("storage backend error: {0}")]
    Io(String),

    /// Unexpected `UniFFI` callback error raised by the host implementation.
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for StoreError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}
