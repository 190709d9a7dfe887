use thiserror::Error;

/// Error outputs from the KwikPass SDK.
///
/// Every async operation on [`crate::auth::AuthSessionManager`] resolves to
/// either a success value or one of these variants; nothing escapes as a
/// panic. Persistence failures are not represented here; the store layer
/// swallows them (see [`crate::store::KeyValueStore`]).
#[derive(Debug, Error, uniffi::Error)]
pub enum KwikPassError {
    /// A local input failed validation before any network call was made.
    /// Surfaced to the UI as a field-keyed message.
    #[error("validation_error: {field}: {message}")]
    Validation {
        /// The input field the message belongs to (e.g. `otp`, `email`).
        field: String,
        /// Human-readable message for display.
        message: String,
    },

    /// The API could not be reached or the transport failed mid-flight.
    #[error("network_error: {0}")]
    Network(String),

    /// The API answered with a non-success status.
    #[error("api_error: {message}")]
    Api {
        /// Human-readable reason, taken from the error body when present.
        message: String,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// The `request-id` response header, for support correlation.
        request_id: Option<String>,
    },

    /// Unexpected error serializing or parsing information.
    #[error("serialization_error: {0}")]
    Serialization(String),

    /// Unexpected `UniFFI` callback error raised by a foreign collaborator.
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for KwikPassError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}

impl From<reqwest::Error> for KwikPassError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}
