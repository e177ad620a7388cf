use thiserror::Error;

/// Why a single metadata fetch failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("gateway responded with status {status}")]
    RemoteError { status: u16 },

    #[error("response body is not a JSON object: {0}")]
    DecodeError(String),

    #[error("network error: {0}")]
    NetworkError(String),
}

impl FetchError {
    /// Short label used for log fields and metric names.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RemoteError { .. } => "remote_error",
            Self::DecodeError(_) => "decode_error",
            Self::NetworkError(_) => "network_error",
        }
    }
}

/// Why a metadata store operation failed.
///
/// A missing record is not an error: lookups return `Ok(None)` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("store connectivity error: {0}")]
    ConnectivityError(String),

    #[error("encode error: {0}")]
    EncodeError(String),
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::ConnectivityError(_) => "connectivity_error",
            Self::EncodeError(_) => "encode_error",
        }
    }

    /// Map to an HTTP status code for API responses.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ConstraintViolation(_) => 409,
            Self::ConnectivityError(_) => 503,
            Self::EncodeError(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_kinds() {
        assert_eq!(FetchError::RemoteError { status: 404 }.kind(), "remote_error");
        assert_eq!(FetchError::DecodeError("x".into()).kind(), "decode_error");
        assert_eq!(FetchError::NetworkError("x".into()).kind(), "network_error");
    }

    #[test]
    fn remote_error_message_includes_status() {
        let err = FetchError::RemoteError { status: 502 };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn store_error_status_codes() {
        assert_eq!(StoreError::ConstraintViolation("dup".into()).status_code(), 409);
        assert_eq!(StoreError::ConnectivityError("down".into()).status_code(), 503);
        assert_eq!(StoreError::EncodeError("bad".into()).status_code(), 500);
    }
}
