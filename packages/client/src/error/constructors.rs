use std::fmt::Display;

use super::types::SyncError;

/// Creates a `SyncError` for malformed PEM or DER input.
pub fn certificate_parse<E: Display>(e: E) -> SyncError {
    SyncError::CertificateParse(e.to_string())
}

/// Creates a `SyncError` for an out-of-range parameter.
pub fn invalid_parameter<E: Display>(e: E) -> SyncError {
    SyncError::InvalidParameter(e.to_string())
}

pub fn configuration<E: Display>(e: E) -> SyncError {
    SyncError::Configuration(e.to_string())
}

/// Creates a `SyncError` for a provider response carrying an HTTP status.
pub fn provider_status(operation: &'static str, status: u16, message: impl Into<String>) -> SyncError {
    SyncError::ProviderApi {
        operation,
        status: Some(status),
        message: format!("HTTP {status}: {}", message.into()),
    }
}

/// Creates a `SyncError` for a provider call that never produced a response.
pub fn transport<E: Display>(operation: &'static str, e: E) -> SyncError {
    SyncError::ProviderApi {
        operation,
        status: None,
        message: e.to_string(),
    }
}

/// Creates a `SyncError` for a provider response body that could not be decoded.
pub fn decode<E: Display>(operation: &'static str, e: E) -> SyncError {
    SyncError::ProviderApi {
        operation,
        status: None,
        message: format!("error decoding response body: {e}"),
    }
}

pub fn propagation(owner: &str, message: impl Into<String>) -> SyncError {
    SyncError::PropagationCheck {
        owner: owner.to_string(),
        message: message.into(),
    }
}

pub fn delete_failed(owner: &str, record_id: &str, source: SyncError) -> SyncError {
    SyncError::DeleteFailed {
        owner: owner.to_string(),
        record_id: record_id.to_string(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_status_message() {
        let err = provider_status("list zones", 403, "Authentication error");
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("list zones"));
        assert!(err.to_string().contains("HTTP 403"));
        assert!(!err.is_local());
    }

    #[test]
    fn test_delete_failed_keeps_source() {
        let source = transport("delete record", "connection reset");
        let err = delete_failed("_25._tcp.mail.example.com", "abc123", source);
        assert!(err.to_string().contains("abc123"));
        assert!(err.to_string().contains("connection reset"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_local_errors() {
        assert!(invalid_parameter("matching type 3").is_local());
        assert!(certificate_parse("no PEM").is_local());
        assert!(
            !SyncError::ZoneNotFound {
                domain: "example.com".to_string()
            }
            .is_local()
        );
    }
}
