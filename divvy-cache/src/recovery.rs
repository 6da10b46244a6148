//! Failure classification and recovery.
//!
//! | Failure            | Status afterwards             | Message          | Items kept |
//! |--------------------|-------------------------------|------------------|------------|
//! | invalid key        | unchanged                     | validation text  | n/a        |
//! | 4xx                | `Error`                       | payload or default | no       |
//! | 5xx, network, other| prior `Success`, else `Error` | fixed fallback   | if `Success` |

use divvy_core::{FailureKind, IntoResourceKey, LoadError, ResourceKey, TransportError, ValidationError};

use crate::domain::Domain;
use crate::entry::CacheEntry;

/// Validate a caller-supplied key before any I/O.
pub fn validate_key<D: Domain>(key: impl IntoResourceKey) -> Result<ResourceKey, LoadError> {
    key.into_resource_key().map_err(|source| {
        LoadError::Validation(ValidationError::InvalidKey {
            label: D::KEY_LABEL,
            source,
        })
    })
}

/// Classify a transport failure for domain `D`.
///
/// Client errors surface the payload's message or the domain default.
/// Everything else, including unexpected non-error statuses, is transient and
/// shown only as the domain's fixed fallback.
pub fn classify<D: Domain>(error: TransportError) -> LoadError {
    if error.is_client_error() {
        let message = error
            .payload_message()
            .unwrap_or_else(|| D::NOT_FOUND_MESSAGE.to_string());
        LoadError::NotFound {
            message,
            details: error,
        }
    } else {
        LoadError::Transient {
            message: D::LOAD_FAILED_MESSAGE.to_string(),
            details: error,
        }
    }
}

/// The entry to store after `failure`, given the entry as it was before the
/// load started.
pub fn recover<T>(prior: CacheEntry<T>, failure: &LoadError) -> CacheEntry<T> {
    match failure.kind() {
        FailureKind::Transient if prior.status.is_success() => prior,
        _ => CacheEntry::failed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::LoadStatus;
    use serde_json::json;

    struct Groups;

    impl Domain for Groups {
        type Raw = Vec<i64>;
        type Item = i64;

        const NAME: &'static str = "groups";
        const KEY_LABEL: &'static str = "group";
        const NOT_FOUND_MESSAGE: &'static str = "Group not found";
        const LOAD_FAILED_MESSAGE: &'static str = "Failed to load group";

        fn transform(raw: Vec<i64>) -> Vec<i64> {
            raw
        }

        fn item_id(item: &i64) -> i64 {
            *item
        }
    }

    fn loaded() -> CacheEntry<i64> {
        CacheEntry {
            items: vec![1, 2],
            status: LoadStatus::Success,
            last_loaded_at: None,
            has_more: true,
        }
    }

    #[test]
    fn test_validate_key_rejects_non_positive() {
        for bad in [0_i64, -1] {
            let error = validate_key::<Groups>(bad).unwrap_err();
            assert_eq!(error.kind(), FailureKind::Validation);
            assert!(error.to_string().starts_with("Invalid group ID"));
        }
        assert_eq!(validate_key::<Groups>(7).unwrap().get(), 7);
    }

    #[test]
    fn test_client_error_uses_payload_message() {
        let error = classify::<Groups>(TransportError::http(
            404,
            Some(json!({"error": "  Group not found  "})),
            "Not Found",
        ));
        assert_eq!(error.kind(), FailureKind::NotFound);
        assert_eq!(error.to_string(), "Group not found");
    }

    #[test]
    fn test_client_error_without_payload_uses_default() {
        let error = classify::<Groups>(TransportError::http(403, None, "Forbidden"));
        assert_eq!(error.to_string(), Groups::NOT_FOUND_MESSAGE);
    }

    #[test]
    fn test_server_error_message_is_redacted() {
        let error = classify::<Groups>(TransportError::http(
            500,
            Some(json!({"error": "relation \"groups\" does not exist"})),
            "Internal Server Error",
        ));
        assert_eq!(error.kind(), FailureKind::Transient);
        assert_eq!(error.to_string(), Groups::LOAD_FAILED_MESSAGE);
        assert_eq!(error.details().and_then(|details| details.status), Some(500));
    }

    #[test]
    fn test_network_error_is_transient() {
        let error = classify::<Groups>(TransportError::network("connection refused"));
        assert_eq!(error.kind(), FailureKind::Transient);
    }

    #[test]
    fn test_transient_failure_rolls_back_success() {
        let failure = classify::<Groups>(TransportError::http(502, None, "Bad Gateway"));
        assert_eq!(recover(loaded(), &failure), loaded());
    }

    #[test]
    fn test_transient_failure_without_success_marks_error() {
        let failure = classify::<Groups>(TransportError::network("timeout"));
        let recovered = recover(CacheEntry::<i64>::default(), &failure);
        assert!(recovered.status.is_error());
        assert!(recovered.items.is_empty());
    }

    #[test]
    fn test_not_found_discards_data() {
        let failure = classify::<Groups>(TransportError::http(404, None, "Not Found"));
        let recovered = recover(loaded(), &failure);
        assert!(recovered.status.is_error());
        assert!(recovered.items.is_empty());
        assert!(!recovered.has_more);
    }
}
