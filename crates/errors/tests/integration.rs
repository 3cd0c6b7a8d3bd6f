//! Integration tests for error types

#[cfg(test)]
mod tests {
    use refcheck_errors::*;

    #[test]
    fn test_error_conversion() {
        let rejection = UploadRejection::UnknownFile {
            name: "unknown.pdf".into(),
        };
        let err: Error = rejection.into();
        assert!(matches!(err, Error::Upload(_)));
        assert_eq!(err.user_code(), Some("upload.unknown_file"));
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::DiskFull {
            path: "/srv/uploads".into(),
        };
        assert_eq!(err.to_string(), "disk full: /srv/uploads");
    }

    #[test]
    fn test_hash_mismatch_hides_digests_from_clients() {
        let err = UploadRejection::HashMismatch {
            name: "report.pdf".into(),
            expected: "aa".repeat(32),
            actual: "bb".repeat(32),
        };

        let logged = err.to_string();
        assert!(logged.contains(&"aa".repeat(32)));
        assert!(logged.contains(&"bb".repeat(32)));

        let shown = err.user_message();
        assert!(!shown.contains(&"aa".repeat(32)));
        assert!(shown.contains("report.pdf"));
        assert_eq!(err.reason(), "hash_mismatch");
    }

    #[test]
    fn test_too_large_names_where_the_size_came_from() {
        let declared = UploadRejection::TooLarge {
            limit: 16,
            size: 17,
            declared: true,
        };
        assert_eq!(
            declared.to_string(),
            "upload exceeds the 16 byte limit (17 bytes declared)"
        );

        let streamed = UploadRejection::TooLarge {
            limit: 16,
            size: 17,
            declared: false,
        };
        assert_eq!(
            streamed.to_string(),
            "upload exceeds the 16 byte limit (17 bytes seen)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::PermissionDenied { .. }));

        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "stalled");
        let err: Error = io_err.into();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::TimedOut));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_index_errors_are_not_retryable() {
        let err: Error = IndexError::RootUnreadable {
            path: "/missing".into(),
            message: "not found".into(),
        }
        .into();
        assert!(!err.is_retryable());
        assert_eq!(err.user_code(), Some("index.root_unreadable"));
        assert!(err.user_hint().is_some());
    }
}
