//! Claimed file name validation

use refcheck_errors::UploadRejection;

/// Longest accepted name, in bytes
pub const MAX_NAME_LEN: usize = 255;

/// Accept a claimed name only if it is already a bare file name
///
/// Nothing is stripped or rewritten: a name that would need cleaning is
/// rejected, so the value that passes is used unchanged for staging, lookup
/// and the final location.
///
/// # Errors
///
/// Returns [`UploadRejection::InvalidName`] for empty names, `.` and `..`,
/// names containing `/`, `\` or NUL, and names longer than [`MAX_NAME_LEN`].
pub fn sanitize_name(claimed: &str) -> Result<&str, UploadRejection> {
    let valid = !claimed.is_empty()
        && claimed.len() <= MAX_NAME_LEN
        && claimed != "."
        && claimed != ".."
        && !claimed.contains(['/', '\\', '\0']);

    if valid {
        Ok(claimed)
    } else {
        Err(UploadRejection::InvalidName {
            claimed: claimed.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_pass() {
        for name in ["report.pdf", "a", ".hidden", "with space.txt", "ünïcode.bin", "..."] {
            assert_eq!(sanitize_name(name), Ok(name));
        }
    }

    #[test]
    fn test_traversal_and_separators_rejected() {
        for name in [
            "",
            ".",
            "..",
            "../etc/passwd",
            "dir/file.txt",
            "/abs.txt",
            "..\\windows.ini",
            "nul\0byte",
        ] {
            assert!(
                matches!(sanitize_name(name), Err(UploadRejection::InvalidName { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_length_limit_is_in_bytes() {
        let at_limit = "a".repeat(MAX_NAME_LEN);
        assert!(sanitize_name(&at_limit).is_ok());

        let over = "a".repeat(MAX_NAME_LEN + 1);
        assert!(sanitize_name(&over).is_err());

        // 128 two-byte chars = 256 bytes
        let wide = "é".repeat(128);
        assert!(sanitize_name(&wide).is_err());
    }
}
