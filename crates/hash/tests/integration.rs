//! Integration tests for hash crate

#[cfg(test)]
mod tests {
    use refcheck_hash::*;
    use tempfile::tempdir;
    use tokio::fs;

    #[tokio::test]
    async fn test_verify_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.txt");

        let data = b"verify this content";
        fs::write(&file_path, data).await.unwrap();

        let hash = Hash::from_data(data, HashAlgorithm::Sha256);
        assert!(verify_file(&file_path, &hash).await.unwrap());

        let wrong_hash = Hash::from_data(b"different content", HashAlgorithm::Sha256);
        assert!(!verify_file(&file_path, &wrong_hash).await.unwrap());

        let other_algorithm = Hash::from_data(data, HashAlgorithm::Blake3);
        assert!(verify_file(&file_path, &other_algorithm).await.unwrap());
    }

    #[test]
    fn test_hash_from_hex_errors() {
        // Too short
        assert!(Hash::from_hex("1234", HashAlgorithm::Sha256).is_err());
        // Too long
        assert!(Hash::from_hex(&"a".repeat(66), HashAlgorithm::Sha256).is_err());
        // Invalid hex
        assert!(Hash::from_hex("xyz123", HashAlgorithm::Sha256).is_err());
    }
}
