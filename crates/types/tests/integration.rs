//! Integration tests for types

#[cfg(test)]
mod tests {
    use refcheck_types::*;

    #[test]
    fn test_error_policy_serialization() {
        let json = serde_json::to_string(&IndexErrorPolicy::Skip).unwrap();
        assert_eq!(json, r#""skip""#);

        let deserialized: IndexErrorPolicy = serde_json::from_str(r#""fail""#).unwrap();
        assert_eq!(deserialized, IndexErrorPolicy::Fail);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(IndexErrorPolicy::default(), IndexErrorPolicy::Fail);
        assert_eq!(OutputFormat::default(), OutputFormat::Tty);
    }

    #[test]
    fn test_error_policy_value_enum() {
        use clap::ValueEnum;
        let parsed = IndexErrorPolicy::from_str("skip", true).unwrap();
        assert_eq!(parsed, IndexErrorPolicy::Skip);
        assert_eq!(parsed.to_string(), "skip");
    }
}
