use snaplink::errors::SnaplinkError;

#[cfg(test)]
mod taxonomy_tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(SnaplinkError::not_found("x").code(), "E001");
        assert_eq!(SnaplinkError::expired("x").code(), "E002");
        assert_eq!(SnaplinkError::fast_store_unavailable("x").code(), "E003");
        assert_eq!(SnaplinkError::allocation("x").code(), "E004");
    }

    #[test]
    fn test_only_fast_store_failures_are_transient() {
        assert!(SnaplinkError::fast_store_unavailable("down").is_transient());

        assert!(!SnaplinkError::not_found("x").is_transient());
        assert!(!SnaplinkError::expired("x").is_transient());
        assert!(!SnaplinkError::allocation("x").is_transient());
        assert!(!SnaplinkError::database_operation("x").is_transient());
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = SnaplinkError::expired("short code 'abc' expired");
        let rendered = err.to_string();
        assert!(rendered.contains("E002"));
        assert!(rendered.contains("abc"));
    }

    #[test]
    fn test_redis_errors_map_to_transient() {
        let redis_err = redis::RedisError::from((redis::ErrorKind::Io, "connection refused"));
        let err = SnaplinkError::from(redis_err);
        assert!(err.is_transient());
    }

    #[test]
    fn test_parse_errors_map_to_serialization() {
        let parse_err = "not-a-number".parse::<u64>().unwrap_err();
        let err = SnaplinkError::from(parse_err);
        assert!(matches!(err, SnaplinkError::Serialization(_)));
    }
}
