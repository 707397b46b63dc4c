//! Tests for config module

#[cfg(test)]
mod tests {
    use crate::comparator::LiteralComparator;
    use crate::config::*;
    use serial_test::serial;
    use std::io::Write;

    // ========================================================================
    // Defaults
    // ========================================================================

    #[test]
    fn test_config_default_values() {
        // Arrange & Act
        let config = TabulaConfig::default();

        // Assert
        assert_eq!(config.filter.optimize_threshold, 300);
        assert_eq!(config.index.default_comparator, LiteralComparator::Natural);
        assert!(config.index.auto_index_columns.is_empty());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
    }

    // ========================================================================
    // TOML parsing
    // ========================================================================

    #[test]
    fn test_config_from_toml_minimal() {
        // Arrange
        let toml_str = r"
[filter]
optimize_threshold = 50
";

        // Act
        let config = TabulaConfig::from_toml(toml_str).expect("parse");

        // Assert
        assert_eq!(config.filter.optimize_threshold, 50);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_from_toml_full() {
        // Arrange
        let toml_str = r#"
[filter]
optimize_threshold = 1000

[index]
default_comparator = "case_insensitive"
auto_index_columns = ["name", "age"]

[logging]
level = "debug"
format = "compact"
"#;

        // Act
        let config = TabulaConfig::from_toml(toml_str).expect("parse");

        // Assert
        assert_eq!(config.filter.optimize_threshold, 1000);
        assert_eq!(
            config.index.default_comparator,
            LiteralComparator::CaseInsensitive
        );
        assert_eq!(config.index.auto_index_columns, vec!["name", "age"]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "compact");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml_invalid_comparator() {
        // Arrange
        let toml_str = r#"
[index]
default_comparator = "reverse"
"#;

        // Act
        let result = TabulaConfig::from_toml(toml_str);

        // Assert
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn test_config_validate_invalid_log_level() {
        let mut config = TabulaConfig::default();
        config.logging.level = "verbose".to_string();

        let result = config.validate();

        assert!(
            matches!(result, Err(ConfigError::InvalidValue { ref key, .. }) if key == "logging.level")
        );
    }

    #[test]
    fn test_config_validate_accepts_filter_directive() {
        let mut config = TabulaConfig::default();
        config.logging.level = "tabula_core=trace".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate_invalid_format() {
        let mut config = TabulaConfig::default();
        config.logging.format = "xml".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_blank_auto_index_column() {
        let mut config = TabulaConfig::default();
        config.index.auto_index_columns = vec!["name".into(), "  ".into()];

        let err = config.validate().expect_err("blank column must be rejected");

        assert!(err.to_string().contains("index.auto_index_columns"));
    }

    // ========================================================================
    // Serialization and file loading
    // ========================================================================

    #[test]
    fn test_config_roundtrip() {
        // Arrange
        let mut config = TabulaConfig::default();
        config.filter.optimize_threshold = 42;
        config.index.auto_index_columns = vec!["id".into()];

        // Act
        let toml_str = config.to_toml().expect("serialize");
        let parsed = TabulaConfig::from_toml(&toml_str).expect("parse");

        // Assert
        assert_eq!(parsed.filter.optimize_threshold, 42);
        assert_eq!(parsed.index.auto_index_columns, vec!["id"]);
    }

    #[test]
    #[serial]
    fn test_config_load_from_path_reads_file() {
        // Arrange
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[filter]\noptimize_threshold = 7").expect("write");

        // Act
        let config = TabulaConfig::load_from_path(file.path()).expect("load");

        // Assert
        assert_eq!(config.filter.optimize_threshold, 7);
    }

    #[test]
    #[serial]
    fn test_config_load_from_missing_path_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");

        let config = TabulaConfig::load_from_path(dir.path().join("absent.toml")).expect("load");

        assert_eq!(config.filter.optimize_threshold, DEFAULT_OPTIMIZE_THRESHOLD);
    }

    #[test]
    #[serial]
    fn test_config_env_overrides_file() {
        // Arrange
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[filter]\noptimize_threshold = 7").expect("write");
        std::env::set_var("TABULA_FILTER__OPTIMIZE_THRESHOLD", "900");

        // Act
        let config = TabulaConfig::load_from_path(file.path());
        std::env::remove_var("TABULA_FILTER__OPTIMIZE_THRESHOLD");

        // Assert
        assert_eq!(config.expect("load").filter.optimize_threshold, 900);
    }
}
