//! Loading engine configuration from TOML files and strings.

use super::validation::{validate, ConfigError};
use super::EngineConfig;
use std::path::Path;
use tracing::{debug, info};

/// Load and validate an [`EngineConfig`] from a TOML file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read,
/// [`ConfigError::Parse`] on malformed TOML, or [`ConfigError::Validation`]
/// when semantic constraints fail (all violations joined into one message).
pub fn load_from_file(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading engine config");

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        file: path.display().to_string(),
        source,
    })?;

    let config = load_from_str(&content, &path.display().to_string())?;
    info!(
        path = %path.display(),
        rules = config.orchestration_rules.len(),
        "engine config loaded"
    );
    Ok(config)
}

/// Parse and validate an [`EngineConfig`] from a TOML string.
///
/// `source_name` is only used in error messages.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] on malformed TOML, or
/// [`ConfigError::Validation`] when semantic constraints fail.
pub fn load_from_str(content: &str, source_name: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        file: source_name.to_string(),
        source,
    })?;

    validate(&config).map_err(|errors| {
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        ConfigError::Validation(joined)
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_load_from_str_empty_gives_defaults() {
        let config = load_from_str("", "inline").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_from_str_rejects_malformed_toml() {
        let err = load_from_str("[economic_auditor\nrate = ", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_str_reports_all_validation_errors() {
        let toml_str = r#"
[simulation]
timeout_ms = 0

[economic_auditor]
electricity_rate_kwh = -0.5
"#;
        let err = load_from_str(toml_str, "inline").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("timeout_ms"));
        assert!(message.contains("electricity_rate_kwh"));
    }

    #[test]
    fn test_load_from_file_missing_is_io_error() {
        let err = load_from_file("/nonexistent/engine.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[economic_auditor]
currency_symbol = "EUR"
"#
        )
        .unwrap();
        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.economic_auditor.currency_symbol, "EUR");
    }
}
