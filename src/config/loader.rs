//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::env::{
    parse_flag, BIND_ADDRESS_ENV, ENV_ENV, LOGS_INJECTION_ENV, LOG_LEVEL_ENV, SERVICE_ENV,
    TRACE_ENABLED_ENV, VERSION_ENV,
};
use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Environment overrides are applied before validation, so a file may leave
/// out anything the deployment environment provides.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ServiceConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build configuration from defaults plus the process environment.
pub fn from_env() -> Result<ServiceConfig, ConfigError> {
    let mut config = ServiceConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment-style settings onto `config`.
///
/// `lookup` resolves a variable name to its value. Blank values are ignored,
/// as are flags that are neither truthy nor falsy.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(level) = get(LOG_LEVEL_ENV) {
        config.logging.level = level.trim().to_string();
    }

    // One name serves both the logger and the tracer.
    if let Some(service) = get(SERVICE_ENV) {
        config.logging.logger_name = service.clone();
        config.tracing.service = service;
    }

    if let Some(env) = get(ENV_ENV) {
        config.tracing.env = Some(env);
    }

    if let Some(version) = get(VERSION_ENV) {
        config.tracing.version = version;
    }

    if let Some(enabled) = get(TRACE_ENABLED_ENV).as_deref().and_then(parse_flag) {
        config.tracing.enabled = enabled;
    }

    if let Some(inject) = get(LOGS_INJECTION_ENV).as_deref().and_then(parse_flag) {
        config.logging.inject_trace_context = inject;
    }

    if let Some(addr) = get(BIND_ADDRESS_ENV) {
        config.listener.bind_address = addr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                ("LOG_LEVEL", "debug"),
                ("DD_SERVICE", "orders"),
                ("DD_ENV", "prod"),
                ("DD_VERSION", "2.3.1"),
                ("DD_TRACE_ENABLED", "false"),
                ("DD_LOGS_INJECTION", "0"),
                ("BIND_ADDRESS", "127.0.0.1:9000"),
            ]),
        );

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.logger_name, "orders");
        assert_eq!(config.tracing.service, "orders");
        assert_eq!(config.tracing.env.as_deref(), Some("prod"));
        assert_eq!(config.tracing.version, "2.3.1");
        assert!(!config.tracing.enabled);
        assert!(!config.logging.inject_trace_context);
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn test_blank_and_garbage_values_ignored() {
        let mut config = ServiceConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[("LOG_LEVEL", "  "), ("DD_TRACE_ENABLED", "sometimes")]),
        );

        assert_eq!(config.logging.level, "INFO");
        assert!(config.tracing.enabled);
    }

    #[test]
    fn test_load_config_reports_validation_errors() {
        let path = std::env::temp_dir().join(format!(
            "correlation-api-invalid-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[timeouts]\nrequest_secs = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        let _ = fs::remove_file(&path);

        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.contains(&ValidationError::Zero { field: "timeouts.request_secs" }));
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
