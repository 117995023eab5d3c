//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject log levels the logging bootstrap cannot interpret
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;
use crate::observability::logging::{filter_directive, parse_level};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),

    #[error("unknown level '{level}' for log filter '{target}'")]
    UnknownFilterLevel { target: String, level: String },

    #[error("invalid log filter target '{target}': {reason}")]
    InvalidFilterTarget { target: String, reason: String },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if parse_level(&config.logging.level).is_none() {
        errors.push(ValidationError::UnknownLogLevel(config.logging.level.clone()));
    }

    for (target, level) in &config.logging.filters {
        let Some(level_filter) = parse_level(level) else {
            errors.push(ValidationError::UnknownFilterLevel {
                target: target.clone(),
                level: level.clone(),
            });
            continue;
        };

        if target.trim().is_empty() {
            errors.push(ValidationError::Empty { field: "logging.filters target" });
        } else if let Err(err) = filter_directive(target, level_filter) {
            errors.push(ValidationError::InvalidFilterTarget {
                target: target.clone(),
                reason: err.to_string(),
            });
        }
    }

    if config.logging.logger_name.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "logging.logger_name" });
    }

    if config.tracing.service.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "tracing.service" });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServiceConfig::default();
        config.logging.level = "loud".into();
        config.logging.logger_name = "  ".into();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config
            .logging
            .filters
            .insert("tower_http".into(), "chatty".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::UnknownLogLevel("loud".into())));
        assert!(errors.contains(&ValidationError::Empty { field: "logging.logger_name" }));
        assert!(errors.contains(&ValidationError::Zero { field: "timeouts.request_secs" }));
    }

    #[test]
    fn test_filter_targets_are_checked() {
        let mut config = ServiceConfig::default();
        config.logging.filters.insert("a b".into(), "warn".into());
        config.logging.filters.insert("".into(), "warn".into());
        config.logging.filters.insert("tower_http::trace".into(), "debug".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::Empty { field: "logging.filters target" }));
        assert!(errors.iter().any(|err| matches!(
            err,
            ValidationError::InvalidFilterTarget { target, .. } if target == "a b"
        )));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidAddress {
                field: "observability.metrics_address",
                value: "nowhere".into(),
            }]
        );
    }
}
