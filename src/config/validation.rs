//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing services)
//! - Check algorithm names and route patterns
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Backend URLs are checked when services are built

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::load_balancer::algorithm_names;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service #{0} has an empty name")]
    EmptyServiceName(usize),

    #[error("service {0:?} is defined more than once")]
    DuplicateService(String),

    #[error("service {service:?} uses unknown algorithm {algorithm:?}")]
    UnknownAlgorithm { service: String, algorithm: String },

    #[error("route pattern {0:?} must be a '/'-delimited path")]
    InvalidPattern(String),

    #[error("route {pattern:?} references unknown service {service:?}")]
    UnknownService { pattern: String, service: String },
}

/// Check the configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    for (i, service) in config.services.iter().enumerate() {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceName(i));
        } else if !names.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }

        if !algorithm_names().any(|name| name == service.algorithm) {
            errors.push(ValidationError::UnknownAlgorithm {
                service: service.name.clone(),
                algorithm: service.algorithm.clone(),
            });
        }
    }

    for route in &config.routes {
        if !route.path.contains('/') && !route.path.trim().is_empty() {
            errors.push(ValidationError::InvalidPattern(route.path.clone()));
        }
        if !names.contains(route.service.as_str()) {
            errors.push(ValidationError::UnknownService {
                pattern: route.path.clone(),
                service: route.service.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
