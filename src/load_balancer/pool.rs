//! Service and service registry.
//!
//! # Responsibilities
//! - Build each service's backends and balancer from configuration
//! - Hold services by name for the router
//! - Fail the whole build on the first invalid service

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ServiceConfig;
use crate::load_balancer::{
    backend::{Backend, BackendConnectionGuard, BackendError},
    new_balancer, Balancer, BalancerError,
};

/// Error building a service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service {service:?}: {source}")]
    Backend {
        service: String,
        #[source]
        source: BackendError,
    },

    #[error("service {service:?}: {source}")]
    Balancer {
        service: String,
        #[source]
        source: BalancerError,
    },
}

/// A named logical target: one balancer over a fixed backend set.
#[derive(Debug)]
pub struct Service {
    name: String,
    balancer: Box<dyn Balancer>,
}

impl Service {
    /// Build a service from its configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let backends = config
            .backends
            .iter()
            .map(|entry| Backend::parse(entry.url(), entry.weight()).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ServiceError::Backend {
                service: config.name.clone(),
                source,
            })?;

        if backends.is_empty() {
            tracing::warn!(service = %config.name, "Service has no backends; requests will get 503");
        }

        let balancer =
            new_balancer(&config.algorithm, backends).map_err(|source| ServiceError::Balancer {
                service: config.name.clone(),
                source,
            })?;

        Ok(Self {
            name: config.name.clone(),
            balancer,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balancer(&self) -> &dyn Balancer {
        self.balancer.as_ref()
    }

    /// Select a backend for one request.
    pub fn next_backend(&self) -> Option<BackendConnectionGuard> {
        self.balancer.next()
    }
}

/// Services keyed by name. Built once at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<Service>>,
}

impl ServiceRegistry {
    /// Build every configured service.
    pub fn from_configs(configs: &[ServiceConfig]) -> Result<Self, ServiceError> {
        let mut services = HashMap::with_capacity(configs.len());
        for config in configs {
            let service = Service::from_config(config)?;
            tracing::info!(
                service = %service.name(),
                algorithm = service.balancer().algorithm(),
                backends = service.balancer().backends().len(),
                "Service ready"
            );
            services.insert(config.name.clone(), Arc::new(service));
        }
        Ok(Self { services })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Service>> {
        self.services.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
