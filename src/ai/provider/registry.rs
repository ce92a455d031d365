//! Model Registry
//!
//! Ordered, label-keyed collection of backends. Lookups fail fast with a
//! configuration error so an unknown label never reaches the network.

use std::sync::Arc;

use super::{OpenAiBackend, SharedBackend, SharedCredentials};
use crate::ai::model::LanguageModel;
use crate::config::Config;
use crate::types::{RecastError, Result};

#[derive(Clone)]
pub struct ModelRegistry {
    backends: Vec<SharedBackend>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("labels", &self.labels())
            .finish()
    }
}

impl ModelRegistry {
    /// Build from caller-supplied backends, rejecting duplicate labels
    pub fn new(backends: Vec<SharedBackend>) -> Result<Self> {
        for (i, backend) in backends.iter().enumerate() {
            let label = &backend.model().label;
            if backends[..i].iter().any(|b| &b.model().label == label) {
                return Err(RecastError::config(format!(
                    "Duplicate language model label: {}",
                    label
                )));
            }
        }
        Ok(Self { backends })
    }

    /// One OpenAI-compatible backend per configured model
    pub fn from_config(config: &Config, credentials: SharedCredentials) -> Result<Self> {
        let api_base = config.api.base_url()?;
        let backends = config
            .models
            .iter()
            .map(|model| {
                OpenAiBackend::new(model.clone(), &api_base, Arc::clone(&credentials))
                    .map(|backend| Arc::new(backend) as SharedBackend)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(backends)
    }

    pub fn get(&self, label: &str) -> Result<&SharedBackend> {
        self.backends
            .iter()
            .find(|backend| backend.model().label == label)
            .ok_or_else(|| {
                RecastError::config(format!(
                    "Unknown language model: {}, available: [{}]",
                    label,
                    self.labels().join(", ")
                ))
            })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.backends
            .iter()
            .map(|backend| backend.model().label.as_str())
            .collect()
    }

    pub fn models(&self) -> impl Iterator<Item = &LanguageModel> {
        self.backends.iter().map(|backend| backend.model())
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
