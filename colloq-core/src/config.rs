//! Retrieval tuning parameters.

use serde::{Deserialize, Serialize};

use crate::error::{ColloqError, Result};

/// Parameters for similarity-ranked context retrieval.
///
/// The defaults are the pipeline's fixed operating point: below a similarity
/// of 0.70, retrieved transcript fragments are empirically unrelated to the
/// question and degrade answer quality; the limit of 3 bounds context size
/// and model cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Minimum similarity score; matches at or below it are excluded.
    pub similarity_threshold: f32,
    /// Maximum number of matches to retrieve.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { similarity_threshold: 0.70, top_k: 3 }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the minimum similarity score for retrieved matches.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the maximum number of matches to retrieve.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are
    /// consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ColloqError::Config`] if:
    /// - `similarity_threshold` lies outside [-1, 1]
    /// - `top_k == 0`
    pub fn build(self) -> Result<RetrievalConfig> {
        if !(-1.0..=1.0).contains(&self.config.similarity_threshold) {
            return Err(ColloqError::Config(format!(
                "similarity_threshold ({}) must lie in [-1, 1]",
                self.config.similarity_threshold
            )));
        }
        if self.config.top_k == 0 {
            return Err(ColloqError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}
