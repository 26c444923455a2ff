//! Experiment configuration.
//!
//! Configs are JSON documents. Every field is optional; an empty object
//! yields the six-node dyadic experiment.
//!
//! ```json
//! {
//!   "name": "pilot",
//!   "max_rounds": 1,
//!   "topology": {
//!     "positions": [1, 2],
//!     "connections": [{ "source": 1, "target": 2, "round": 1 }]
//!   }
//! }
//! ```

use crate::engine::RoundEngine;
use crate::error::ConfigError;
use crate::topology::{Topology, TopologyDescriptor};
use roundnet_env::ExperimentContext;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Experiment's logical name (for logging)
    pub name: String,

    /// Round limit; may only lower the topology's declared rounds
    pub max_rounds: Option<u32>,

    /// Inline topology (default: six-node dyadic)
    pub topology: Option<TopologyDescriptor>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "dyadic-convo".to_string(),
            max_rounds: None,
            topology: None,
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validates the topology and the round limit against it.
    pub fn resolve(&self) -> Result<(Arc<Topology>, u32), ConfigError> {
        let topology = match &self.topology {
            Some(descriptor) => Topology::from_descriptor(descriptor.clone())?,
            None => Topology::six_node_dyadic(),
        };
        let declared = topology.max_round();
        let max_rounds = match self.max_rounds {
            Some(0) => return Err(ConfigError::NoRounds),
            Some(requested) if requested > declared => {
                return Err(ConfigError::TooManyRounds {
                    requested,
                    declared,
                })
            }
            Some(requested) => requested,
            None => declared,
        };
        if max_rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        Ok((Arc::new(topology), max_rounds))
    }

    /// Builds an engine for this configuration.
    pub fn build_engine<C: ExperimentContext>(
        &self,
        context: Arc<C>,
    ) -> Result<RoundEngine<C>, ConfigError> {
        let (topology, max_rounds) = self.resolve()?;
        Ok(RoundEngine::with_max_rounds(context, topology, max_rounds))
    }
}
