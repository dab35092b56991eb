//! Product lifecycle: the fixed graph of allowed status transitions.
//!
//! A graph is immutable once built. It has one initial status, every
//! successor names a declared status, and at least one status is terminal
//! (has no successors).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MANUFACTURED: &str = "Manufactured";
pub const SHIPPED: &str = "Shipped";
pub const IN_TRANSIT: &str = "In-Transit";
pub const DELIVERED: &str = "Delivered";

/// Reasons a transition graph is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("transition graph declares no statuses")]
    Empty,

    #[error("status names cannot be empty")]
    EmptyStatus,

    #[error("initial status {0:?} is not declared")]
    UnknownInitial(String),

    #[error("status {from:?} lists undeclared successor {to:?}")]
    UnknownSuccessor { from: String, to: String },

    #[error("status {0:?} lists itself as a successor")]
    SelfTransition(String),

    #[error("transition graph has no terminal status")]
    NoTerminal,
}

/// Serialized form of a transition graph, e.g. in lifecycle.toml:
///
/// ```toml
/// initial = "Manufactured"
///
/// [transitions]
/// Manufactured = ["Shipped"]
/// Shipped = ["In-Transit"]
/// In-Transit = ["Delivered"]
/// Delivered = []
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    pub initial: String,
    pub transitions: BTreeMap<String, Vec<String>>,
}

impl LifecycleConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: LifecycleConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Validated, immutable status transition graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionGraph {
    initial: String,
    edges: BTreeMap<String, Vec<String>>,
}

impl TransitionGraph {
    /// Build and validate a graph from its initial status and edges.
    pub fn new<I, S>(initial: impl Into<String>, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let edges: BTreeMap<String, Vec<String>> = edges
            .into_iter()
            .map(|(from, to)| (from.into(), to.into_iter().map(Into::into).collect()))
            .collect();
        let graph = Self {
            initial: initial.into(),
            edges,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// `Manufactured -> Shipped -> In-Transit -> Delivered`.
    pub fn supply_chain() -> Self {
        let edges = [
            (MANUFACTURED, vec![SHIPPED]),
            (SHIPPED, vec![IN_TRANSIT]),
            (IN_TRANSIT, vec![DELIVERED]),
            (DELIVERED, vec![]),
        ]
        .into_iter()
        .map(|(from, to)| {
            (
                from.to_string(),
                to.into_iter().map(str::to_string).collect(),
            )
        })
        .collect();
        Self {
            initial: MANUFACTURED.to_string(),
            edges,
        }
    }

    pub fn from_config(config: &LifecycleConfig) -> Result<Self, GraphError> {
        Self::new(config.initial.clone(), config.transitions.clone())
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config = LifecycleConfig::from_toml_str(content)?;
        Ok(Self::from_config(&config)?)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config = LifecycleConfig::from_file(path)?;
        Ok(Self::from_config(&config)?)
    }

    pub fn to_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            initial: self.initial.clone(),
            transitions: self.edges.clone(),
        }
    }

    fn validate(&self) -> Result<(), GraphError> {
        if self.edges.is_empty() {
            return Err(GraphError::Empty);
        }
        if self.edges.keys().any(String::is_empty) {
            return Err(GraphError::EmptyStatus);
        }
        if !self.edges.contains_key(&self.initial) {
            return Err(GraphError::UnknownInitial(self.initial.clone()));
        }
        for (from, successors) in &self.edges {
            for to in successors {
                if to == from {
                    return Err(GraphError::SelfTransition(from.clone()));
                }
                if !self.edges.contains_key(to) {
                    return Err(GraphError::UnknownSuccessor {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
            }
        }
        if !self.edges.values().any(Vec::is_empty) {
            return Err(GraphError::NoTerminal);
        }
        Ok(())
    }

    /// Status assigned to every newly registered product.
    pub fn initial(&self) -> &str {
        &self.initial
    }

    /// Whether `status` is a declared status.
    pub fn contains(&self, status: &str) -> bool {
        self.edges.contains_key(status)
    }

    /// Declared statuses in name order.
    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    /// Allowed next statuses, or `None` for an undeclared status.
    pub fn successors(&self, status: &str) -> Option<&[String]> {
        self.edges.get(status).map(Vec::as_slice)
    }

    /// Whether moving from `from` to `to` is an edge of the graph.
    pub fn allows(&self, from: &str, to: &str) -> bool {
        self.successors(from)
            .is_some_and(|next| next.iter().any(|s| s == to))
    }

    pub fn is_terminal(&self, status: &str) -> bool {
        self.successors(status).is_some_and(<[String]>::is_empty)
    }

    pub fn terminals(&self) -> impl Iterator<Item = &str> {
        self.edges
            .iter()
            .filter(|(_, next)| next.is_empty())
            .map(|(status, _)| status.as_str())
    }
}

impl Default for TransitionGraph {
    fn default() -> Self {
        Self::supply_chain()
    }
}
