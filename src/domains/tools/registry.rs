//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tool contracts, keyed by unique name
//! - Name-based dispatch with argument validation
//! - Tool metadata for listing
//!
//! Both transports share one registry: STDIO through the rmcp router built in
//! `router.rs`, HTTP through [`ToolRegistry::dispatch`] directly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rmcp::model::Tool;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::contract::ToolContract;
use super::definitions;
use super::envelope::ResultEnvelope;
use super::error::ToolError;
use crate::core::backend::BackendApi;

/// Tool registry - owns every contract and the backend they call.
pub struct ToolRegistry {
    contracts: BTreeMap<String, ToolContract>,
    backend: Arc<dyn BackendApi>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.contracts.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ToolRegistry {
    /// Create an empty registry bound to `backend`.
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self {
            contracts: BTreeMap::new(),
            backend,
        }
    }

    /// Create a registry holding the full Symphony tool catalog.
    pub fn with_catalog(backend: Arc<dyn BackendApi>) -> Result<Self, ToolError> {
        let mut registry = Self::new(backend);
        definitions::register_all(&mut registry)?;
        info!("Registered {} tools", registry.len());
        Ok(registry)
    }

    /// Add a contract. Names must be unique within the registry.
    pub fn register(&mut self, contract: ToolContract) -> Result<(), ToolError> {
        if self.contracts.contains_key(contract.name()) {
            return Err(ToolError::duplicate(contract.name()));
        }
        debug!("Registering tool: {}", contract.name());
        self.contracts.insert(contract.name().to_string(), contract);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolContract> {
        self.contracts.get(name)
    }

    pub fn contracts(&self) -> impl Iterator<Item = &ToolContract> {
        self.contracts.values()
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&str> {
        self.contracts.keys().map(String::as_str).collect()
    }

    /// Get all tools as Tool models (metadata).
    pub fn tools(&self) -> Vec<Tool> {
        self.contracts.values().map(ToolContract::to_tool).collect()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Resolve `name`, validate `arguments` and run the tool.
    ///
    /// Unknown tools and invalid arguments fail before the backend is called.
    #[instrument(skip(self, arguments))]
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<ResultEnvelope, ToolError> {
        let Some(contract) = self.contracts.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return Err(ToolError::not_found(name));
        };

        let args = contract.schema().validate(arguments.as_ref()).map_err(|reason| {
            warn!("Rejected arguments for {}: {}", name, reason);
            ToolError::invalid_arguments(reason)
        })?;

        debug!("Dispatching tool: {}", name);
        let result = contract.invoke(self.backend.clone(), args).await;

        if let Err(e) = &result {
            warn!("Tool {} failed: {}", name, e);
        }
        result
    }
}
