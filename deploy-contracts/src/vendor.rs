// SPDX-License-Identifier: GPL-3.0-only

//! Vendor passthrough routing
//!
//! A driver may combine several vendor interfaces into one. `VendorDispatch`
//! holds a fixed `method → handler` table and forwards `validate` and
//! `invoke` to whichever handler owns the requested method.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{DispatchError, Node, TaskContext};

/// Parameter key that selects the vendor method
pub const METHOD_KEY: &str = "method";

pub type VendorParams = Map<String, Value>;

pub trait VendorInterface: Send + Sync {
    fn validate(&self, params: &VendorParams) -> Result<(), DispatchError>;

    fn invoke(
        &self,
        task: &TaskContext,
        node: &Node,
        params: &VendorParams,
    ) -> Result<Value, DispatchError>;
}

#[derive(Default, Clone)]
pub struct VendorDispatch {
    routes: HashMap<String, Arc<dyn VendorInterface>>,
}

impl VendorDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(mapping: HashMap<String, Arc<dyn VendorInterface>>) -> Self {
        Self { routes: mapping }
    }

    pub fn register(
        mut self,
        method: impl Into<String>,
        handler: Arc<dyn VendorInterface>,
    ) -> Self {
        self.routes.insert(method.into(), handler);
        self
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<&str> {
        let sorted: BTreeMap<&str, ()> = self.routes.keys().map(|m| (m.as_str(), ())).collect();
        sorted.into_keys().collect()
    }

    fn route<'a>(
        &'a self,
        params: &'a VendorParams,
    ) -> Result<(&'a str, &'a Arc<dyn VendorInterface>), DispatchError> {
        let method = match params.get(METHOD_KEY) {
            Some(Value::String(method)) if !method.is_empty() => method.as_str(),
            _ => return Err(DispatchError::InvalidParameter),
        };

        match self.routes.get(method) {
            Some(handler) => Ok((method, handler)),
            None => {
                tracing::warn!(method, "Unsupported vendor method requested");
                Err(DispatchError::UnsupportedExtension {
                    method: method.to_string(),
                })
            }
        }
    }
}

impl VendorInterface for VendorDispatch {
    fn validate(&self, params: &VendorParams) -> Result<(), DispatchError> {
        let (method, handler) = self.route(params)?;
        tracing::debug!(method, "Validating vendor method");
        handler.validate(params)
    }

    fn invoke(
        &self,
        task: &TaskContext,
        node: &Node,
        params: &VendorParams,
    ) -> Result<Value, DispatchError> {
        let (method, handler) = self.route(params)?;
        tracing::debug!(method, node = %node.uuid, request = %task.request_id, "Invoking vendor method");
        handler.invoke(task, node, params)
    }
}

impl std::fmt::Debug for VendorDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorDispatch")
            .field("methods", &self.methods())
            .finish()
    }
}
