// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Bare-metal node targeted by a driver call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub uuid: Uuid,
    pub driver: String,
    #[serde(default)]
    pub instance_info: Map<String, Value>,
}

impl Node {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            driver: driver.into(),
            instance_info: Map::new(),
        }
    }
}

/// Per-request context handed through to vendor handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    pub request_id: Uuid,
    /// Shared tasks may read node state but must not change it
    pub shared: bool,
}

impl TaskContext {
    pub fn exclusive() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            shared: false,
        }
    }

    pub fn shared() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            shared: true,
        }
    }
}
