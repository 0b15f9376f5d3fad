// SPDX-License-Identifier: GPL-3.0-only

//! `partition_disk` vendor method
//!
//! Lets a deploy driver route partitioning through the vendor passthrough
//! dispatcher. Parameters:
//!
//! - `layout`: object in the same shape as a layout file
//! - `dry_run` (optional): return the parted plan instead of running it

use deploy_contracts::{DispatchError, Node, TaskContext, VendorInterface, VendorParams};
use deploy_sys::CommandExecutor;
use serde_json::{Value, json};

use crate::layout::Layout;
use crate::{Config, PartitionCommitter, PartitionTable, Sleeper};

pub const PARTITION_METHOD: &str = "partition_disk";

pub struct PartitionVendor<E, S> {
    committer: PartitionCommitter<E, S>,
    config: Config,
}

impl<E, S> PartitionVendor<E, S>
where
    E: CommandExecutor,
    S: Sleeper,
{
    pub fn new(committer: PartitionCommitter<E, S>, config: Config) -> Self {
        Self { committer, config }
    }

    fn table_from(&self, params: &VendorParams) -> Result<PartitionTable, DispatchError> {
        let raw = params.get("layout").cloned().ok_or_else(|| {
            DispatchError::invalid_value(PARTITION_METHOD, "missing 'layout' parameter")
        })?;
        let layout: Layout = serde_json::from_value(raw)
            .map_err(|error| DispatchError::invalid_value(PARTITION_METHOD, error.to_string()))?;

        layout
            .to_table(&self.config)
            .map_err(|error| DispatchError::invalid_value(PARTITION_METHOD, error.to_string()))
    }
}

impl<E, S> VendorInterface for PartitionVendor<E, S>
where
    E: CommandExecutor + Send + Sync,
    S: Sleeper + Send + Sync,
{
    fn validate(&self, params: &VendorParams) -> Result<(), DispatchError> {
        self.table_from(params).map(|_| ())
    }

    fn invoke(
        &self,
        task: &TaskContext,
        node: &Node,
        params: &VendorParams,
    ) -> Result<Value, DispatchError> {
        let table = self.table_from(params)?;

        if params.get("dry_run").and_then(Value::as_bool).unwrap_or(false) {
            let plan = self.committer.plan(&table);
            return serde_json::to_value(plan)
                .map_err(|error| DispatchError::handler(PARTITION_METHOD, error.to_string()));
        }

        if task.shared {
            return Err(DispatchError::handler(
                PARTITION_METHOD,
                "partitioning requires an exclusive task",
            ));
        }

        let device = table.device().to_string();
        let partitions = table.len();
        tracing::info!(node = %node.uuid, device = %device, "Partitioning node disk");

        self.committer
            .commit(table)
            .map_err(|error| DispatchError::handler(PARTITION_METHOD, error.to_string()))?;

        Ok(json!({ "device": device, "partitions": partitions }))
    }
}
