// SPDX-License-Identifier: GPL-3.0-only

pub mod context;
pub mod error;
pub mod vendor;

pub use context::{Node, TaskContext};
pub use error::{DispatchError, ErrorKind};
pub use vendor::{METHOD_KEY, VendorDispatch, VendorInterface, VendorParams};
