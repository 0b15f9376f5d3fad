// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Unsupported,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::Unsupported => 501,
            Self::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum DispatchError {
    #[error("method not specified when calling vendor extension")]
    InvalidParameter,

    #[error("unsupported method ({method}) passed through to vendor extension")]
    UnsupportedExtension { method: String },

    #[error("invalid parameters for vendor method {method}: {message}")]
    InvalidValue { method: String, message: String },

    #[error("vendor method {method} failed: {message}")]
    Handler { method: String, message: String },
}

impl DispatchError {
    pub fn handler(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn invalid_value(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter | Self::InvalidValue { .. } => ErrorKind::InvalidInput,
            Self::UnsupportedExtension { .. } => ErrorKind::Unsupported,
            Self::Handler { .. } => ErrorKind::Internal,
        }
    }
}
