// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for the control layer.

use std::time::Duration;
use thiserror::Error;
use vigia_core::StoreError;
use vigia_telemetry::MetricsError;

/// Why a remediation action did not succeed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    /// The action ran and reported a failure.
    #[error("action failed: {0}")]
    Failed(String),
    /// The action ran longer than its budget.
    #[error("action took {elapsed:?}, over its {budget:?} budget")]
    TimedOut {
        /// Measured duration.
        elapsed: Duration,
        /// Allowed duration.
        budget: Duration,
    },
    /// A host capability the action needs is missing.
    #[error("capability unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for ActionError {
    fn from(e: StoreError) -> Self {
        ActionError::Unavailable(e.to_string())
    }
}

/// Errors surfaced by the governor's public operations.
#[derive(Debug, Error)]
pub enum GovernorError {
    /// No rule with this id.
    #[error("unknown optimization rule '{0}'")]
    UnknownRule(String),
    /// No health check with this id.
    #[error("unknown health check '{0}'")]
    UnknownCheck(String),
    /// The governor was stopped.
    #[error("governor is stopped")]
    Stopped,
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Configuration could not be parsed.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    /// Configuration file could not be read.
    #[error("configuration file error: {0}")]
    Io(#[from] std::io::Error),
    /// The host key/value store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Self-metrics bookkeeping failed.
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Result alias for governor operations.
pub type GovernorResult<T> = Result<T, GovernorError>;
