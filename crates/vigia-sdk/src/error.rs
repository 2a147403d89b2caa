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

use thiserror::Error;
use vigia_control::GovernorError;

/// Errors surfaced by the service and its handles.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The governor reported an error.
    #[error(transparent)]
    Governor(#[from] GovernorError),
    /// A previous caller panicked while holding the governor.
    #[error("governor lock poisoned")]
    Poisoned,
    /// The event queue is full; the event was dropped.
    #[error("event queue full")]
    QueueFull,
    /// The service is gone.
    #[error("event queue disconnected")]
    Disconnected,
}

/// Result alias for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;
