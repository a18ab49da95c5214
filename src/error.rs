// Copyright 2024 Saptak Santra
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

//! Error types
//!
//! Expected runtime failures (stale handles, missing components) surface as
//! `bool` / `Option` returns at the call site. Programmer errors and
//! allocation failure are fatal and panic. The variants below cover the
//! conditions reported through `Result`.

use std::fmt;

/// ECS error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A 257th distinct component type was registered
    TooManyComponentTypes,

    /// A resource of this type is already stored
    ResourceAlreadyExists(&'static str),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::TooManyComponentTypes => {
                write!(f, "component type limit exceeded (max 256 per world)")
            }
            EcsError::ResourceAlreadyExists(name) => {
                write!(f, "resource already exists: {name}")
            }
        }
    }
}

impl std::error::Error for EcsError {}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;
