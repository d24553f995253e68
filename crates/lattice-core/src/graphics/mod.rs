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

//! Provides the public, backend-agnostic GPU contracts.
//!
//! This module defines the "common language" shared by every native backend:
//! plain descriptor types in [`api`], the object traits in [`traits`], error
//! types, and the logic that all backends share, most notably
//! [`PipelineStateBase`], which validates and normalizes a pipeline
//! description once before a backend builds its native objects from it.
//!
//! Concrete backends live in the `lattice-infra` crate.

pub mod api;
pub mod error;
pub mod pipeline_base;
pub mod registry;
pub mod resource_mapping;
pub mod shader_source;
pub mod traits;
pub mod upload;

pub use self::api::*;
pub use self::error::{ConfigError, PipelineError, ResourceError, ShaderError, UploadError};
pub use self::pipeline_base::{DeviceRef, PipelineStateBase};
pub use self::registry::StateObjectsRegistry;
pub use self::resource_mapping::{BoundResource, ResourceMapping};
pub use self::traits::*;
