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

//! # Lattice Core
//!
//! Foundational crate containing the backend-agnostic GPU contracts: resource
//! descriptors, the shared pipeline state base, upload-engine types and the
//! traits every native backend implements.

#![warn(missing_docs)]

pub mod graphics;
pub mod utils;
