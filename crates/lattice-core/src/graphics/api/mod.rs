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

//! Backend-agnostic GPU data model.
//!
//! Plain descriptor types that form the configuration surface of the
//! abstraction layer. Everything here is data: validation and normalization
//! happen when a descriptor is turned into an object.

pub mod enums;
pub mod flags;
pub mod format;
pub mod input_layout;
pub mod pipeline;
pub mod resource;
pub mod sampler;
pub mod shader;

pub use self::enums::*;
pub use self::flags::*;
pub use self::format::*;
pub use self::input_layout::*;
pub use self::pipeline::*;
pub use self::resource::*;
pub use self::sampler::*;
pub use self::shader::*;
