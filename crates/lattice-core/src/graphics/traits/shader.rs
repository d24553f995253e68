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

use crate::graphics::api::{ShaderDesc, ShaderType};

/// A compiled shader object.
pub trait Shader: Send + Sync + 'static {
    /// The shader description.
    fn desc(&self) -> &ShaderDesc<'static>;

    /// Shorthand for `desc().shader_type`.
    fn shader_type(&self) -> ShaderType {
        self.desc().shader_type
    }
}
