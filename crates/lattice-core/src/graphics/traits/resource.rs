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

use crate::graphics::api::{BufferDesc, MappedMemory, TextureDesc};
use std::any::Any;
use std::fmt::Debug;

/// A GPU buffer.
pub trait Buffer: Debug + Send + Sync + 'static {
    /// The buffer description.
    fn desc(&self) -> &BufferDesc<'static>;

    /// Host memory backing the buffer, for backends that stage on the CPU.
    fn host_memory(&self) -> Option<&MappedMemory> {
        None
    }

    /// Allows backends to recover their concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// A GPU texture.
pub trait Texture: Debug + Send + Sync + 'static {
    /// The texture description.
    fn desc(&self) -> &TextureDesc<'static>;

    /// Allows backends to recover their concrete type.
    fn as_any(&self) -> &dyn Any;
}
