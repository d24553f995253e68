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

use crate::graphics::api::{PipelineId, ShaderCreateInfo};
use crate::graphics::api::BufferDesc;
use crate::graphics::error::ResourceError;
use crate::graphics::traits::{Buffer, Shader};
use std::sync::Arc;

/// The device-side services pipeline states depend on.
///
/// A backend's device type implements this trait so that the shared
/// [`PipelineStateBase`](crate::graphics::PipelineStateBase) can validate queue
/// affinity, synthesize helper shaders and report its own destruction without
/// knowing which native API is underneath.
pub trait RenderDevice: Send + Sync + 'static {
    /// The backend's shader type.
    type Shader: Shader;

    /// Number of command queues the device exposes.
    fn command_queue_count(&self) -> u32;

    /// One bit per available command queue.
    fn command_queue_mask(&self) -> u64;

    /// Creates a shader object.
    ///
    /// ## Arguments
    ///
    /// * `info` - Stage, name and source of the shader.
    ///
    /// ## Returns
    ///
    /// The shader, or an error if loading or compilation failed.
    fn create_shader(&self, info: &ShaderCreateInfo<'_>) -> Result<Arc<Self::Shader>, ResourceError>;

    /// Called when a pipeline state is being destroyed.
    ///
    /// Implementations must not block or take locks that lookups may hold;
    /// cached associations are expected to be purged later.
    fn on_pipeline_destroyed(&self, id: PipelineId);
}

/// Creates native buffers.
pub trait ResourceFactory: Send + Sync {
    /// Creates a buffer described by `desc`.
    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<Arc<dyn Buffer>, ResourceError>;
}
