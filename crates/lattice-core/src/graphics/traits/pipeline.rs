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

use crate::graphics::api::{
    BindShaderResourcesFlags, PipelineId, ResourceVariableType, ShaderStages, ShaderType,
};
use crate::graphics::error::ResourceError;
use crate::graphics::resource_mapping::{BoundResource, ResourceMapping};
use std::any::Any;
use std::sync::Arc;

/// A named shader resource slot that resources can be bound to.
pub trait ShaderResourceVariable: Send + Sync {
    /// Variable name as reflected from the shader.
    fn name(&self) -> &str;

    /// Classification taken from the pipeline's resource layout.
    fn variable_type(&self) -> ResourceVariableType;

    /// Stages the variable is visible in.
    fn shader_stages(&self) -> ShaderStages;

    /// Number of array elements, `1` for non-arrays.
    fn array_size(&self) -> u32;

    /// Position of the variable in its owner's variable list.
    fn index(&self) -> u32;

    /// Binds `resource` to element 0.
    fn set(&self, resource: BoundResource) -> Result<(), ResourceError>;

    /// Binds consecutive array elements starting at `first_element`.
    fn set_array(&self, resources: &[BoundResource], first_element: u32)
        -> Result<(), ResourceError>;

    /// Returns `true` if a resource is bound to `array_index`.
    fn is_bound(&self, array_index: u32) -> bool;
}

/// A pipeline state object as seen by callers.
pub trait PipelineState: Send + Sync {
    /// Process-unique identifier.
    fn id(&self) -> PipelineId;

    /// The debug name.
    fn name(&self) -> &str;

    /// Returns `true` for compute pipelines.
    fn is_compute_pipeline(&self) -> bool;

    /// Stride of vertex buffer `slot`, or `0` if the slot is not used.
    fn buffer_stride(&self, slot: u32) -> u32;

    /// One past the highest vertex buffer slot the input layout uses.
    fn num_buffer_slots_used(&self) -> u32;

    /// Structural hash of the shader resource layout.
    fn resource_layout_hash(&self) -> u64;

    /// Binds static variables of the given stages from `mapping`.
    fn bind_static_resources(
        &self,
        stages: ShaderStages,
        mapping: &ResourceMapping,
        flags: BindShaderResourcesFlags,
    );

    /// Number of static variables visible in `stage`.
    fn static_variable_count(&self, stage: ShaderType) -> u32;

    /// Looks up a static variable of `stage` by name.
    fn static_variable_by_name(
        &self,
        stage: ShaderType,
        name: &str,
    ) -> Option<&dyn ShaderResourceVariable>;

    /// Looks up a static variable of `stage` by index.
    fn static_variable_by_index(
        &self,
        stage: ShaderType,
        index: u32,
    ) -> Option<&dyn ShaderResourceVariable>;

    /// Creates an object holding the mutable and dynamic variables of this
    /// pipeline.
    ///
    /// ## Arguments
    ///
    /// * `init_static_resources` - Copy the pipeline's static bindings into the
    ///   new object right away.
    fn create_shader_resource_binding(
        self: Arc<Self>,
        init_static_resources: bool,
    ) -> Result<Arc<dyn ShaderResourceBinding>, ResourceError>;

    /// Returns `true` if shader resource bindings created by `other` can be
    /// used with this pipeline.
    ///
    /// Compatibility is decided on the binding layout (names, stages, variable
    /// types and array sizes). It does not distinguish resource dimensions:
    /// a texture and a texture array bound under the same name compare equal,
    /// and a mismatch only surfaces when resources are bound.
    fn is_compatible_with(&self, other: &dyn PipelineState) -> bool;

    /// Allows backends to recover their concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// Holds the per-draw variables of a pipeline.
pub trait ShaderResourceBinding: Send + Sync {
    /// The pipeline this binding was created from.
    fn pipeline_state(&self) -> Arc<dyn PipelineState>;

    /// Binds mutable and dynamic variables of the given stages from `mapping`.
    fn bind_resources(
        &self,
        stages: ShaderStages,
        mapping: &ResourceMapping,
        flags: BindShaderResourcesFlags,
    );

    /// Copies the pipeline's static bindings. Only the first call has an effect.
    fn initialize_static_resources(&self);

    /// Returns `true` once static bindings have been copied.
    fn static_resources_initialized(&self) -> bool;

    /// Number of mutable and dynamic variables visible in `stage`.
    fn variable_count(&self, stage: ShaderType) -> u32;

    /// Looks up a variable of `stage` by name.
    fn variable_by_name(&self, stage: ShaderType, name: &str)
        -> Option<&dyn ShaderResourceVariable>;

    /// Looks up a variable of `stage` by index.
    fn variable_by_index(&self, stage: ShaderType, index: u32)
        -> Option<&dyn ShaderResourceVariable>;
}
