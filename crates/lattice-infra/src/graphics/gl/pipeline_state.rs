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

//! GL pipeline state objects.
//!
//! A pipeline is built in one of two ways, depending on the device:
//!
//! * **Separable programs.** Every shader already owns a single-stage program.
//!   Nothing is linked; the resources of each stage are classified on their
//!   own and the layout hash combines the per-stage hashes regardless of
//!   stage order. Stages are bound to a program pipeline object per context.
//! * **Monolithic program.** All stages are attached to one program and
//!   linked. A link failure fails pipeline creation.
//!
//! In both cases static variables live in the pipeline, one manager per
//! program; mutable and dynamic variables live in shader resource bindings.

use super::api::{GlContextHandle, GlFunctions, GlPipelineHandle, GlProgramHandle};
use super::device::GlRenderDevice;
use super::objects::{GlPipelineObject, GlProgramObject};
use super::program::GlProgramResources;
use super::shader::GlShader;
use super::srb::GlShaderResourceBinding;
use super::variables::GlShaderVariableManager;
use lattice_core::graphics::api::{
    BindShaderResourcesFlags, PipelineId, PipelineStateDesc, ResourceVariableType,
    ShaderCreateInfo, ShaderDesc, ShaderStages, ShaderType,
};
use lattice_core::graphics::traits::{
    PipelineState, RenderDevice, Shader, ShaderResourceBinding, ShaderResourceVariable,
};
use lattice_core::graphics::{
    PipelineError, PipelineStateBase, ResourceError, ResourceMapping,
};
use lattice_core::utils::combine_unordered;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

const DUMMY_FRAGMENT_SHADER_NAME: &str = "Dummy fragment shader";

/// A GL graphics or compute pipeline.
pub struct GlPipelineState {
    base: PipelineStateBase<GlRenderDevice>,
    gl: Arc<dyn GlFunctions>,
    program: Option<GlProgramObject>,
    program_resources: Vec<GlProgramResources>,
    static_managers: Vec<GlShaderVariableManager>,
    stage_managers: [Option<usize>; ShaderType::COUNT],
    program_pipelines: Mutex<Vec<GlPipelineObject>>,
}

impl GlPipelineState {
    /// Builds a pipeline.
    ///
    /// Graphics pipelines without a pixel shader get a no-op one, since GL
    /// needs a fragment stage.
    ///
    /// ## Arguments
    ///
    /// * `device` - The owning device.
    /// * `desc` - The pipeline description.
    /// * `is_device_internal` - The pipeline is owned by the device and only
    ///   holds a weak reference to it.
    pub fn new(
        device: &Arc<GlRenderDevice>,
        desc: &PipelineStateDesc<'_, GlShader>,
        is_device_internal: bool,
    ) -> Result<Self, ResourceError> {
        let mut base = PipelineStateBase::new(device, desc, is_device_internal)?;

        if !base.is_compute_pipeline() && base.ps().is_none() {
            let info = ShaderCreateInfo::from_code(
                ShaderDesc::new(ShaderType::Pixel).with_name(DUMMY_FRAGMENT_SHADER_NAME),
                device.settings().stub_fragment_shader_source.as_str(),
            );
            let ps = device.create_shader(&info)?;
            base.set_default_pixel_shader(ps);
        }

        let gl = device.gl().clone();
        let mut program = None;
        let mut program_resources = Vec::with_capacity(base.num_shaders());
        let mut stage_managers = [None; ShaderType::COUNT];

        let layout_hash = if device.uses_separable_programs() {
            for (index, shader) in base.shaders().iter().enumerate() {
                let resources = GlProgramResources::from_active(
                    shader.active_resources(),
                    shader.shader_type().stage(),
                    |stages, name| base.variable_type(stages, name),
                );
                program_resources.push(resources);
                stage_managers[shader.shader_type().index()] = Some(index);
            }
            combine_unordered(program_resources.iter().map(GlProgramResources::hash))
        } else {
            let linked = GlProgramObject::create(&gl)?;
            let shaders: Vec<_> = base.shaders().iter().map(|s| s.handle()).collect();
            if let Err(info_log) = linked.link(&shaders, false) {
                let err = PipelineError::LinkFailed {
                    pipeline: base.name().to_string(),
                    log: info_log,
                };
                log::error!("{err}");
                return Err(err.into());
            }
            let resources = GlProgramResources::from_active(
                &gl.active_resources(linked.handle()),
                base.shader_stages(),
                |stages, name| base.variable_type(stages, name),
            );
            let hash = resources.hash();
            program_resources.push(resources);
            program = Some(linked);
            hash
        };
        base.set_resource_layout_hash(layout_hash);

        let static_managers = program_resources
            .iter()
            .map(|res| GlShaderVariableManager::new(res, &[ResourceVariableType::Static]))
            .collect::<Vec<_>>();

        log::debug!(
            "Initialized GL pipeline '{}': {} program(s), {} static variable(s), layout hash {:#018x}",
            base.name(),
            program_resources.len(),
            static_managers
                .iter()
                .map(GlShaderVariableManager::variable_count)
                .sum::<u32>(),
            layout_hash
        );

        Ok(Self {
            base,
            gl,
            program,
            program_resources,
            static_managers,
            stage_managers,
            program_pipelines: Mutex::new(Vec::new()),
        })
    }

    /// The backend-independent state.
    pub fn base(&self) -> &PipelineStateBase<GlRenderDevice> {
        &self.base
    }

    /// The linked program of a monolithic pipeline.
    pub fn gl_program(&self) -> Option<GlProgramHandle> {
        self.program.as_ref().map(GlProgramObject::handle)
    }

    /// Reflected resources, one entry per program.
    pub fn program_resources(&self) -> &[GlProgramResources] {
        &self.program_resources
    }

    /// Index of the program (and variable manager) serving `stage`.
    pub fn manager_index(&self, stage: ShaderType) -> Option<usize> {
        if self.program.is_some() {
            self.program_resources
                .first()
                .filter(|res| res.shader_stages().intersects(stage.stage()))
                .map(|_| 0)
        } else {
            self.stage_managers[stage.index()]
        }
    }

    pub(crate) fn static_managers(&self) -> &[GlShaderVariableManager] {
        &self.static_managers
    }

    fn static_manager(&self, stage: ShaderType) -> Option<&GlShaderVariableManager> {
        let manager = self
            .manager_index(stage)
            .and_then(|index| self.static_managers.get(index));
        if manager.is_none() {
            log::warn!(
                "Pipeline '{}' has no {stage} shader; no static variables to look up",
                self.base.name()
            );
        }
        manager
    }

    fn resources_for(&self, stage: ShaderType) -> Option<&GlProgramResources> {
        self.manager_index(stage)
            .and_then(|index| self.program_resources.get(index))
    }

    /// Returns the program pipeline for `context`, creating it on first use.
    ///
    /// Program pipelines cannot be shared between contexts, so each context
    /// gets its own. The list only grows.
    pub fn gl_program_pipeline(
        &self,
        context: GlContextHandle,
    ) -> Result<GlPipelineHandle, ResourceError> {
        let mut pipelines = self
            .program_pipelines
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = pipelines.iter().find(|p| p.context() == context) {
            return Ok(existing.handle());
        }

        let pipeline = GlPipelineObject::create(&self.gl, context)?;
        match &self.program {
            Some(program) => {
                self.gl.use_program_stages(
                    pipeline.handle(),
                    self.base.shader_stages(),
                    program.handle(),
                );
            }
            None => {
                for shader in self.base.shaders() {
                    if let Some(program) = shader.separable_program() {
                        self.gl.use_program_stages(
                            pipeline.handle(),
                            shader.shader_type().stage(),
                            program,
                        );
                    }
                }
            }
        }
        let handle = pipeline.handle();
        pipelines.push(pipeline);
        log::debug!(
            "Created program pipeline for '{}' in context {:?}",
            self.base.name(),
            context
        );
        Ok(handle)
    }

    /// Number of contexts a program pipeline has been created for.
    pub fn program_pipeline_count(&self) -> usize {
        self.program_pipelines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl PipelineState for GlPipelineState {
    fn id(&self) -> PipelineId {
        self.base.id()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn is_compute_pipeline(&self) -> bool {
        self.base.is_compute_pipeline()
    }

    fn buffer_stride(&self, slot: u32) -> u32 {
        self.base.buffer_stride(slot)
    }

    fn num_buffer_slots_used(&self) -> u32 {
        self.base.num_buffer_slots_used()
    }

    fn resource_layout_hash(&self) -> u64 {
        self.base.resource_layout_hash()
    }

    fn bind_static_resources(
        &self,
        stages: ShaderStages,
        mapping: &ResourceMapping,
        flags: BindShaderResourcesFlags,
    ) {
        for manager in &self.static_managers {
            if manager.shader_stages().intersects(stages) {
                manager.bind_resources(mapping, flags);
            }
        }
    }

    fn static_variable_count(&self, stage: ShaderType) -> u32 {
        self.static_manager(stage)
            .map_or(0, GlShaderVariableManager::variable_count)
    }

    fn static_variable_by_name(
        &self,
        stage: ShaderType,
        name: &str,
    ) -> Option<&dyn ShaderResourceVariable> {
        let var = self.static_manager(stage)?.variable_by_name(name)?;
        Some(var)
    }

    fn static_variable_by_index(
        &self,
        stage: ShaderType,
        index: u32,
    ) -> Option<&dyn ShaderResourceVariable> {
        let var = self.static_manager(stage)?.variable_by_index(index)?;
        Some(var)
    }

    fn create_shader_resource_binding(
        self: Arc<Self>,
        init_static_resources: bool,
    ) -> Result<Arc<dyn ShaderResourceBinding>, ResourceError> {
        Ok(Arc::new(GlShaderResourceBinding::new(
            self,
            init_static_resources,
        )))
    }

    fn is_compatible_with(&self, other: &dyn PipelineState) -> bool {
        let Some(other) = other.as_any().downcast_ref::<GlPipelineState>() else {
            return false;
        };
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.base.is_incompatible_with(&other.base) {
            return false;
        }
        self.program_resources.len() == other.program_resources.len()
            && ShaderType::ALL.iter().all(|&stage| {
                match (self.resources_for(stage), other.resources_for(stage)) {
                    (Some(a), Some(b)) => a.is_compatible_with(b),
                    (None, None) => true,
                    _ => false,
                }
            })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for GlPipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlPipelineState")
            .field("id", &self.base.id())
            .field("name", &self.base.name())
            .field("program", &self.program)
            .field("programs", &self.program_resources.len())
            .finish_non_exhaustive()
    }
}
