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

//! Shader resource bindings of GL pipelines.

use super::pipeline_state::GlPipelineState;
use super::variables::GlShaderVariableManager;
use lattice_core::graphics::api::{
    BindShaderResourcesFlags, ResourceVariableType, ShaderStages, ShaderType,
};
use lattice_core::graphics::traits::{
    PipelineState, ShaderResourceBinding, ShaderResourceVariable,
};
use lattice_core::graphics::{BoundResource, ResourceMapping};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const SRB_VARIABLE_TYPES: [ResourceVariableType; 2] =
    [ResourceVariableType::Mutable, ResourceVariableType::Dynamic];

/// Mutable and dynamic variables of a [`GlPipelineState`], plus a copy of its
/// static bindings.
pub struct GlShaderResourceBinding {
    pipeline: Arc<GlPipelineState>,
    managers: Vec<GlShaderVariableManager>,
    static_copies: Vec<GlShaderVariableManager>,
    static_resources_initialized: AtomicBool,
}

impl GlShaderResourceBinding {
    /// Creates a binding with one manager per program of `pipeline`.
    pub fn new(pipeline: Arc<GlPipelineState>, init_static_resources: bool) -> Self {
        let managers = pipeline
            .program_resources()
            .iter()
            .map(|res| GlShaderVariableManager::new(res, &SRB_VARIABLE_TYPES))
            .collect();
        let static_copies = pipeline
            .program_resources()
            .iter()
            .map(|res| GlShaderVariableManager::new(res, &[ResourceVariableType::Static]))
            .collect();
        let srb = Self {
            pipeline,
            managers,
            static_copies,
            static_resources_initialized: AtomicBool::new(false),
        };
        if init_static_resources {
            srb.initialize_static_resources();
        }
        srb
    }

    /// The concrete pipeline.
    pub fn gl_pipeline(&self) -> &Arc<GlPipelineState> {
        &self.pipeline
    }

    fn manager(&self, stage: ShaderType) -> Option<&GlShaderVariableManager> {
        self.pipeline
            .manager_index(stage)
            .and_then(|index| self.managers.get(index))
    }

    /// The resource that will be used for a variable at draw time: the SRB's
    /// own binding for mutable and dynamic variables, the copied static
    /// binding otherwise.
    pub fn bound_resource(
        &self,
        stage: ShaderType,
        name: &str,
        array_index: u32,
    ) -> Option<BoundResource> {
        let index = self.pipeline.manager_index(stage)?;
        [self.managers.get(index), self.static_copies.get(index)]
            .into_iter()
            .flatten()
            .find_map(|manager| manager.variable_by_name(name))
            .and_then(|var| var.bound_resource(array_index))
    }
}

impl ShaderResourceBinding for GlShaderResourceBinding {
    fn pipeline_state(&self) -> Arc<dyn PipelineState> {
        self.pipeline.clone()
    }

    fn bind_resources(
        &self,
        stages: ShaderStages,
        mapping: &ResourceMapping,
        flags: BindShaderResourcesFlags,
    ) {
        for manager in &self.managers {
            if manager.shader_stages().intersects(stages) {
                manager.bind_resources(mapping, flags);
            }
        }
    }

    fn initialize_static_resources(&self) {
        if self.static_resources_initialized.swap(true, Ordering::AcqRel) {
            log::warn!(
                "Static resources have already been initialized in this shader resource binding \
                 of pipeline '{}'. The operation will be ignored.",
                self.pipeline.name()
            );
            return;
        }
        for (dst, src) in self.static_copies.iter().zip(self.pipeline.static_managers()) {
            dst.copy_bindings_from(src);
        }
    }

    fn static_resources_initialized(&self) -> bool {
        self.static_resources_initialized.load(Ordering::Acquire)
    }

    fn variable_count(&self, stage: ShaderType) -> u32 {
        self.manager(stage)
            .map_or(0, GlShaderVariableManager::variable_count)
    }

    fn variable_by_name(
        &self,
        stage: ShaderType,
        name: &str,
    ) -> Option<&dyn ShaderResourceVariable> {
        let var = self.manager(stage)?.variable_by_name(name)?;
        Some(var)
    }

    fn variable_by_index(
        &self,
        stage: ShaderType,
        index: u32,
    ) -> Option<&dyn ShaderResourceVariable> {
        let var = self.manager(stage)?.variable_by_index(index)?;
        Some(var)
    }
}
