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

//! The GL render device.

use super::api::{GlContextHandle, GlFunctions};
use super::pipeline_state::GlPipelineState;
use super::resources::{GlDeviceContext, GlStagingBuffer};
use super::settings::{GlDeviceCaps, GlDeviceSettings};
use super::shader::GlShader;
use lattice_core::graphics::api::{
    BufferDesc, PipelineId, PipelineStateDesc, ShaderCreateInfo, ShaderSource,
};
use lattice_core::graphics::traits::{Buffer, RenderDevice, ResourceFactory};
use lattice_core::graphics::{ResourceError, ShaderError, StateObjectsRegistry};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// An OpenGL device.
///
/// Owns the GL function table and keeps a registry of the pipeline states it
/// created. Pipelines report their destruction without touching the registry;
/// stale entries are removed by [`purge_stale_pipelines`](Self::purge_stale_pipelines).
pub struct GlRenderDevice {
    gl: Arc<dyn GlFunctions>,
    caps: GlDeviceCaps,
    settings: GlDeviceSettings,
    pipelines: StateObjectsRegistry<PipelineId, GlPipelineState>,
}

impl GlRenderDevice {
    /// Creates a device on top of a loaded GL function table.
    ///
    /// ## Arguments
    ///
    /// * `gl` - Native entry points.
    /// * `caps` - What the implementation supports.
    /// * `settings` - User settings.
    pub fn new(
        gl: Arc<dyn GlFunctions>,
        caps: GlDeviceCaps,
        settings: GlDeviceSettings,
    ) -> Arc<Self> {
        let mut settings = settings;
        if settings.command_queue_count == 0 {
            log::warn!("GL device needs at least one command queue, using 1");
            settings.command_queue_count = 1;
        }
        let device = Arc::new(Self {
            gl,
            caps,
            settings,
            pipelines: StateObjectsRegistry::new("GL pipeline registry"),
        });
        log::info!(
            "Created {:?} device: separable programs {}, {} command queue(s)",
            device.caps.device_type,
            if device.uses_separable_programs() { "enabled" } else { "disabled" },
            device.settings.command_queue_count
        );
        device
    }

    /// Native entry points.
    pub fn gl(&self) -> &Arc<dyn GlFunctions> {
        &self.gl
    }

    /// Implementation capabilities.
    pub fn caps(&self) -> &GlDeviceCaps {
        &self.caps
    }

    /// Device settings.
    pub fn settings(&self) -> &GlDeviceSettings {
        &self.settings
    }

    /// Returns `true` if shaders are built as separable programs and
    /// pipelines skip linking.
    pub fn uses_separable_programs(&self) -> bool {
        self.caps.separable_programs && !self.settings.force_non_separable_programs
    }

    /// Wraps a native context current on the calling thread.
    pub fn create_device_context(&self, context: GlContextHandle) -> GlDeviceContext {
        GlDeviceContext::new(self.gl.clone(), context)
    }

    /// Creates and registers a pipeline state.
    ///
    /// ## Returns
    ///
    /// The pipeline, or the first fatal validation, compile or link error.
    pub fn create_pipeline_state(
        self: &Arc<Self>,
        desc: &PipelineStateDesc<'_, GlShader>,
    ) -> Result<Arc<GlPipelineState>, ResourceError> {
        let pipeline = Arc::new(GlPipelineState::new(self, desc, false)?);
        self.pipelines.add(pipeline.base().id(), &pipeline);
        Ok(pipeline)
    }

    /// Returns a live pipeline created by this device.
    pub fn find_pipeline_state(&self, id: PipelineId) -> Option<Arc<GlPipelineState>> {
        self.pipelines.find(&id)
    }

    /// Number of registered pipelines, including destroyed ones not purged yet.
    pub fn registered_pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Removes registry entries of destroyed pipelines.
    ///
    /// ## Returns
    ///
    /// The number of entries removed.
    pub fn purge_stale_pipelines(&self) -> usize {
        self.pipelines.purge_stale()
    }
}

impl RenderDevice for GlRenderDevice {
    type Shader = GlShader;

    fn command_queue_count(&self) -> u32 {
        self.settings.command_queue_count
    }

    fn command_queue_mask(&self) -> u64 {
        match self.settings.command_queue_count {
            count if count >= 64 => u64::MAX,
            count => (1u64 << count) - 1,
        }
    }

    fn create_shader(&self, info: &ShaderCreateInfo<'_>) -> Result<Arc<GlShader>, ResourceError> {
        let source: Cow<'_, str> = match &info.source {
            ShaderSource::Code(code) if code.is_empty() => {
                return Err(ShaderError::MissingSource {
                    label: info.desc.label().to_string(),
                }
                .into());
            }
            ShaderSource::Code(code) => Cow::Borrowed(code.as_ref()),
            ShaderSource::File(path) => {
                let factory = info
                    .source_factory
                    .ok_or_else(|| ShaderError::MissingSourceFactory {
                        path: path.to_string(),
                    })?;
                Cow::Owned(factory.load_source(path)?)
            }
        };
        let shader = GlShader::new(
            &self.gl,
            info.desc.clone().into_owned(),
            &source,
            self.uses_separable_programs(),
        )?;
        Ok(Arc::new(shader))
    }

    fn on_pipeline_destroyed(&self, id: PipelineId) {
        self.pipelines.report_deleted(id);
    }
}

impl ResourceFactory for GlRenderDevice {
    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Result<Arc<dyn Buffer>, ResourceError> {
        let desc = BufferDesc {
            name: desc.name.as_ref().map(|n| Cow::Owned(n.to_string())),
            size: desc.size,
            usage: desc.usage,
            cpu_access: desc.cpu_access,
        };
        let buffer = GlStagingBuffer::new(desc)?;
        Ok(Arc::new(buffer))
    }
}

impl fmt::Debug for GlRenderDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlRenderDevice")
            .field("caps", &self.caps)
            .field("settings", &self.settings)
            .field("pipelines", &self.pipelines.len())
            .finish_non_exhaustive()
    }
}
