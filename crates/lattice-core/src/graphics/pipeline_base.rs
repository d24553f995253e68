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

//! State and validation shared by every backend's pipeline state type.
//!
//! [`PipelineStateBase`] is created first by a backend pipeline constructor.
//! It checks that each shader sits in the slot of its own type, copies the
//! resource layout into storage the pipeline owns, resolves the input layout
//! and restricts queue affinity to queues the device actually has. Fatal
//! problems are returned as [`PipelineError`]; everything else is logged and
//! recorded as a [`PipelineDiagnostic`] so the pipeline can still be created
//! with best-effort values.
//!
//! The backend then computes a resource layout hash and stores it with
//! [`PipelineStateBase::set_resource_layout_hash`]. Two pipelines whose hashes
//! differ are never compatible. Equal hashes only say the binding layouts
//! match; resource dimensions are not part of the hash.

use crate::graphics::api::{
    GraphicsOutputState, NormalizedInputLayout, PipelineDiagnostic, PipelineId, PipelineKind,
    PipelineStateDesc, ResolvedLayoutElement, ResourceVariableType, SamplerDesc,
    ShaderResourceVariableDesc, ShaderStages, ShaderType, StaticSamplerDesc, TextureFormat,
    MAX_RENDER_TARGETS,
};
use crate::graphics::error::PipelineError;
use crate::graphics::traits::{RenderDevice, Shader};
use crate::utils::{PooledStr, StringPool};
use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

static NEXT_PIPELINE_ID: AtomicUsize = AtomicUsize::new(0);

/// A reference from a device object to its device.
///
/// Objects the device creates for itself hold a weak reference so they do not
/// keep the device alive.
#[derive(Debug)]
pub enum DeviceRef<D> {
    /// Keeps the device alive.
    Strong(Arc<D>),
    /// Used by device-internal objects.
    Weak(Weak<D>),
}

impl<D> DeviceRef<D> {
    /// Creates a strong or weak reference depending on `is_device_internal`.
    pub fn new(device: &Arc<D>, is_device_internal: bool) -> Self {
        if is_device_internal {
            DeviceRef::Weak(Arc::downgrade(device))
        } else {
            DeviceRef::Strong(device.clone())
        }
    }

    /// Returns the device if it is still alive.
    pub fn upgrade(&self) -> Option<Arc<D>> {
        match self {
            DeviceRef::Strong(device) => Some(device.clone()),
            DeviceRef::Weak(device) => device.upgrade(),
        }
    }

    /// Returns `true` for a weak reference.
    pub fn is_weak(&self) -> bool {
        matches!(self, DeviceRef::Weak(_))
    }
}

#[derive(Debug, Clone, Copy)]
struct PooledVariable {
    shader_stages: ShaderStages,
    name: PooledStr,
    variable_type: ResourceVariableType,
}

#[derive(Debug, Clone, Copy)]
struct PooledStaticSampler {
    shader_stages: ShaderStages,
    name: PooledStr,
    desc: SamplerDesc,
}

/// The backend-independent part of a pipeline state.
pub struct PipelineStateBase<D: RenderDevice> {
    id: PipelineId,
    device: DeviceRef<D>,
    name: String,
    is_compute: bool,
    command_queue_mask: u64,
    srb_allocation_granularity: u32,

    default_variable_type: ResourceVariableType,
    string_pool: StringPool,
    variables: Vec<PooledVariable>,
    static_samplers: Vec<PooledStaticSampler>,

    output: GraphicsOutputState,
    input_layout: NormalizedInputLayout,

    vs: Option<Arc<D::Shader>>,
    ps: Option<Arc<D::Shader>>,
    gs: Option<Arc<D::Shader>>,
    hs: Option<Arc<D::Shader>>,
    ds: Option<Arc<D::Shader>>,
    cs: Option<Arc<D::Shader>>,
    shaders: Vec<Arc<D::Shader>>,

    resource_layout_hash: u64,
    diagnostics: Vec<PipelineDiagnostic>,
}

fn check_shader_type<S: Shader>(
    pipeline: &str,
    shader: &Option<Arc<S>>,
    expected: ShaderType,
) -> Result<(), PipelineError> {
    match shader {
        Some(shader) if shader.shader_type() != expected => {
            let err = PipelineError::InvalidShaderType {
                pipeline: pipeline.to_string(),
                expected,
                actual: shader.shader_type(),
            };
            log::error!("{err}");
            Err(err)
        }
        _ => Ok(()),
    }
}

impl<D: RenderDevice> PipelineStateBase<D> {
    /// Validates `desc` and builds the shared pipeline state.
    ///
    /// ## Arguments
    ///
    /// * `device` - The owning device.
    /// * `desc` - The pipeline description. Borrowed names and arrays are
    ///   copied; nothing of `desc` is retained.
    /// * `is_device_internal` - The pipeline belongs to the device itself and
    ///   must only hold a weak reference to it.
    ///
    /// ## Returns
    ///
    /// The base state, or the first fatal error found.
    pub fn new(
        device: &Arc<D>,
        desc: &PipelineStateDesc<'_, D::Shader>,
        is_device_internal: bool,
    ) -> Result<Self, PipelineError> {
        let name = desc.label().to_string();
        let mut diagnostics = Vec::new();

        let mut vs = None;
        let mut ps = None;
        let mut gs = None;
        let mut hs = None;
        let mut ds = None;
        let mut cs = None;
        let mut shaders = Vec::new();
        let mut output = GraphicsOutputState::default();
        let mut input_layout = NormalizedInputLayout::default();

        match &desc.kind {
            PipelineKind::Compute(compute) => {
                let Some(shader) = &compute.cs else {
                    let err = PipelineError::MissingComputeShader { pipeline: name };
                    log::error!("{err}");
                    return Err(err);
                };
                check_shader_type(&name, &compute.cs, ShaderType::Compute)?;
                cs = Some(shader.clone());
                shaders.push(shader.clone());
            }
            PipelineKind::Graphics(graphics) => {
                check_shader_type(&name, &graphics.vs, ShaderType::Vertex)?;
                check_shader_type(&name, &graphics.ps, ShaderType::Pixel)?;
                check_shader_type(&name, &graphics.gs, ShaderType::Geometry)?;
                check_shader_type(&name, &graphics.hs, ShaderType::Hull)?;
                check_shader_type(&name, &graphics.ds, ShaderType::Domain)?;

                vs = graphics.vs.clone();
                ps = graphics.ps.clone();
                gs = graphics.gs.clone();
                hs = graphics.hs.clone();
                ds = graphics.ds.clone();
                shaders.extend([&vs, &ps, &gs, &hs, &ds].into_iter().flatten().cloned());

                if shaders.is_empty() {
                    let err = PipelineError::NoShaders { pipeline: name };
                    log::error!("{err}");
                    return Err(err);
                }

                output = graphics.output;
                let first_unused = (output.num_render_targets as usize).min(MAX_RENDER_TARGETS);
                for (slot, format) in output.rtv_formats.iter().enumerate().skip(first_unused) {
                    if *format != TextureFormat::Unknown {
                        let diag = PipelineDiagnostic::UnusedRenderTargetFormat {
                            slot: slot as u32,
                            format: *format,
                        };
                        log::error!("Pipeline '{name}': {diag}");
                        diagnostics.push(diag);
                    }
                }

                input_layout = NormalizedInputLayout::normalize(&graphics.input_layout);
                diagnostics.extend(
                    input_layout
                        .diagnostics()
                        .iter()
                        .copied()
                        .map(PipelineDiagnostic::Layout),
                );
            }
        }

        let layout = &desc.resource_layout;
        let pool_size = layout
            .variables
            .iter()
            .map(|v| StringPool::required_size(&v.name))
            .chain(
                layout
                    .static_samplers
                    .iter()
                    .map(|s| StringPool::required_size(&s.sampler_or_texture_name)),
            )
            .sum();
        let mut string_pool = StringPool::new();
        string_pool.reserve(pool_size);

        let variables = layout
            .variables
            .iter()
            .map(|var| {
                debug_assert!(!var.name.is_empty(), "Variable name can't be empty");
                PooledVariable {
                    shader_stages: var.shader_stages,
                    name: string_pool.copy_string(&var.name),
                    variable_type: var.variable_type,
                }
            })
            .collect();

        let mut static_samplers = Vec::with_capacity(layout.static_samplers.len());
        for sampler in layout.static_samplers.iter() {
            debug_assert!(
                !sampler.sampler_or_texture_name.is_empty(),
                "Static sampler or texture name can't be empty"
            );
            if !sampler.desc.has_portable_border_color() {
                let diag = PipelineDiagnostic::NonPortableBorderColor {
                    name: sampler.sampler_or_texture_name.to_string(),
                    color: sampler.desc.border_color,
                };
                log::warn!("Pipeline '{name}': {diag}");
                diagnostics.push(diag);
            }
            static_samplers.push(PooledStaticSampler {
                shader_stages: sampler.shader_stages,
                name: string_pool.copy_string(&sampler.sampler_or_texture_name),
                desc: sampler.desc,
            });
        }
        debug_assert_eq!(string_pool.remaining_size(), 0);

        let available = device.command_queue_mask();
        if desc.command_queue_mask & available == 0 {
            let diag = PipelineDiagnostic::CommandQueueMaskMismatch {
                requested: desc.command_queue_mask,
                available,
            };
            log::error!(
                "Pipeline '{name}': {diag} ({} queue(s))",
                device.command_queue_count()
            );
            diagnostics.push(diag);
        }
        let command_queue_mask = desc.command_queue_mask & available;

        let id = PipelineId(NEXT_PIPELINE_ID.fetch_add(1, Ordering::Relaxed));
        log::debug!(
            "Created pipeline state '{name}' ({id:?}) with {} shader(s)",
            shaders.len()
        );

        Ok(Self {
            id,
            device: DeviceRef::new(device, is_device_internal),
            name,
            is_compute: desc.is_compute_pipeline(),
            command_queue_mask,
            srb_allocation_granularity: desc.srb_allocation_granularity,
            default_variable_type: layout.default_variable_type,
            string_pool,
            variables,
            static_samplers,
            output,
            input_layout,
            vs,
            ps,
            gs,
            hs,
            ds,
            cs,
            shaders,
            resource_layout_hash: 0,
            diagnostics,
        })
    }

    /// Process-unique identifier.
    pub fn id(&self) -> PipelineId {
        self.id
    }

    /// The debug name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for compute pipelines.
    pub fn is_compute_pipeline(&self) -> bool {
        self.is_compute
    }

    /// The owning device, if still alive.
    pub fn device(&self) -> Option<Arc<D>> {
        self.device.upgrade()
    }

    /// Returns `true` if the pipeline only weakly references its device.
    pub fn is_device_internal(&self) -> bool {
        self.device.is_weak()
    }

    /// Queue affinity after intersection with the device's queues.
    pub fn command_queue_mask(&self) -> u64 {
        self.command_queue_mask
    }

    /// Number of shader resource bindings allocated per chunk.
    pub fn srb_allocation_granularity(&self) -> u32 {
        self.srb_allocation_granularity
    }

    /// Fixed-function output state. Defaults for compute pipelines.
    pub fn output_state(&self) -> &GraphicsOutputState {
        &self.output
    }

    /// The resolved input layout elements.
    pub fn input_layout(&self) -> &[ResolvedLayoutElement] {
        self.input_layout.elements()
    }

    /// Stride of vertex buffer `slot`, or `0` if unused.
    pub fn buffer_stride(&self, slot: u32) -> u32 {
        self.input_layout.buffer_stride(slot)
    }

    /// One past the highest vertex buffer slot used.
    pub fn num_buffer_slots_used(&self) -> u32 {
        self.input_layout.num_buffer_slots_used()
    }

    /// Type given to variables the layout does not list.
    pub fn default_variable_type(&self) -> ResourceVariableType {
        self.default_variable_type
    }

    /// The layout's variable classifications.
    pub fn variables(&self) -> impl Iterator<Item = ShaderResourceVariableDesc<'_>> + '_ {
        self.variables.iter().map(|v| ShaderResourceVariableDesc {
            shader_stages: v.shader_stages,
            name: Cow::Borrowed(self.string_pool.get(v.name)),
            variable_type: v.variable_type,
        })
    }

    /// The layout's static samplers.
    pub fn static_samplers(&self) -> impl Iterator<Item = StaticSamplerDesc<'_>> + '_ {
        self.static_samplers.iter().map(|s| StaticSamplerDesc {
            shader_stages: s.shader_stages,
            sampler_or_texture_name: Cow::Borrowed(self.string_pool.get(s.name)),
            desc: s.desc,
        })
    }

    /// Classifies a variable visible in `stages`.
    ///
    /// The first layout entry whose stages intersect `stages` and whose name
    /// matches wins; unlisted variables get the default type.
    pub fn variable_type(&self, stages: ShaderStages, name: &str) -> ResourceVariableType {
        self.variables
            .iter()
            .find(|v| v.shader_stages.intersects(stages) && self.string_pool.get(v.name) == name)
            .map_or(self.default_variable_type, |v| v.variable_type)
    }

    /// The static sampler assigned to `name` in `stages`, if any.
    pub fn static_sampler(&self, stages: ShaderStages, name: &str) -> Option<&SamplerDesc> {
        self.static_samplers
            .iter()
            .find(|s| s.shader_stages.intersects(stages) && self.string_pool.get(s.name) == name)
            .map(|s| &s.desc)
    }

    /// Vertex shader.
    pub fn vs(&self) -> Option<&Arc<D::Shader>> {
        self.vs.as_ref()
    }

    /// Pixel shader.
    pub fn ps(&self) -> Option<&Arc<D::Shader>> {
        self.ps.as_ref()
    }

    /// Geometry shader.
    pub fn gs(&self) -> Option<&Arc<D::Shader>> {
        self.gs.as_ref()
    }

    /// Hull shader.
    pub fn hs(&self) -> Option<&Arc<D::Shader>> {
        self.hs.as_ref()
    }

    /// Domain shader.
    pub fn ds(&self) -> Option<&Arc<D::Shader>> {
        self.ds.as_ref()
    }

    /// Compute shader.
    pub fn cs(&self) -> Option<&Arc<D::Shader>> {
        self.cs.as_ref()
    }

    /// Every shader of the pipeline, graphics stages in VS, PS, GS, HS, DS order.
    pub fn shaders(&self) -> &[Arc<D::Shader>] {
        &self.shaders
    }

    /// Number of shaders.
    pub fn num_shaders(&self) -> usize {
        self.shaders.len()
    }

    /// Shader at `index` in [`shaders`](Self::shaders).
    pub fn shader(&self, index: usize) -> Option<&Arc<D::Shader>> {
        self.shaders.get(index)
    }

    /// Union of the stages of all shaders.
    pub fn shader_stages(&self) -> ShaderStages {
        self.shaders
            .iter()
            .fold(ShaderStages::EMPTY, |acc, s| acc | s.shader_type().stage())
    }

    /// Installs a pixel shader on a graphics pipeline created without one.
    ///
    /// Backends that need a fragment stage bound at all times synthesize a
    /// no-op shader and install it here. The shader is appended to
    /// [`shaders`](Self::shaders).
    pub fn set_default_pixel_shader(&mut self, ps: Arc<D::Shader>) {
        debug_assert!(!self.is_compute && self.ps.is_none());
        debug_assert_eq!(ps.shader_type(), ShaderType::Pixel);
        self.shaders.push(ps.clone());
        self.ps = Some(ps);
    }

    /// Structural hash of the shader resource layout, set by the backend.
    pub fn resource_layout_hash(&self) -> u64 {
        self.resource_layout_hash
    }

    /// Stores the backend-computed resource layout hash.
    pub fn set_resource_layout_hash(&mut self, hash: u64) {
        self.resource_layout_hash = hash;
    }

    /// Hash-only incompatibility test.
    ///
    /// Returns `true` when the pipelines certainly cannot share shader
    /// resource bindings. `false` does not prove compatibility.
    pub fn is_incompatible_with(&self, other: &PipelineStateBase<D>) -> bool {
        self.resource_layout_hash != other.resource_layout_hash
    }

    /// Non-fatal problems found during creation.
    pub fn diagnostics(&self) -> &[PipelineDiagnostic] {
        &self.diagnostics
    }
}

impl<D: RenderDevice> Drop for PipelineStateBase<D> {
    fn drop(&mut self) {
        // Registries are purged by the device later, never from here.
        if let Some(device) = self.device.upgrade() {
            device.on_pipeline_destroyed(self.id);
        }
    }
}
