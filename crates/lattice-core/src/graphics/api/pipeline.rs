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

//! Pipeline state descriptors.

use super::enums::{PrimitiveTopology, ResourceVariableType};
use super::flags::ShaderStages;
use super::format::TextureFormat;
use super::input_layout::{InputLayoutDesc, LayoutDiagnostic};
use super::sampler::StaticSamplerDesc;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Maximum number of simultaneously bound render targets.
pub const MAX_RENDER_TARGETS: usize = 8;

/// An opaque handle identifying a pipeline state for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(pub usize);

/// Classifies one named shader variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderResourceVariableDesc<'a> {
    /// Stages the classification applies to.
    pub shader_stages: ShaderStages,
    /// Variable name. Must not be empty.
    pub name: Cow<'a, str>,
    /// How often the variable changes.
    pub variable_type: ResourceVariableType,
}

impl<'a> ShaderResourceVariableDesc<'a> {
    /// Creates a variable description.
    pub fn new(
        shader_stages: ShaderStages,
        name: impl Into<Cow<'a, str>>,
        variable_type: ResourceVariableType,
    ) -> Self {
        Self {
            shader_stages,
            name: name.into(),
            variable_type,
        }
    }
}

/// Describes how shader variables are classified and which static samplers apply.
///
/// Lookups match the first entry whose stages intersect the queried stages and
/// whose name is equal. Duplicates are not rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLayoutDesc<'a> {
    /// Type given to variables not listed in `variables`.
    pub default_variable_type: ResourceVariableType,
    /// Explicit variable classifications.
    pub variables: Cow<'a, [ShaderResourceVariableDesc<'a>]>,
    /// Immutable samplers.
    pub static_samplers: Cow<'a, [StaticSamplerDesc<'a>]>,
}

/// Number of samples per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleDesc {
    /// Samples per pixel.
    pub count: u8,
    /// Backend-specific quality level.
    pub quality: u8,
}

impl Default for SampleDesc {
    fn default() -> Self {
        Self {
            count: 1,
            quality: 0,
        }
    }
}

/// Fixed-function output state of a graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphicsOutputState {
    /// Primitive topology.
    pub primitive_topology: PrimitiveTopology,
    /// Number of viewports.
    pub num_viewports: u8,
    /// Multisample coverage mask.
    pub sample_mask: u32,
    /// Number of bound render targets.
    pub num_render_targets: u8,
    /// Render target formats. Slots at and beyond `num_render_targets` must be
    /// [`TextureFormat::Unknown`].
    pub rtv_formats: [TextureFormat; MAX_RENDER_TARGETS],
    /// Depth-stencil format.
    pub dsv_format: TextureFormat,
    /// Multisampling.
    pub sample: SampleDesc,
}

impl Default for GraphicsOutputState {
    fn default() -> Self {
        Self {
            primitive_topology: PrimitiveTopology::TriangleList,
            num_viewports: 1,
            sample_mask: 0xFFFF_FFFF,
            num_render_targets: 0,
            rtv_formats: [TextureFormat::Unknown; MAX_RENDER_TARGETS],
            dsv_format: TextureFormat::Unknown,
            sample: SampleDesc::default(),
        }
    }
}

/// Shaders and vertex input of a graphics pipeline.
#[derive(Debug)]
pub struct GraphicsPipelineDesc<'a, S> {
    /// Vertex shader.
    pub vs: Option<Arc<S>>,
    /// Pixel shader.
    pub ps: Option<Arc<S>>,
    /// Geometry shader.
    pub gs: Option<Arc<S>>,
    /// Hull shader.
    pub hs: Option<Arc<S>>,
    /// Domain shader.
    pub ds: Option<Arc<S>>,
    /// Vertex input layout.
    pub input_layout: InputLayoutDesc<'a>,
    /// Fixed-function output state.
    pub output: GraphicsOutputState,
}

impl<S> Default for GraphicsPipelineDesc<'_, S> {
    fn default() -> Self {
        Self {
            vs: None,
            ps: None,
            gs: None,
            hs: None,
            ds: None,
            input_layout: InputLayoutDesc::default(),
            output: GraphicsOutputState::default(),
        }
    }
}

/// The shader of a compute pipeline.
#[derive(Debug)]
pub struct ComputePipelineDesc<S> {
    /// Compute shader. Required.
    pub cs: Option<Arc<S>>,
}

/// Selects the kind of pipeline being described.
#[derive(Debug)]
pub enum PipelineKind<'a, S> {
    /// A graphics pipeline.
    Graphics(GraphicsPipelineDesc<'a, S>),
    /// A compute pipeline.
    Compute(ComputePipelineDesc<S>),
}

/// Describes a pipeline state object.
#[derive(Debug)]
pub struct PipelineStateDesc<'a, S> {
    /// An optional debug name.
    pub name: Option<Cow<'a, str>>,
    /// Command queues the pipeline may be used on, one bit per queue.
    pub command_queue_mask: u64,
    /// Number of shader resource bindings allocated per chunk.
    pub srb_allocation_granularity: u32,
    /// Variable classification and static samplers.
    pub resource_layout: ResourceLayoutDesc<'a>,
    /// Graphics or compute specific part.
    pub kind: PipelineKind<'a, S>,
}

impl<'a, S> PipelineStateDesc<'a, S> {
    /// Describes a graphics pipeline with default queue affinity.
    pub fn graphics(name: impl Into<Cow<'a, str>>, graphics: GraphicsPipelineDesc<'a, S>) -> Self {
        Self::with_kind(name.into(), PipelineKind::Graphics(graphics))
    }

    /// Describes a compute pipeline with default queue affinity.
    pub fn compute(name: impl Into<Cow<'a, str>>, cs: Option<Arc<S>>) -> Self {
        Self::with_kind(name.into(), PipelineKind::Compute(ComputePipelineDesc { cs }))
    }

    fn with_kind(name: Cow<'a, str>, kind: PipelineKind<'a, S>) -> Self {
        Self {
            name: Some(name),
            command_queue_mask: 1,
            srb_allocation_granularity: 1,
            resource_layout: ResourceLayoutDesc::default(),
            kind,
        }
    }

    /// Sets the resource layout.
    pub fn with_resource_layout(mut self, layout: ResourceLayoutDesc<'a>) -> Self {
        self.resource_layout = layout;
        self
    }

    /// Returns `true` for compute pipelines.
    pub fn is_compute_pipeline(&self) -> bool {
        matches!(self.kind, PipelineKind::Compute(_))
    }

    /// The debug name, or an empty string.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// A non-fatal problem found while creating a pipeline state.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineDiagnostic {
    /// A problem in the input layout.
    Layout(LayoutDiagnostic),
    /// A static sampler uses a border color not every backend supports.
    NonPortableBorderColor {
        /// Name of the sampler or texture variable.
        name: String,
        /// The requested color.
        color: [f32; 4],
    },
    /// A render-target slot past `num_render_targets` has a format.
    UnusedRenderTargetFormat {
        /// The slot.
        slot: u32,
        /// The format it was given.
        format: TextureFormat,
    },
    /// The requested queue mask has no bit in common with the device's queues.
    CommandQueueMaskMismatch {
        /// The mask from the description.
        requested: u64,
        /// The device's queue mask.
        available: u64,
    },
}

impl fmt::Display for PipelineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineDiagnostic::Layout(diag) => diag.fmt(f),
            PipelineDiagnostic::NonPortableBorderColor { name, color } => write!(
                f,
                "Static sampler for variable '{name}' specifies border color ({}, {}, {}, {}). \
                 Static samplers are only portable with transparent black (0,0,0,0), \
                 opaque black (0,0,0,1) or opaque white (1,1,1,1) border colors",
                color[0], color[1], color[2], color[3]
            ),
            PipelineDiagnostic::UnusedRenderTargetFormat { slot, format } => write!(
                f,
                "Render target format ({}) of unused slot {slot} must be set to Unknown",
                format.attribs().name
            ),
            PipelineDiagnostic::CommandQueueMaskMismatch {
                requested,
                available,
            } => write!(
                f,
                "No bits in the command queue mask ({requested:#x}) correspond to one of the \
                 available device command queues ({available:#x})"
            ),
        }
    }
}
