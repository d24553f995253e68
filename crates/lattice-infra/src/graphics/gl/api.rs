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

//! The native OpenGL surface the backend is written against.

use lattice_core::graphics::api::{ShaderStages, ShaderType, TextureRegion};
use lattice_core::graphics::ResourceError;
use std::fmt;

/// A GL shader object name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlShaderHandle(pub u32);

/// A GL program object name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlProgramHandle(pub u32);

/// A GL program pipeline object name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlPipelineHandle(pub u32);

/// A GL texture object name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlTextureHandle(pub u32);

/// Identifies a native GL context. Program pipelines are not shared between
/// contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlContextHandle(pub usize);

/// The kind of an active program resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlResourceKind {
    /// A uniform block.
    UniformBuffer,
    /// A sampler (combined texture and sampler).
    Sampler,
    /// A storage image.
    Image,
    /// A shader storage block.
    StorageBuffer,
}

impl GlResourceKind {
    /// Returns `true` for kinds bound with buffers.
    pub fn binds_buffers(self) -> bool {
        matches!(self, GlResourceKind::UniformBuffer | GlResourceKind::StorageBuffer)
    }
}

/// Dimensionality of a sampler or image resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceDimension {
    /// Buffers and other non-texture resources.
    Undefined,
    /// Buffer texture.
    Buffer,
    /// 1D texture.
    Tex1D,
    /// 1D texture array.
    Tex1DArray,
    /// 2D texture.
    Tex2D,
    /// 2D texture array.
    Tex2DArray,
    /// 3D texture.
    Tex3D,
    /// Cube map.
    Cube,
    /// Cube map array.
    CubeArray,
}

/// One active resource as reported by program introspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlActiveResource {
    /// Resource name, without array subscript.
    pub name: String,
    /// Resource kind.
    pub kind: GlResourceKind,
    /// Dimension, for samplers and images.
    pub dimension: ResourceDimension,
    /// Number of array elements.
    pub array_size: u32,
}

impl GlActiveResource {
    /// Creates a resource record.
    pub fn new(
        name: impl Into<String>,
        kind: GlResourceKind,
        dimension: ResourceDimension,
        array_size: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            dimension,
            array_size,
        }
    }
}

/// An error raised by a native GL call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlError {
    /// `glCreate*` / `glGen*` returned no object.
    ObjectCreationFailed(&'static str),
    /// A call raised a GL error code.
    CallFailed {
        /// The failing entry point.
        call: &'static str,
        /// The GL error code.
        code: u32,
    },
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlError::ObjectCreationFailed(what) => write!(f, "Failed to create GL {what}"),
            GlError::CallFailed { call, code } => {
                write!(f, "{call}() failed with GL error {code:#x}")
            }
        }
    }
}

impl std::error::Error for GlError {}

impl From<GlError> for ResourceError {
    fn from(err: GlError) -> Self {
        ResourceError::BackendError(err.to_string())
    }
}

/// GL entry points used by the backend.
///
/// Implementations wrap a loaded GL function table. Calls are made on the
/// thread that owns the current context.
pub trait GlFunctions: Send + Sync {
    /// `glCreateShader`.
    fn create_shader(&self, shader_type: ShaderType) -> Result<GlShaderHandle, GlError>;
    /// `glShaderSource` + `glCompileShader`. Returns the compile status.
    fn compile_shader(&self, shader: GlShaderHandle, source: &str) -> bool;
    /// `glGetShaderInfoLog`.
    fn shader_info_log(&self, shader: GlShaderHandle) -> String;
    /// `glDeleteShader`.
    fn delete_shader(&self, shader: GlShaderHandle);

    /// `glCreateProgram`.
    fn create_program(&self) -> Result<GlProgramHandle, GlError>;
    /// `glProgramParameteri(GL_PROGRAM_SEPARABLE)`.
    fn set_program_separable(&self, program: GlProgramHandle, separable: bool);
    /// `glAttachShader`.
    fn attach_shader(&self, program: GlProgramHandle, shader: GlShaderHandle);
    /// `glDetachShader`.
    fn detach_shader(&self, program: GlProgramHandle, shader: GlShaderHandle);
    /// `glLinkProgram`.
    fn link_program(&self, program: GlProgramHandle);
    /// `glGetProgramiv(GL_LINK_STATUS)`.
    fn link_status(&self, program: GlProgramHandle) -> bool;
    /// `glGetProgramInfoLog`.
    fn program_info_log(&self, program: GlProgramHandle) -> String;
    /// `glDeleteProgram`.
    fn delete_program(&self, program: GlProgramHandle);
    /// Active uniform blocks, samplers, images and storage blocks of a linked
    /// program.
    fn active_resources(&self, program: GlProgramHandle) -> Vec<GlActiveResource>;

    /// `glGenProgramPipelines` on `context`.
    fn create_program_pipeline(
        &self,
        context: GlContextHandle,
    ) -> Result<GlPipelineHandle, GlError>;
    /// `glUseProgramStages`.
    fn use_program_stages(
        &self,
        pipeline: GlPipelineHandle,
        stages: ShaderStages,
        program: GlProgramHandle,
    );
    /// `glDeleteProgramPipelines`.
    fn delete_program_pipeline(&self, pipeline: GlPipelineHandle);

    /// `glTexSubImage*` for one subresource from client memory.
    fn texture_sub_image(
        &self,
        texture: GlTextureHandle,
        mip_level: u32,
        slice: u32,
        region: &TextureRegion,
        row_stride: u32,
        data: &[u8],
    ) -> Result<(), GlError>;
}
