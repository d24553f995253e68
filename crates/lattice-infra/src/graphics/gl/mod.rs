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

//! OpenGL / OpenGL ES backend.
//!
//! Native entry points are consumed through the [`GlFunctions`] trait, so the
//! backend can sit on top of any loader (or a recording mock in tests). All GL
//! object handles are wrapped in RAII types that delete the object on drop.

pub mod api;
pub mod device;
pub mod objects;
pub mod pipeline_state;
pub mod program;
pub mod resources;
pub mod settings;
pub mod shader;
pub mod srb;
pub mod variables;

pub use self::api::{
    GlActiveResource, GlContextHandle, GlError, GlFunctions, GlPipelineHandle, GlProgramHandle,
    GlResourceKind, GlShaderHandle, GlTextureHandle, ResourceDimension,
};
pub use self::device::GlRenderDevice;
pub use self::pipeline_state::GlPipelineState;
pub use self::program::{GlProgramResources, GlResourceAttribs};
pub use self::resources::{GlDeviceContext, GlStagingBuffer, GlTexture};
pub use self::settings::{GlDeviceCaps, GlDeviceSettings, GlDeviceType};
pub use self::shader::GlShader;
pub use self::srb::GlShaderResourceBinding;
pub use self::variables::{GlShaderVariable, GlShaderVariableManager};
