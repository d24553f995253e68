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

//! GL shader objects.

use super::api::{GlActiveResource, GlFunctions, GlProgramHandle, GlShaderHandle};
use super::objects::{GlProgramObject, GlShaderObject};
use lattice_core::graphics::api::ShaderDesc;
use lattice_core::graphics::traits::Shader;
use lattice_core::graphics::{ResourceError, ShaderError};
use std::fmt;
use std::sync::Arc;

/// A compiled GL shader.
///
/// When the device uses separable programs, the shader is also linked into a
/// single-stage separable program whose reflected resources are kept for
/// pipeline creation.
pub struct GlShader {
    desc: ShaderDesc<'static>,
    object: GlShaderObject,
    separable_program: Option<GlProgramObject>,
    active_resources: Vec<GlActiveResource>,
}

impl GlShader {
    /// Compiles `source` and, if `separable` is set, links the stage program.
    ///
    /// ## Returns
    ///
    /// The shader, or [`ShaderError::CompilationError`] carrying the native log.
    pub fn new(
        gl: &Arc<dyn GlFunctions>,
        desc: ShaderDesc<'static>,
        source: &str,
        separable: bool,
    ) -> Result<Self, ResourceError> {
        let object = GlShaderObject::create(gl, desc.shader_type)?;
        if let Err(details) = object.compile(source) {
            let err = ShaderError::CompilationError {
                label: desc.label().to_string(),
                details,
            };
            log::error!("{err}");
            return Err(err.into());
        }

        let mut separable_program = None;
        let mut active_resources = Vec::new();
        if separable {
            let program = GlProgramObject::create(gl)?;
            if let Err(details) = program.link(&[object.handle()], true) {
                let err = ShaderError::CompilationError {
                    label: desc.label().to_string(),
                    details,
                };
                log::error!("Failed to link separable program: {err}");
                return Err(err.into());
            }
            active_resources = gl.active_resources(program.handle());
            separable_program = Some(program);
        }

        log::debug!(
            "Created {} shader '{}' ({} reflected resource(s))",
            desc.shader_type,
            desc.label(),
            active_resources.len()
        );
        Ok(Self {
            desc,
            object,
            separable_program,
            active_resources,
        })
    }

    /// The native shader object.
    pub fn handle(&self) -> GlShaderHandle {
        self.object.handle()
    }

    /// The single-stage separable program, if any.
    pub fn separable_program(&self) -> Option<GlProgramHandle> {
        self.separable_program.as_ref().map(GlProgramObject::handle)
    }

    /// Resources reflected from the separable program. Empty when the shader
    /// has no separable program.
    pub fn active_resources(&self) -> &[GlActiveResource] {
        &self.active_resources
    }
}

impl Shader for GlShader {
    fn desc(&self) -> &ShaderDesc<'static> {
        &self.desc
    }
}

impl fmt::Debug for GlShader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlShader")
            .field("desc", &self.desc)
            .field("object", &self.object)
            .field("separable_program", &self.separable_program)
            .finish_non_exhaustive()
    }
}
