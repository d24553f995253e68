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

//! RAII owners of native GL objects.

use super::api::{GlContextHandle, GlFunctions, GlPipelineHandle, GlProgramHandle, GlShaderHandle};
use lattice_core::graphics::api::ShaderType;
use std::fmt;
use std::sync::Arc;

/// Owns a compiled GL shader object.
pub struct GlShaderObject {
    gl: Arc<dyn GlFunctions>,
    handle: GlShaderHandle,
}

impl GlShaderObject {
    /// Creates an empty shader object for `shader_type`.
    pub fn create(
        gl: &Arc<dyn GlFunctions>,
        shader_type: ShaderType,
    ) -> Result<Self, super::GlError> {
        let handle = gl.create_shader(shader_type)?;
        Ok(Self {
            gl: gl.clone(),
            handle,
        })
    }

    /// Compiles `source`.
    ///
    /// ## Returns
    ///
    /// `Err` with the compiler info log on failure.
    pub fn compile(&self, source: &str) -> Result<(), String> {
        if self.gl.compile_shader(self.handle, source) {
            Ok(())
        } else {
            Err(self.gl.shader_info_log(self.handle))
        }
    }

    /// The native name.
    pub fn handle(&self) -> GlShaderHandle {
        self.handle
    }
}

impl Drop for GlShaderObject {
    fn drop(&mut self) {
        self.gl.delete_shader(self.handle);
    }
}

impl fmt::Debug for GlShaderObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlShaderObject").field(&self.handle.0).finish()
    }
}

/// Owns a GL program object.
pub struct GlProgramObject {
    gl: Arc<dyn GlFunctions>,
    handle: GlProgramHandle,
}

impl GlProgramObject {
    /// Creates an empty program.
    pub fn create(gl: &Arc<dyn GlFunctions>) -> Result<Self, super::GlError> {
        let handle = gl.create_program()?;
        Ok(Self {
            gl: gl.clone(),
            handle,
        })
    }

    /// The native name.
    pub fn handle(&self) -> GlProgramHandle {
        self.handle
    }

    /// Attaches `shaders`, links, and detaches them again.
    ///
    /// ## Returns
    ///
    /// `Err` with the program info log if linking failed.
    pub fn link(&self, shaders: &[GlShaderHandle], separable: bool) -> Result<(), String> {
        if separable {
            self.gl.set_program_separable(self.handle, true);
        }
        for shader in shaders {
            self.gl.attach_shader(self.handle, *shader);
        }
        self.gl.link_program(self.handle);
        let linked = self.gl.link_status(self.handle);
        let result = if linked {
            Ok(())
        } else {
            Err(self.gl.program_info_log(self.handle))
        };
        for shader in shaders {
            self.gl.detach_shader(self.handle, *shader);
        }
        result
    }
}

impl Drop for GlProgramObject {
    fn drop(&mut self) {
        self.gl.delete_program(self.handle);
    }
}

impl fmt::Debug for GlProgramObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlProgramObject").field(&self.handle.0).finish()
    }
}

/// Owns a GL program pipeline object. Only valid in the context it was
/// created in.
pub struct GlPipelineObject {
    gl: Arc<dyn GlFunctions>,
    context: GlContextHandle,
    handle: GlPipelineHandle,
}

impl GlPipelineObject {
    /// Creates a program pipeline in `context`.
    pub fn create(
        gl: &Arc<dyn GlFunctions>,
        context: GlContextHandle,
    ) -> Result<Self, super::GlError> {
        let handle = gl.create_program_pipeline(context)?;
        Ok(Self {
            gl: gl.clone(),
            context,
            handle,
        })
    }

    /// The native name.
    pub fn handle(&self) -> GlPipelineHandle {
        self.handle
    }

    /// The context the pipeline belongs to.
    pub fn context(&self) -> GlContextHandle {
        self.context
    }
}

impl Drop for GlPipelineObject {
    fn drop(&mut self) {
        self.gl.delete_program_pipeline(self.handle);
    }
}

impl fmt::Debug for GlPipelineObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlPipelineObject")
            .field("context", &self.context)
            .field("handle", &self.handle.0)
            .finish()
    }
}
