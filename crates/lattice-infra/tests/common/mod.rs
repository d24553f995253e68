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

//! Shared fixtures for the backend integration tests.

#![allow(dead_code)]

use lattice_core::graphics::api::{
    ShaderCreateInfo, ShaderDesc, ShaderStages, ShaderType, TextureRegion,
};
use lattice_core::graphics::traits::RenderDevice;
use lattice_infra::graphics::gl::{
    GlActiveResource, GlContextHandle, GlDeviceCaps, GlDeviceSettings, GlError, GlFunctions,
    GlPipelineHandle, GlProgramHandle, GlRenderDevice, GlResourceKind, GlShader, GlShaderHandle,
    GlTextureHandle, ResourceDimension,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Installs the test logger once per process.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A native call observed by [`MockGl`].
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader(ShaderType, u32),
    CompileShader(u32, String),
    DeleteShader(u32),
    CreateProgram(u32),
    SetSeparable(u32),
    Attach { program: u32, shader: u32 },
    Detach { program: u32, shader: u32 },
    Link(u32),
    DeleteProgram(u32),
    CreatePipeline { context: usize, pipeline: u32 },
    UseProgramStages { pipeline: u32, stages: ShaderStages, program: u32 },
    DeletePipeline(u32),
    TexSubImage {
        texture: u32,
        mip_level: u32,
        slice: u32,
        region: TextureRegion,
        row_stride: u32,
        data: Vec<u8>,
    },
}

/// A recording GL implementation.
///
/// Reflection returns, for every program, the resources registered for the
/// stages of the shaders linked into it.
#[derive(Default)]
pub struct MockGl {
    next_name: AtomicU32,
    calls: Mutex<Vec<GlCall>>,
    shader_types: Mutex<HashMap<u32, ShaderType>>,
    attached: Mutex<HashMap<u32, Vec<u32>>>,
    linked: Mutex<HashMap<u32, Vec<u32>>>,
    separable: Mutex<HashSet<u32>>,
    stage_resources: Mutex<HashMap<ShaderType, Vec<GlActiveResource>>>,
    fail_link: AtomicBool,
    fail_compile: AtomicBool,
}

impl MockGl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_name: AtomicU32::new(1),
            ..Self::default()
        })
    }

    /// Resources reported for programs containing a `stage` shader.
    pub fn set_stage_resources(&self, stage: ShaderType, resources: Vec<GlActiveResource>) {
        self.stage_resources
            .lock()
            .unwrap()
            .insert(stage, resources);
    }

    /// Makes non-separable links fail.
    pub fn fail_links(&self, fail: bool) {
        self.fail_link.store(fail, Ordering::SeqCst);
    }

    /// Makes every compilation fail.
    pub fn fail_compiles(&self, fail: bool) {
        self.fail_compile.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: GlCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next(&self) -> u32 {
        self.next_name.fetch_add(1, Ordering::SeqCst)
    }
}

impl GlFunctions for MockGl {
    fn create_shader(&self, shader_type: ShaderType) -> Result<GlShaderHandle, GlError> {
        let name = self.next();
        self.shader_types.lock().unwrap().insert(name, shader_type);
        self.record(GlCall::CreateShader(shader_type, name));
        Ok(GlShaderHandle(name))
    }

    fn compile_shader(&self, shader: GlShaderHandle, source: &str) -> bool {
        self.record(GlCall::CompileShader(shader.0, source.to_string()));
        !self.fail_compile.load(Ordering::SeqCst)
    }

    fn shader_info_log(&self, shader: GlShaderHandle) -> String {
        format!("0:1: error in shader {}", shader.0)
    }

    fn delete_shader(&self, shader: GlShaderHandle) {
        self.record(GlCall::DeleteShader(shader.0));
    }

    fn create_program(&self) -> Result<GlProgramHandle, GlError> {
        let name = self.next();
        self.record(GlCall::CreateProgram(name));
        Ok(GlProgramHandle(name))
    }

    fn set_program_separable(&self, program: GlProgramHandle, separable: bool) {
        if separable {
            self.separable.lock().unwrap().insert(program.0);
            self.record(GlCall::SetSeparable(program.0));
        }
    }

    fn attach_shader(&self, program: GlProgramHandle, shader: GlShaderHandle) {
        self.attached
            .lock()
            .unwrap()
            .entry(program.0)
            .or_default()
            .push(shader.0);
        self.record(GlCall::Attach {
            program: program.0,
            shader: shader.0,
        });
    }

    fn detach_shader(&self, program: GlProgramHandle, shader: GlShaderHandle) {
        if let Some(shaders) = self.attached.lock().unwrap().get_mut(&program.0) {
            shaders.retain(|s| *s != shader.0);
        }
        self.record(GlCall::Detach {
            program: program.0,
            shader: shader.0,
        });
    }

    fn link_program(&self, program: GlProgramHandle) {
        let shaders = self
            .attached
            .lock()
            .unwrap()
            .get(&program.0)
            .cloned()
            .unwrap_or_default();
        self.linked.lock().unwrap().insert(program.0, shaders);
        self.record(GlCall::Link(program.0));
    }

    fn link_status(&self, program: GlProgramHandle) -> bool {
        let separable = self.separable.lock().unwrap().contains(&program.0);
        separable || !self.fail_link.load(Ordering::SeqCst)
    }

    fn program_info_log(&self, program: GlProgramHandle) -> String {
        format!("error: program {} has unresolved symbols", program.0)
    }

    fn delete_program(&self, program: GlProgramHandle) {
        self.record(GlCall::DeleteProgram(program.0));
    }

    fn active_resources(&self, program: GlProgramHandle) -> Vec<GlActiveResource> {
        let shaders = self
            .linked
            .lock()
            .unwrap()
            .get(&program.0)
            .cloned()
            .unwrap_or_default();
        let shader_types = self.shader_types.lock().unwrap();
        let stage_resources = self.stage_resources.lock().unwrap();
        let mut resources: Vec<GlActiveResource> = Vec::new();
        for shader in shaders {
            let Some(stage) = shader_types.get(&shader) else {
                continue;
            };
            for res in stage_resources.get(stage).into_iter().flatten() {
                if !resources.iter().any(|r| r.name == res.name) {
                    resources.push(res.clone());
                }
            }
        }
        resources
    }

    fn create_program_pipeline(
        &self,
        context: GlContextHandle,
    ) -> Result<GlPipelineHandle, GlError> {
        let name = self.next();
        self.record(GlCall::CreatePipeline {
            context: context.0,
            pipeline: name,
        });
        Ok(GlPipelineHandle(name))
    }

    fn use_program_stages(
        &self,
        pipeline: GlPipelineHandle,
        stages: ShaderStages,
        program: GlProgramHandle,
    ) {
        self.record(GlCall::UseProgramStages {
            pipeline: pipeline.0,
            stages,
            program: program.0,
        });
    }

    fn delete_program_pipeline(&self, pipeline: GlPipelineHandle) {
        self.record(GlCall::DeletePipeline(pipeline.0));
    }

    fn texture_sub_image(
        &self,
        texture: GlTextureHandle,
        mip_level: u32,
        slice: u32,
        region: &TextureRegion,
        row_stride: u32,
        data: &[u8],
    ) -> Result<(), GlError> {
        self.record(GlCall::TexSubImage {
            texture: texture.0,
            mip_level,
            slice,
            region: *region,
            row_stride,
            data: data.to_vec(),
        });
        Ok(())
    }
}

/// Creates a device on top of `gl`.
pub fn make_device(gl: &Arc<MockGl>, separable_programs: bool) -> Arc<GlRenderDevice> {
    make_device_with(gl, separable_programs, GlDeviceSettings::default())
}

pub fn make_device_with(
    gl: &Arc<MockGl>,
    separable_programs: bool,
    settings: GlDeviceSettings,
) -> Arc<GlRenderDevice> {
    let caps = GlDeviceCaps {
        separable_programs,
        ..GlDeviceCaps::default()
    };
    let functions: Arc<dyn GlFunctions> = gl.clone();
    GlRenderDevice::new(functions, caps, settings)
}

/// Compiles a trivial shader for `stage`.
pub fn shader(device: &GlRenderDevice, stage: ShaderType, name: &str) -> Arc<GlShader> {
    let info = ShaderCreateInfo::from_code(
        ShaderDesc::new(stage).with_name(name.to_string()),
        "void main() {}",
    );
    device
        .create_shader(&info)
        .expect("Shader creation should succeed")
}

pub fn uniform_buffer(name: &str) -> GlActiveResource {
    GlActiveResource::new(name, GlResourceKind::UniformBuffer, ResourceDimension::Undefined, 1)
}

pub fn sampler(name: &str, dimension: ResourceDimension) -> GlActiveResource {
    GlActiveResource::new(name, GlResourceKind::Sampler, dimension, 1)
}
