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

//! Shader resource variables and the managers that group them.

use super::program::{GlProgramResources, GlResourceAttribs};
use lattice_core::graphics::api::{BindShaderResourcesFlags, ResourceVariableType, ShaderStages};
use lattice_core::graphics::traits::ShaderResourceVariable;
use lattice_core::graphics::{BoundResource, ResourceError, ResourceMapping};
use std::sync::Mutex;

fn update_flag(variable_type: ResourceVariableType) -> BindShaderResourcesFlags {
    match variable_type {
        ResourceVariableType::Static => BindShaderResourcesFlags::UPDATE_STATIC,
        ResourceVariableType::Mutable => BindShaderResourcesFlags::UPDATE_MUTABLE,
        ResourceVariableType::Dynamic => BindShaderResourcesFlags::UPDATE_DYNAMIC,
    }
}

/// One bindable program resource.
#[derive(Debug)]
pub struct GlShaderVariable {
    attribs: GlResourceAttribs,
    index: u32,
    bindings: Mutex<Vec<Option<BoundResource>>>,
}

impl GlShaderVariable {
    fn new(attribs: GlResourceAttribs, index: u32) -> Self {
        let bindings = vec![None; attribs.array_size as usize];
        Self {
            attribs,
            index,
            bindings: Mutex::new(bindings),
        }
    }

    /// Reflection data of the variable.
    pub fn attribs(&self) -> &GlResourceAttribs {
        &self.attribs
    }

    /// The resource bound to `array_index`, if any.
    pub fn bound_resource(&self, array_index: u32) -> Option<BoundResource> {
        let bindings = self.bindings.lock().unwrap_or_else(|e| e.into_inner());
        bindings.get(array_index as usize).cloned().flatten()
    }

    fn check_kind(&self, resource: &BoundResource) -> Result<(), ResourceError> {
        let wants_buffer = self.attribs.kind.binds_buffers();
        let is_buffer = matches!(resource, BoundResource::Buffer(_));
        if wants_buffer == is_buffer {
            Ok(())
        } else {
            Err(ResourceError::InvalidBinding {
                variable: self.attribs.name.clone(),
                expected: if wants_buffer { "buffer" } else { "texture" },
            })
        }
    }

    fn copy_bindings_from(&self, other: &GlShaderVariable) {
        let src = other.bindings.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let mut dst = self.bindings.lock().unwrap_or_else(|e| e.into_inner());
        for (slot, resource) in dst.iter_mut().zip(src) {
            *slot = resource;
        }
    }
}

impl ShaderResourceVariable for GlShaderVariable {
    fn name(&self) -> &str {
        &self.attribs.name
    }

    fn variable_type(&self) -> ResourceVariableType {
        self.attribs.variable_type
    }

    fn shader_stages(&self) -> ShaderStages {
        self.attribs.shader_stages
    }

    fn array_size(&self) -> u32 {
        self.attribs.array_size
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn set(&self, resource: BoundResource) -> Result<(), ResourceError> {
        self.set_array(std::slice::from_ref(&resource), 0)
    }

    fn set_array(
        &self,
        resources: &[BoundResource],
        first_element: u32,
    ) -> Result<(), ResourceError> {
        let first = first_element as usize;
        let end = first + resources.len();
        if end > self.attribs.array_size as usize {
            return Err(ResourceError::OutOfBounds);
        }
        for resource in resources {
            self.check_kind(resource)?;
        }
        let mut bindings = self.bindings.lock().unwrap_or_else(|e| e.into_inner());
        for (slot, resource) in bindings[first..end].iter_mut().zip(resources) {
            *slot = Some(resource.clone());
        }
        Ok(())
    }

    fn is_bound(&self, array_index: u32) -> bool {
        self.bound_resource(array_index).is_some()
    }
}

/// The variables of one program (or one separable stage) that have one of a
/// set of variable types.
#[derive(Debug)]
pub struct GlShaderVariableManager {
    shader_stages: ShaderStages,
    variables: Vec<GlShaderVariable>,
}

impl GlShaderVariableManager {
    /// Creates variables for the resources whose type is in `allowed_types`.
    pub fn new(resources: &GlProgramResources, allowed_types: &[ResourceVariableType]) -> Self {
        let variables = resources
            .with_variable_types(allowed_types)
            .enumerate()
            .map(|(index, attribs)| GlShaderVariable::new(attribs.clone(), index as u32))
            .collect();
        Self {
            shader_stages: resources.shader_stages(),
            variables,
        }
    }

    /// Stages the underlying program covers.
    pub fn shader_stages(&self) -> ShaderStages {
        self.shader_stages
    }

    /// Number of variables.
    pub fn variable_count(&self) -> u32 {
        self.variables.len() as u32
    }

    /// Looks a variable up by name.
    pub fn variable_by_name(&self, name: &str) -> Option<&GlShaderVariable> {
        self.variables.iter().find(|v| v.attribs.name == name)
    }

    /// Looks a variable up by index.
    pub fn variable_by_index(&self, index: u32) -> Option<&GlShaderVariable> {
        self.variables.get(index as usize)
    }

    /// All variables.
    pub fn variables(&self) -> &[GlShaderVariable] {
        &self.variables
    }

    /// Binds every variable selected by `flags` from `mapping`.
    ///
    /// Without any `UPDATE_*` flag all variable types are updated. Mismatched
    /// resource kinds are logged and skipped.
    pub fn bind_resources(&self, mapping: &ResourceMapping, flags: BindShaderResourcesFlags) {
        let mut flags = flags;
        if !flags.intersects(BindShaderResourcesFlags::UPDATE_ALL) {
            flags |= BindShaderResourcesFlags::UPDATE_ALL;
        }

        for var in &self.variables {
            if !flags.contains(update_flag(var.attribs.variable_type)) {
                continue;
            }
            for element in 0..var.attribs.array_size {
                if flags.contains(BindShaderResourcesFlags::KEEP_EXISTING) && var.is_bound(element)
                {
                    continue;
                }
                match mapping.resolve(&var.attribs.name, element) {
                    Some(resource) => {
                        if let Err(e) = var.set_array(std::slice::from_ref(resource), element) {
                            log::error!("Failed to bind '{}[{element}]': {e}", var.attribs.name);
                        }
                    }
                    None => {
                        if flags.contains(BindShaderResourcesFlags::VERIFY_ALL_RESOLVED)
                            && !var.is_bound(element)
                        {
                            log::error!(
                                "Unable to bind resource to shader variable '{}[{element}]': \
                                 resource is not found in the resource mapping",
                                var.attribs.name
                            );
                        }
                    }
                }
            }
        }
    }

    /// Copies bindings from the variables of `other` with matching names.
    pub fn copy_bindings_from(&self, other: &GlShaderVariableManager) {
        for dst in &self.variables {
            if let Some(src) = other.variable_by_name(&dst.attribs.name) {
                dst.copy_bindings_from(src);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::gl::api::{GlActiveResource, GlResourceKind, ResourceDimension};
    use crate::graphics::gl::resources::GlStagingBuffer;
    use lattice_core::graphics::api::{BufferDesc, CpuAccessFlags, Usage};
    use std::sync::Arc;

    fn resources() -> GlProgramResources {
        use GlResourceKind::{StorageBuffer, UniformBuffer};
        let active = [
            GlActiveResource::new("Constants", UniformBuffer, ResourceDimension::Undefined, 1),
            GlActiveResource::new("Lights", StorageBuffer, ResourceDimension::Undefined, 3),
        ];
        GlProgramResources::from_active(&active, ShaderStages::VERTEX, |_, name| {
            if name == "Lights" {
                ResourceVariableType::Mutable
            } else {
                ResourceVariableType::Static
            }
        })
    }

    fn buffer() -> BoundResource {
        let desc = BufferDesc {
            name: None,
            size: 16,
            usage: Usage::Staging,
            cpu_access: CpuAccessFlags::WRITE,
        };
        BoundResource::Buffer(Arc::new(GlStagingBuffer::new(desc).unwrap()))
    }

    #[test]
    fn test_manager_filters_by_type() {
        let statics = GlShaderVariableManager::new(&resources(), &[ResourceVariableType::Static]);
        assert_eq!(statics.variable_count(), 1);
        assert!(statics.variable_by_name("Lights").is_none());
        let var = statics.variable_by_index(0).unwrap();
        assert_eq!(var.name(), "Constants");
        assert_eq!(var.index(), 0);
    }

    #[test]
    fn test_bind_respects_update_flags() {
        let all = GlShaderVariableManager::new(&resources(), &ResourceVariableType::ALL);
        let mapping = ResourceMapping::new()
            .with("Constants", buffer())
            .with("Lights[1]", buffer());

        all.bind_resources(&mapping, BindShaderResourcesFlags::UPDATE_MUTABLE);
        assert!(!all.variable_by_name("Constants").unwrap().is_bound(0));
        let lights = all.variable_by_name("Lights").unwrap();
        assert!(!lights.is_bound(0));
        assert!(lights.is_bound(1));

        all.bind_resources(&mapping, BindShaderResourcesFlags::EMPTY);
        assert!(all.variable_by_name("Constants").unwrap().is_bound(0));
    }

    #[test]
    fn test_keep_existing_does_not_overwrite() {
        let all = GlShaderVariableManager::new(&resources(), &ResourceVariableType::ALL);
        let first = buffer();
        all.variable_by_name("Constants").unwrap().set(first.clone()).unwrap();

        let mapping = ResourceMapping::new().with("Constants", buffer());
        all.bind_resources(
            &mapping,
            BindShaderResourcesFlags::UPDATE_ALL | BindShaderResourcesFlags::KEEP_EXISTING,
        );
        let bound = all.variable_by_name("Constants").unwrap().bound_resource(0).unwrap();
        assert!(bound.ptr_eq(&first));
    }

    #[test]
    fn test_set_array_bounds_and_kind() {
        let all = GlShaderVariableManager::new(&resources(), &ResourceVariableType::ALL);
        let lights = all.variable_by_name("Lights").unwrap();
        assert!(matches!(
            lights.set_array(&[buffer(), buffer()], 2),
            Err(ResourceError::OutOfBounds)
        ));
        lights.set_array(&[buffer(), buffer()], 1).unwrap();
        assert!(lights.is_bound(2));
    }

    #[test]
    fn test_copy_bindings_by_name() {
        let src = GlShaderVariableManager::new(&resources(), &[ResourceVariableType::Static]);
        let dst = GlShaderVariableManager::new(&resources(), &ResourceVariableType::ALL);
        let constants = buffer();
        src.variable_by_name("Constants").unwrap().set(constants.clone()).unwrap();

        dst.copy_bindings_from(&src);
        let copied = dst.variable_by_name("Constants").unwrap().bound_resource(0).unwrap();
        assert!(copied.ptr_eq(&constants));
        assert!(!dst.variable_by_name("Lights").unwrap().is_bound(0));
    }
}
