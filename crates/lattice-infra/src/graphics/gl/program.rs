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

//! Reflected program resources, classified against a pipeline resource layout.

use super::api::{GlActiveResource, GlResourceKind, ResourceDimension};
use lattice_core::graphics::api::{ResourceVariableType, ShaderStages};
use lattice_core::utils::{hash_combine, hash_value};

/// One reflected resource of a GL program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlResourceAttribs {
    /// Name without array subscript.
    pub name: String,
    /// Stages the resource is visible in.
    pub shader_stages: ShaderStages,
    /// Resource kind.
    pub kind: GlResourceKind,
    /// Texture or image dimension. Not part of the layout hash.
    pub dimension: ResourceDimension,
    /// Number of array elements.
    pub array_size: u32,
    /// Classification from the pipeline resource layout.
    pub variable_type: ResourceVariableType,
}

impl GlResourceAttribs {
    /// Hash of the fields that define the binding layout.
    pub fn layout_hash(&self) -> u64 {
        hash_value(&(
            self.name.as_str(),
            self.shader_stages,
            self.kind,
            self.array_size,
            self.variable_type,
        ))
    }

    /// Returns `true` if both resources occupy the same binding slot shape.
    /// Dimensions are ignored.
    pub fn is_compatible_with(&self, other: &GlResourceAttribs) -> bool {
        self.name == other.name
            && self.shader_stages == other.shader_stages
            && self.kind == other.kind
            && self.array_size == other.array_size
            && self.variable_type == other.variable_type
    }
}

/// The active resources of a linked program (or of one separable stage).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlProgramResources {
    shader_stages: ShaderStages,
    resources: Vec<GlResourceAttribs>,
}

impl GlProgramResources {
    /// Classifies reflected resources.
    ///
    /// ## Arguments
    ///
    /// * `active` - Resources reported by program introspection.
    /// * `shader_stages` - Stages the program covers.
    /// * `variable_type` - Resolves the variable type of a resource name for the
    ///   given stages, usually [`PipelineStateBase::variable_type`].
    ///
    /// [`PipelineStateBase::variable_type`]: lattice_core::graphics::PipelineStateBase::variable_type
    pub fn from_active<F>(
        active: &[GlActiveResource],
        shader_stages: ShaderStages,
        variable_type: F,
    ) -> Self
    where
        F: Fn(ShaderStages, &str) -> ResourceVariableType,
    {
        let resources = active
            .iter()
            .map(|res| GlResourceAttribs {
                name: res.name.clone(),
                shader_stages,
                kind: res.kind,
                dimension: res.dimension,
                array_size: res.array_size.max(1),
                variable_type: variable_type(shader_stages, &res.name),
            })
            .collect();
        Self {
            shader_stages,
            resources,
        }
    }

    /// Stages the program covers.
    pub fn shader_stages(&self) -> ShaderStages {
        self.shader_stages
    }

    /// All resources in reflection order.
    pub fn resources(&self) -> &[GlResourceAttribs] {
        &self.resources
    }

    /// Resources whose variable type is one of `types`.
    pub fn with_variable_types<'a>(
        &'a self,
        types: &'a [ResourceVariableType],
    ) -> impl Iterator<Item = &'a GlResourceAttribs> + 'a {
        self.resources
            .iter()
            .filter(move |res| types.contains(&res.variable_type))
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if the program uses no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Order-dependent hash of the binding layout.
    pub fn hash(&self) -> u64 {
        let mut seed = hash_value(&self.resources.len());
        for res in &self.resources {
            hash_combine(&mut seed, res.layout_hash());
        }
        seed
    }

    /// Pairwise compatibility of two resource lists.
    pub fn is_compatible_with(&self, other: &GlProgramResources) -> bool {
        self.resources.len() == other.resources.len()
            && self
                .resources
                .iter()
                .zip(&other.resources)
                .all(|(a, b)| a.is_compatible_with(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> Vec<GlActiveResource> {
        use GlResourceKind::{Sampler, UniformBuffer};
        vec![
            GlActiveResource::new("Constants", UniformBuffer, ResourceDimension::Undefined, 1),
            GlActiveResource::new("g_Albedo", Sampler, ResourceDimension::Tex2D, 1),
            GlActiveResource::new("g_Shadows", Sampler, ResourceDimension::Tex2DArray, 4),
        ]
    }

    fn mutable_albedo(_: ShaderStages, name: &str) -> ResourceVariableType {
        if name == "g_Albedo" {
            ResourceVariableType::Mutable
        } else {
            ResourceVariableType::Static
        }
    }

    #[test]
    fn test_classification_uses_layout() {
        let res = GlProgramResources::from_active(&active(), ShaderStages::PIXEL, mutable_albedo);
        assert_eq!(res.len(), 3);
        let statics: Vec<_> = res
            .with_variable_types(&[ResourceVariableType::Static])
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(statics, ["Constants", "g_Shadows"]);
        assert_eq!(res.resources()[2].array_size, 4);
    }

    #[test]
    fn test_hash_changes_with_variable_type() {
        let a = GlProgramResources::from_active(&active(), ShaderStages::PIXEL, |_, _| {
            ResourceVariableType::Static
        });
        let b = GlProgramResources::from_active(&active(), ShaderStages::PIXEL, mutable_albedo);
        assert_ne!(a.hash(), b.hash());
        assert!(!a.is_compatible_with(&b));
    }

    #[test]
    fn test_dimension_is_not_part_of_layout() {
        let mut other = active();
        other[1].dimension = ResourceDimension::Tex2DArray;
        let a = GlProgramResources::from_active(&active(), ShaderStages::PIXEL, mutable_albedo);
        let b = GlProgramResources::from_active(&other, ShaderStages::PIXEL, mutable_albedo);
        assert_eq!(a.hash(), b.hash());
        assert!(a.is_compatible_with(&b));
        assert_ne!(a, b);
    }
}
