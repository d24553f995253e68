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

//! Common enumerations shared by the descriptor types.

use super::flags::ShaderStages;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderType {
    /// Vertex shader.
    Vertex,
    /// Pixel (fragment) shader.
    Pixel,
    /// Geometry shader.
    Geometry,
    /// Hull (tessellation control) shader.
    Hull,
    /// Domain (tessellation evaluation) shader.
    Domain,
    /// Compute shader.
    Compute,
}

impl ShaderType {
    /// Number of shader types.
    pub const COUNT: usize = 6;

    /// All shader types, in stage-index order.
    pub const ALL: [ShaderType; Self::COUNT] = [
        ShaderType::Vertex,
        ShaderType::Pixel,
        ShaderType::Geometry,
        ShaderType::Hull,
        ShaderType::Domain,
        ShaderType::Compute,
    ];

    /// Dense index of this shader type, in `0..COUNT`.
    pub const fn index(self) -> usize {
        match self {
            ShaderType::Vertex => 0,
            ShaderType::Pixel => 1,
            ShaderType::Geometry => 2,
            ShaderType::Hull => 3,
            ShaderType::Domain => 4,
            ShaderType::Compute => 5,
        }
    }

    /// The single-stage flag set for this type.
    pub const fn stage(self) -> ShaderStages {
        match self {
            ShaderType::Vertex => ShaderStages::VERTEX,
            ShaderType::Pixel => ShaderStages::PIXEL,
            ShaderType::Geometry => ShaderStages::GEOMETRY,
            ShaderType::Hull => ShaderStages::HULL,
            ShaderType::Domain => ShaderStages::DOMAIN,
            ShaderType::Compute => ShaderStages::COMPUTE,
        }
    }
}

impl fmt::Display for ShaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderType::Vertex => "vertex",
            ShaderType::Pixel => "pixel",
            ShaderType::Geometry => "geometry",
            ShaderType::Hull => "hull",
            ShaderType::Domain => "domain",
            ShaderType::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// The scalar type of a vertex component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueType {
    /// Undefined type. Has a size of zero.
    #[default]
    Undefined,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Half-precision float.
    Float16,
    /// Single-precision float.
    Float32,
}

impl ValueType {
    /// Size of one component in bytes.
    pub const fn size(self) -> u32 {
        match self {
            ValueType::Undefined => 0,
            ValueType::Int8 | ValueType::Uint8 => 1,
            ValueType::Int16 | ValueType::Uint16 | ValueType::Float16 => 2,
            ValueType::Int32 | ValueType::Uint32 | ValueType::Float32 => 4,
        }
    }

    /// Returns `true` for floating-point types, which are never normalized.
    pub const fn is_float(self) -> bool {
        matches!(self, ValueType::Float16 | ValueType::Float32)
    }
}

/// How often a shader resource variable is expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceVariableType {
    /// Bound once on the pipeline state, shared by all bindings.
    #[default]
    Static,
    /// Bound once per shader resource binding object.
    Mutable,
    /// May be rebound at any time.
    Dynamic,
}

impl ResourceVariableType {
    /// All variable types.
    pub const ALL: [ResourceVariableType; 3] = [
        ResourceVariableType::Static,
        ResourceVariableType::Mutable,
        ResourceVariableType::Dynamic,
    ];
}

/// How primitives are assembled from vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrimitiveTopology {
    /// Unspecified topology.
    #[default]
    Undefined,
    /// Every three vertices form a triangle.
    TriangleList,
    /// Triangle strip.
    TriangleStrip,
    /// Independent points.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Line strip.
    LineStrip,
}

/// Advance rate of a vertex input element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InputElementFrequency {
    /// Advanced once per vertex.
    #[default]
    PerVertex,
    /// Advanced once every `instance_data_step_rate` instances.
    PerInstance,
}

/// Describes the kind of storage of a texture format's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    /// No format.
    Undefined,
    /// Floating point.
    Float,
    /// Normalized signed integer.
    Snorm,
    /// Normalized unsigned integer.
    Unorm,
    /// Normalized unsigned integer in sRGB space.
    UnormSrgb,
    /// Signed integer.
    Sint,
    /// Unsigned integer.
    Uint,
    /// Depth.
    Depth,
    /// Depth and stencil.
    DepthStencil,
    /// Block-compressed.
    Compressed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_type_index_matches_all_order() {
        for (i, ty) in ShaderType::ALL.iter().enumerate() {
            assert_eq!(ty.index(), i);
        }
    }

    #[test]
    fn test_value_type_sizes() {
        assert_eq!(ValueType::Float32.size(), 4);
        assert_eq!(ValueType::Float16.size(), 2);
        assert_eq!(ValueType::Uint8.size(), 1);
        assert_eq!(ValueType::Undefined.size(), 0);
        assert!(ValueType::Float16.is_float());
        assert!(!ValueType::Int32.is_float());
    }
}
