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

//! Sampler descriptors and static sampler bindings.

use super::flags::ShaderStages;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest texel.
    Point,
    /// Linear interpolation.
    #[default]
    Linear,
    /// Anisotropic filtering.
    Anisotropic,
}

/// Handling of texture coordinates outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureAddressMode {
    /// Wrap around.
    #[default]
    Wrap,
    /// Mirror at every integer boundary.
    Mirror,
    /// Clamp to the edge texel.
    Clamp,
    /// Use the sampler border color.
    Border,
}

/// Comparison function for comparison samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComparisonFunction {
    /// Never passes.
    #[default]
    Never,
    /// Passes if the source is less than the destination.
    Less,
    /// Passes if equal.
    Equal,
    /// Passes if less or equal.
    LessEqual,
    /// Passes if greater.
    Greater,
    /// Passes if not equal.
    NotEqual,
    /// Passes if greater or equal.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// Describes a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerDesc {
    /// Minification filter.
    pub min_filter: FilterType,
    /// Magnification filter.
    pub mag_filter: FilterType,
    /// Mip filter.
    pub mip_filter: FilterType,
    /// U addressing.
    pub address_u: TextureAddressMode,
    /// V addressing.
    pub address_v: TextureAddressMode,
    /// W addressing.
    pub address_w: TextureAddressMode,
    /// Offset added to the computed mip level.
    pub mip_lod_bias: f32,
    /// Maximum anisotropy for [`FilterType::Anisotropic`].
    pub max_anisotropy: u32,
    /// Comparison function.
    pub comparison_func: ComparisonFunction,
    /// Border color used by [`TextureAddressMode::Border`].
    pub border_color: [f32; 4],
    /// Lowest accessible mip level.
    pub min_lod: f32,
    /// Highest accessible mip level.
    pub max_lod: f32,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            min_filter: FilterType::Linear,
            mag_filter: FilterType::Linear,
            mip_filter: FilterType::Linear,
            address_u: TextureAddressMode::Clamp,
            address_v: TextureAddressMode::Clamp,
            address_w: TextureAddressMode::Clamp,
            mip_lod_bias: 0.0,
            max_anisotropy: 0,
            comparison_func: ComparisonFunction::Never,
            border_color: [0.0; 4],
            min_lod: 0.0,
            max_lod: f32::MAX,
        }
    }
}

/// Border colors every backend can express in a static sampler.
pub const PORTABLE_BORDER_COLORS: [[f32; 4]; 3] = [
    [0.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
    [1.0, 1.0, 1.0, 1.0],
];

impl SamplerDesc {
    /// Returns `true` if the border color is transparent black, opaque black
    /// or opaque white.
    pub fn has_portable_border_color(&self) -> bool {
        PORTABLE_BORDER_COLORS.contains(&self.border_color)
    }
}

/// Binds an immutable sampler to a texture or sampler variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSamplerDesc<'a> {
    /// Stages the binding applies to.
    pub shader_stages: ShaderStages,
    /// Name of the texture or sampler variable.
    pub sampler_or_texture_name: Cow<'a, str>,
    /// The sampler.
    pub desc: SamplerDesc,
}
