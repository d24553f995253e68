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

//! Texture formats and their memory layout attributes.

use super::enums::ComponentType;
use serde::{Deserialize, Serialize};

/// The memory format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    /// No format. Used for unused render-target slots.
    #[default]
    Unknown,
    /// One 8-bit normalized channel.
    R8Unorm,
    /// Two 8-bit normalized channels.
    Rg8Unorm,
    /// Four 8-bit normalized channels.
    Rgba8Unorm,
    /// Four 8-bit normalized channels in sRGB space.
    Rgba8UnormSrgb,
    /// Four 8-bit normalized channels, BGRA order.
    Bgra8Unorm,
    /// One 16-bit float channel.
    R16Float,
    /// Four 16-bit float channels.
    Rgba16Float,
    /// One 32-bit float channel.
    R32Float,
    /// Two 32-bit float channels.
    Rg32Float,
    /// Four 32-bit float channels.
    Rgba32Float,
    /// One 32-bit unsigned integer channel.
    R32Uint,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24UnormStencil8,
    /// BC1 block compression (8 bytes per 4x4 block).
    Bc1Unorm,
    /// BC3 block compression (16 bytes per 4x4 block).
    Bc3Unorm,
    /// BC7 block compression (16 bytes per 4x4 block).
    Bc7Unorm,
}

/// Memory layout attributes of a [`TextureFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureFormatAttribs {
    /// Human-readable name.
    pub name: &'static str,
    /// Size of one component in bytes. For compressed formats, the block size.
    pub component_size: u8,
    /// Number of components. `1` for compressed formats.
    pub num_components: u8,
    /// Component storage.
    pub component_type: ComponentType,
    /// Block width in texels. `1` for uncompressed formats.
    pub block_width: u8,
    /// Block height in texels. `1` for uncompressed formats.
    pub block_height: u8,
}

impl TextureFormatAttribs {
    const fn new(
        name: &'static str,
        component_size: u8,
        num_components: u8,
        component_type: ComponentType,
    ) -> Self {
        Self {
            name,
            component_size,
            num_components,
            component_type,
            block_width: 1,
            block_height: 1,
        }
    }

    const fn compressed(name: &'static str, block_size: u8) -> Self {
        Self {
            name,
            component_size: block_size,
            num_components: 1,
            component_type: ComponentType::Compressed,
            block_width: 4,
            block_height: 4,
        }
    }

    /// Size in bytes of one texel, or one block for compressed formats.
    pub const fn element_size(&self) -> u32 {
        self.component_size as u32 * self.num_components as u32
    }

    /// Returns `true` for block-compressed formats.
    pub const fn is_compressed(&self) -> bool {
        matches!(self.component_type, ComponentType::Compressed)
    }
}

impl TextureFormat {
    /// Returns the layout attributes of this format.
    pub const fn attribs(self) -> TextureFormatAttribs {
        use ComponentType as C;
        match self {
            TextureFormat::Unknown => TextureFormatAttribs::new("Unknown", 0, 0, C::Undefined),
            TextureFormat::R8Unorm => TextureFormatAttribs::new("R8Unorm", 1, 1, C::Unorm),
            TextureFormat::Rg8Unorm => TextureFormatAttribs::new("Rg8Unorm", 1, 2, C::Unorm),
            TextureFormat::Rgba8Unorm => TextureFormatAttribs::new("Rgba8Unorm", 1, 4, C::Unorm),
            TextureFormat::Rgba8UnormSrgb => {
                TextureFormatAttribs::new("Rgba8UnormSrgb", 1, 4, C::UnormSrgb)
            }
            TextureFormat::Bgra8Unorm => TextureFormatAttribs::new("Bgra8Unorm", 1, 4, C::Unorm),
            TextureFormat::R16Float => TextureFormatAttribs::new("R16Float", 2, 1, C::Float),
            TextureFormat::Rgba16Float => TextureFormatAttribs::new("Rgba16Float", 2, 4, C::Float),
            TextureFormat::R32Float => TextureFormatAttribs::new("R32Float", 4, 1, C::Float),
            TextureFormat::Rg32Float => TextureFormatAttribs::new("Rg32Float", 4, 2, C::Float),
            TextureFormat::Rgba32Float => TextureFormatAttribs::new("Rgba32Float", 4, 4, C::Float),
            TextureFormat::R32Uint => TextureFormatAttribs::new("R32Uint", 4, 1, C::Uint),
            TextureFormat::Depth32Float => {
                TextureFormatAttribs::new("Depth32Float", 4, 1, C::Depth)
            }
            TextureFormat::Depth24UnormStencil8 => {
                TextureFormatAttribs::new("Depth24UnormStencil8", 4, 1, C::DepthStencil)
            }
            TextureFormat::Bc1Unorm => TextureFormatAttribs::compressed("Bc1Unorm", 8),
            TextureFormat::Bc3Unorm => TextureFormatAttribs::compressed("Bc3Unorm", 16),
            TextureFormat::Bc7Unorm => TextureFormatAttribs::compressed("Bc7Unorm", 16),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_sizes() {
        assert_eq!(TextureFormat::Rgba8Unorm.attribs().element_size(), 4);
        assert_eq!(TextureFormat::Rgba32Float.attribs().element_size(), 16);
        assert_eq!(TextureFormat::Bc1Unorm.attribs().element_size(), 8);
        assert!(TextureFormat::Bc7Unorm.attribs().is_compressed());
        assert!(!TextureFormat::R16Float.attribs().is_compressed());
    }
}
