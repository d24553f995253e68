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

//! Buffer and texture descriptors, and the data types exchanged with a
//! device context when mapping and updating resources.

use super::flags::CpuAccessFlags;
use super::format::TextureFormat;
use crate::graphics::traits::Buffer;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::{Arc, Mutex, MutexGuard};

/// Intended usage of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Usage {
    /// GPU read/write.
    #[default]
    Default,
    /// Initialized once, never written again.
    Immutable,
    /// Written by the CPU frequently.
    Dynamic,
    /// CPU-visible memory used to transfer data to or from the GPU.
    Staging,
}

/// Describes a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferDesc<'a> {
    /// An optional debug name.
    pub name: Option<Cow<'a, str>>,
    /// Size in bytes.
    pub size: u64,
    /// Intended usage.
    pub usage: Usage,
    /// Allowed CPU access.
    pub cpu_access: CpuAccessFlags,
}

/// How a mapped buffer will be accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapType {
    /// Read only.
    Read,
    /// Write only.
    Write,
    /// Read and write.
    ReadWrite,
}

/// Texture dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureDimension {
    /// 1D texture.
    Tex1D,
    /// Array of 1D textures.
    Tex1DArray,
    /// 2D texture.
    #[default]
    Tex2D,
    /// Array of 2D textures.
    Tex2DArray,
    /// 3D texture.
    Tex3D,
    /// Cube map.
    Cube,
    /// Array of cube maps.
    CubeArray,
}

/// Describes a texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureDesc<'a> {
    /// An optional debug name.
    pub name: Option<Cow<'a, str>>,
    /// Dimensionality.
    pub dimension: TextureDimension,
    /// Width of mip 0.
    pub width: u32,
    /// Height of mip 0.
    pub height: u32,
    /// Depth of mip 0 for 3D textures, array size otherwise.
    pub depth_or_array_size: u32,
    /// Number of mip levels.
    pub mip_levels: u32,
    /// Texel format.
    pub format: TextureFormat,
}

/// Size of one mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MipLevelProperties {
    /// Width in texels.
    pub logical_width: u32,
    /// Height in texels.
    pub logical_height: u32,
    /// Depth in texels (1 for non-3D textures).
    pub depth: u32,
}

impl TextureDesc<'_> {
    /// Logical size of `mip`. Dimensions never go below one texel.
    pub fn mip_level_properties(&self, mip: u32) -> MipLevelProperties {
        let depth = if self.dimension == TextureDimension::Tex3D {
            mip_extent(self.depth_or_array_size, mip)
        } else {
            1
        };
        MipLevelProperties {
            logical_width: mip_extent(self.width, mip),
            logical_height: mip_extent(self.height, mip),
            depth,
        }
    }
}

/// Extent of a dimension at `mip`, never below one texel.
pub(crate) fn mip_extent(extent: u32, mip: u32) -> u32 {
    extent.checked_shr(mip).unwrap_or(0).max(1)
}

/// An axis-aligned region of a texture subresource. Max bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureRegion {
    /// Minimum X.
    pub min_x: u32,
    /// Maximum X.
    pub max_x: u32,
    /// Minimum Y.
    pub min_y: u32,
    /// Maximum Y.
    pub max_y: u32,
    /// Minimum Z.
    pub min_z: u32,
    /// Maximum Z.
    pub max_z: u32,
}

impl TextureRegion {
    /// A region covering `width` x `height` texels of a single depth slice.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            max_x: width,
            max_y: height,
            max_z: 1,
            ..Self::default()
        }
    }
}

/// Source of a texture update: a range of a buffer.
#[derive(Debug, Clone)]
pub struct TextureSubresourceData {
    /// Buffer holding the texels.
    pub source: Arc<dyn Buffer>,
    /// Offset of the first row in `source`.
    pub source_offset: u64,
    /// Distance in bytes between two rows.
    pub stride: u32,
    /// Distance in bytes between two depth slices.
    pub depth_stride: u32,
}

/// CPU-visible memory returned by a buffer map.
///
/// Cloning shares the same bytes. Backends that keep staging data on the host
/// hand out the buffer's own storage, and read it back at copy time.
#[derive(Debug, Clone, Default)]
pub struct MappedMemory {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MappedMemory {
    /// Allocates `size` zeroed bytes.
    pub fn zeroed(size: usize) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(vec![0u8; size])),
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no memory is mapped.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks the bytes for reading or writing.
    pub fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns `true` if both handles refer to the same memory.
    pub fn ptr_eq(&self, other: &MappedMemory) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_properties_clamp_to_one() {
        let desc = TextureDesc {
            name: None,
            dimension: TextureDimension::Tex2DArray,
            width: 256,
            height: 64,
            depth_or_array_size: 6,
            mip_levels: 9,
            format: TextureFormat::Rgba8Unorm,
        };
        let mip3 = desc.mip_level_properties(3);
        assert_eq!((mip3.logical_width, mip3.logical_height, mip3.depth), (32, 8, 1));
        let mip8 = desc.mip_level_properties(8);
        assert_eq!((mip8.logical_width, mip8.logical_height), (1, 1));
        let beyond = desc.mip_level_properties(40);
        assert_eq!((beyond.logical_width, beyond.logical_height), (1, 1));
    }

    #[test]
    fn test_mapped_memory_clones_share_bytes() {
        let memory = MappedMemory::zeroed(8);
        let alias = memory.clone();
        alias.lock()[3] = 7;
        assert_eq!(memory.lock()[3], 7);
        assert!(memory.ptr_eq(&alias));
        assert!(!memory.ptr_eq(&MappedMemory::zeroed(8)));
    }
}
