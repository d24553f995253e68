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

//! Types shared by texture upload engines.
//!
//! An upload engine hands CPU-writable staging memory to worker threads and
//! later copies it into textures on the render thread. Each [`UploadBuffer`]
//! moves through [`UploadBufferState`]:
//!
//! `Idle -> MapRequested -> Mapped -> CopyRequested -> CopyScheduled -> Idle`
//!
//! and returns to a cache keyed by its [`UploadBufferDesc`] once recycled.

use crate::graphics::api::resource::mip_extent;
use crate::graphics::api::TextureFormat;
use crate::graphics::error::UploadError;
use crate::graphics::traits::{DeviceContext, Texture};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shape of the texture data an upload buffer holds. Used as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadBufferDesc {
    /// Width of mip 0.
    pub width: u32,
    /// Height of mip 0.
    pub height: u32,
    /// Depth of mip 0.
    pub depth: u32,
    /// Number of mip levels.
    pub mip_levels: u32,
    /// Number of array slices.
    pub array_size: u32,
    /// Texel format.
    pub format: TextureFormat,
}

impl Default for UploadBufferDesc {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            depth: 1,
            mip_levels: 1,
            array_size: 1,
            format: TextureFormat::Unknown,
        }
    }
}

impl UploadBufferDesc {
    /// Number of (mip, slice) subresources.
    pub fn num_subresources(&self) -> usize {
        (self.mip_levels * self.array_size) as usize
    }

    /// Linear index of a subresource, slices outermost.
    pub fn subresource_index(&self, mip: u32, slice: u32) -> Option<usize> {
        (mip < self.mip_levels && slice < self.array_size)
            .then(|| (self.mip_levels * slice + mip) as usize)
    }
}

/// Where one subresource lives in a mapped upload buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MappedTextureSubresource {
    /// Byte offset in the mapped memory.
    pub offset: u64,
    /// Size in bytes.
    pub size: u64,
    /// Distance in bytes between two rows (of blocks, for compressed formats).
    pub stride: u32,
    /// Distance in bytes between two depth slices.
    pub depth_stride: u32,
}

/// Tightly packed linear layout of every subresource of an upload buffer.
///
/// Subresources are laid out slice by slice, and mip by mip within a slice.
/// A mip of a volume holds all of its depth slices back to back.
/// Block-compressed mips are rounded up to whole blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBufferLayout {
    offsets: Vec<u64>,
    strides: Vec<u32>,
    depth_strides: Vec<u32>,
}

impl UploadBufferLayout {
    /// Computes the layout for `desc`.
    pub fn new(desc: &UploadBufferDesc) -> Self {
        let attribs = desc.format.attribs();
        let block_width = u32::from(attribs.block_width.max(1));
        let block_height = u32::from(attribs.block_height.max(1));

        let mut offsets = Vec::with_capacity(desc.num_subresources() + 1);
        let mut strides = Vec::with_capacity(desc.num_subresources());
        let mut depth_strides = Vec::with_capacity(desc.num_subresources());
        offsets.push(0u64);
        for _slice in 0..desc.array_size {
            for mip in 0..desc.mip_levels {
                let mut mip_width = mip_extent(desc.width, mip);
                let mut mip_height = mip_extent(desc.height, mip);
                let mip_depth = mip_extent(desc.depth, mip);
                if attribs.is_compressed() {
                    mip_width = mip_width.next_multiple_of(block_width);
                    mip_height = mip_height.next_multiple_of(block_height);
                }
                let row_stride = mip_width / block_width * attribs.element_size();
                let depth_stride = mip_height / block_height * row_stride;
                let mip_size = u64::from(depth_stride) * u64::from(mip_depth);
                let last = offsets.last().copied().unwrap_or(0);
                offsets.push(last + mip_size);
                strides.push(row_stride);
                depth_strides.push(depth_stride);
            }
        }
        Self {
            offsets,
            strides,
            depth_strides,
        }
    }

    /// Total size in bytes.
    pub fn total_size(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Mapped record of subresource `index`.
    pub fn subresource(&self, index: usize) -> MappedTextureSubresource {
        MappedTextureSubresource {
            offset: self.offsets[index],
            size: self.offsets[index + 1] - self.offsets[index],
            stride: self.strides[index],
            depth_stride: self.depth_strides[index],
        }
    }
}

/// Lifecycle state of an upload buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UploadBufferState {
    /// In the cache or freshly created.
    #[default]
    Idle,
    /// Waiting for the render thread to map it.
    MapRequested,
    /// Mapped and writable.
    Mapped,
    /// Waiting for the render thread to copy it.
    CopyRequested,
    /// The copy has been submitted to the GPU.
    CopyScheduled,
}

/// Diagnostics of a texture uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureUploaderStats {
    /// Operations queued and not yet picked up by the render thread.
    pub num_pending_operations: u32,
}

/// CPU-writable staging memory for one texture upload.
pub trait UploadBuffer: Send + Sync {
    /// The buffer shape.
    fn desc(&self) -> &UploadBufferDesc;

    /// Current lifecycle state.
    fn state(&self) -> UploadBufferState;

    /// Mapped record of a subresource. Default when not mapped.
    fn mapped_data(&self, mip: u32, slice: u32) -> MappedTextureSubresource;

    /// Returns `true` if the subresource is mapped.
    fn is_mapped(&self, mip: u32, slice: u32) -> bool;

    /// Copies `data` to the start of a subresource.
    fn write_subresource(&self, mip: u32, slice: u32, data: &[u8]) -> Result<(), UploadError>;

    /// Blocks until the GPU copy of this buffer has been scheduled.
    fn wait_for_copy_scheduled(&self);
}

/// Moves texture data from worker threads to the GPU.
///
/// Only the render thread may call [`render_thread_update`](Self::render_thread_update);
/// every other method is callable from any thread.
pub trait TextureUploader: Send + Sync {
    /// The engine's upload buffer type.
    type Buffer: UploadBuffer;

    /// Returns a mapped buffer for `desc`, reusing a cached one when possible.
    ///
    /// Blocks until the render thread has mapped the buffer.
    fn allocate_upload_buffer(&self, desc: &UploadBufferDesc) -> Arc<Self::Buffer>;

    /// Queues a copy of `buffer` into `dst_texture`, starting at the given
    /// slice and mip. Does not block.
    fn schedule_gpu_copy(
        &self,
        dst_texture: &Arc<dyn Texture>,
        dst_slice: u32,
        dst_mip: u32,
        buffer: &Arc<Self::Buffer>,
    );

    /// Returns `buffer` to the cache. Only valid once its copy is scheduled.
    fn recycle_buffer(&self, buffer: Arc<Self::Buffer>) -> Result<(), UploadError>;

    /// Executes queued map and copy operations.
    fn render_thread_update(&self, context: &dyn DeviceContext);

    /// Current diagnostics.
    fn stats(&self) -> TextureUploaderStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_of_uncompressed_mip_chain() {
        let desc = UploadBufferDesc {
            width: 8,
            height: 4,
            mip_levels: 4,
            array_size: 2,
            format: TextureFormat::Rgba8Unorm,
            ..Default::default()
        };
        let layout = UploadBufferLayout::new(&desc);
        // Mips: 8x4, 4x2, 2x1, 1x1 texels of 4 bytes.
        let per_slice = 128 + 32 + 8 + 4;
        assert_eq!(layout.total_size(), 2 * per_slice);

        let mip1 = layout.subresource(desc.subresource_index(1, 0).unwrap());
        assert_eq!((mip1.offset, mip1.size, mip1.stride), (128, 32, 16));
        let slice1 = layout.subresource(desc.subresource_index(0, 1).unwrap());
        assert_eq!(slice1.offset, per_slice);
    }

    #[test]
    fn test_layout_of_compressed_format_rounds_to_blocks() {
        let desc = UploadBufferDesc {
            width: 10,
            height: 6,
            mip_levels: 2,
            format: TextureFormat::Bc1Unorm,
            ..Default::default()
        };
        let layout = UploadBufferLayout::new(&desc);
        // Mip 0: 12x8 texels -> 3x2 blocks of 8 bytes. Mip 1: 5x3 -> 8x4 -> 2x1 blocks.
        let mip0 = layout.subresource(0);
        assert_eq!((mip0.size, mip0.stride), (48, 24));
        let mip1 = layout.subresource(1);
        assert_eq!((mip1.offset, mip1.size, mip1.stride), (48, 16, 16));
        assert_eq!(layout.total_size(), 64);
    }

    #[test]
    fn test_layout_of_volume_holds_every_depth_slice() {
        let desc = UploadBufferDesc {
            width: 4,
            height: 4,
            depth: 4,
            mip_levels: 2,
            format: TextureFormat::Rgba8Unorm,
            ..Default::default()
        };
        let layout = UploadBufferLayout::new(&desc);
        let mip0 = layout.subresource(0);
        assert_eq!((mip0.size, mip0.stride, mip0.depth_stride), (256, 16, 64));
        // Mip 1 is 2x2x2.
        let mip1 = layout.subresource(1);
        assert_eq!((mip1.offset, mip1.size, mip1.depth_stride), (256, 32, 16));
        assert_eq!(layout.total_size(), 288);
    }

    #[test]
    fn test_deep_mip_chain_clamps_to_one_texel() {
        let desc = UploadBufferDesc {
            width: 2,
            height: 2,
            mip_levels: 40,
            format: TextureFormat::Rgba8Unorm,
            ..Default::default()
        };
        let layout = UploadBufferLayout::new(&desc);
        let last = layout.subresource(39);
        assert_eq!((last.size, last.stride), (4, 4));
    }

    #[test]
    fn test_subresource_index_bounds() {
        let desc = UploadBufferDesc {
            mip_levels: 3,
            array_size: 2,
            ..Default::default()
        };
        assert_eq!(desc.num_subresources(), 6);
        assert_eq!(desc.subresource_index(2, 1), Some(5));
        assert_eq!(desc.subresource_index(3, 0), None);
        assert_eq!(desc.subresource_index(0, 2), None);
    }
}
