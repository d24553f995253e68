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

//! Buffers, textures and the device context of the GL backend.

use super::api::{GlContextHandle, GlFunctions, GlTextureHandle};
use lattice_core::graphics::api::{
    BufferDesc, MapFlags, MapType, MappedMemory, TextureDesc, TextureRegion,
    TextureSubresourceData, Usage,
};
use lattice_core::graphics::traits::{Buffer, DeviceContext, Texture};
use lattice_core::graphics::ResourceError;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A staging buffer kept in host memory.
///
/// Texture uploads from it are issued with client-memory `glTexSubImage*`
/// calls, so it never needs a native buffer object.
#[derive(Debug)]
pub struct GlStagingBuffer {
    desc: BufferDesc<'static>,
    memory: MappedMemory,
}

impl GlStagingBuffer {
    /// Allocates zeroed host memory for `desc`.
    pub fn new(desc: BufferDesc<'static>) -> Result<Self, ResourceError> {
        if desc.usage != Usage::Staging {
            return Err(ResourceError::BackendError(format!(
                "Buffer '{}': only staging buffers are supported, got {:?}",
                desc.name.as_deref().unwrap_or(""),
                desc.usage
            )));
        }
        let size = usize::try_from(desc.size).map_err(|_| ResourceError::OutOfBounds)?;
        Ok(Self {
            memory: MappedMemory::zeroed(size),
            desc,
        })
    }
}

impl Buffer for GlStagingBuffer {
    fn desc(&self) -> &BufferDesc<'static> {
        &self.desc
    }

    fn host_memory(&self) -> Option<&MappedMemory> {
        Some(&self.memory)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A GL texture object created by the loader.
#[derive(Debug)]
pub struct GlTexture {
    desc: TextureDesc<'static>,
    handle: GlTextureHandle,
}

impl GlTexture {
    /// Wraps an existing native texture.
    pub fn from_handle(desc: TextureDesc<'static>, handle: GlTextureHandle) -> Self {
        Self { desc, handle }
    }

    /// The native texture name.
    pub fn handle(&self) -> GlTextureHandle {
        self.handle
    }
}

impl Texture for GlTexture {
    fn desc(&self) -> &TextureDesc<'static> {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Records commands into one GL context.
pub struct GlDeviceContext {
    gl: Arc<dyn GlFunctions>,
    context: GlContextHandle,
}

impl GlDeviceContext {
    /// Creates a context wrapper. `context` must be current on the calling
    /// thread whenever the wrapper is used.
    pub fn new(gl: Arc<dyn GlFunctions>, context: GlContextHandle) -> Self {
        Self { gl, context }
    }

    /// The native context.
    pub fn context_handle(&self) -> GlContextHandle {
        self.context
    }
}

impl fmt::Debug for GlDeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlDeviceContext")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Number of bytes a region occupies in a source buffer with the given strides.
fn region_byte_size(
    region: &TextureRegion,
    texture: &TextureDesc<'_>,
    data: &TextureSubresourceData,
) -> u64 {
    let block_height = u32::from(texture.format.attribs().block_height.max(1));
    let rows = region.max_y.saturating_sub(region.min_y).div_ceil(block_height);
    let depth = region.max_z.saturating_sub(region.min_z).max(1);
    u64::from(data.depth_stride) * u64::from(depth - 1)
        + u64::from(data.stride) * u64::from(rows)
}

impl DeviceContext for GlDeviceContext {
    fn map_buffer(
        &self,
        buffer: &Arc<dyn Buffer>,
        map_type: MapType,
        flags: MapFlags,
    ) -> Result<MappedMemory, ResourceError> {
        let memory = buffer
            .host_memory()
            .ok_or(ResourceError::BackendMismatch("OpenGL staging"))?;
        if flags.contains(MapFlags::DISCARD) && map_type != MapType::Read {
            log::trace!(
                "Mapping '{}' with discard",
                buffer.desc().name.as_deref().unwrap_or("")
            );
        }
        Ok(memory.clone())
    }

    fn unmap_buffer(&self, buffer: &Arc<dyn Buffer>, _map_type: MapType) {
        log::trace!("Unmapped '{}'", buffer.desc().name.as_deref().unwrap_or(""));
    }

    fn update_texture(
        &self,
        texture: &Arc<dyn Texture>,
        mip_level: u32,
        slice: u32,
        region: &TextureRegion,
        data: &TextureSubresourceData,
    ) -> Result<(), ResourceError> {
        let gl_texture = texture
            .as_any()
            .downcast_ref::<GlTexture>()
            .ok_or(ResourceError::BackendMismatch("OpenGL"))?;
        let memory = data
            .source
            .host_memory()
            .ok_or(ResourceError::BackendMismatch("OpenGL staging"))?;

        let size = region_byte_size(region, texture.desc(), data);
        let bytes = memory.lock();
        let start =
            usize::try_from(data.source_offset).map_err(|_| ResourceError::OutOfBounds)?;
        let end = usize::try_from(data.source_offset + size)
            .map_err(|_| ResourceError::OutOfBounds)?;
        let src = bytes.get(start..end).ok_or(ResourceError::OutOfBounds)?;

        self.gl.texture_sub_image(
            gl_texture.handle(),
            mip_level,
            slice,
            region,
            data.stride,
            src,
        )?;
        Ok(())
    }
}
