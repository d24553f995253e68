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

//! The staging-buffer texture uploader.

use lattice_core::graphics::api::{
    BufferDesc, CpuAccessFlags, MapFlags, MapType, MappedMemory, TextureRegion,
    TextureSubresourceData, Usage,
};
use lattice_core::graphics::traits::{Buffer, DeviceContext, ResourceFactory, Texture};
use lattice_core::graphics::upload::{
    MappedTextureSubresource, TextureUploader, TextureUploaderStats, UploadBuffer,
    UploadBufferDesc, UploadBufferLayout, UploadBufferState,
};
use lattice_core::graphics::{ResourceError, UploadError};
use lattice_core::utils::ThreadSignal;
use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MappedState {
    state: UploadBufferState,
    staging_buffer: Option<Arc<dyn Buffer>>,
    memory: Option<MappedMemory>,
    subresources: Vec<MappedTextureSubresource>,
}

/// An upload buffer backed by one staging buffer holding every subresource.
#[derive(Debug)]
pub struct StagingUploadBuffer {
    desc: UploadBufferDesc,
    layout: UploadBufferLayout,
    mapped: Mutex<MappedState>,
    buffer_mapped: ThreadSignal,
    copy_scheduled: ThreadSignal,
}

impl StagingUploadBuffer {
    /// Creates an idle, unmapped buffer for `desc`.
    pub fn new(desc: UploadBufferDesc) -> Self {
        Self {
            layout: UploadBufferLayout::new(&desc),
            desc,
            mapped: Mutex::new(MappedState::default()),
            buffer_mapped: ThreadSignal::new(),
            copy_scheduled: ThreadSignal::new(),
        }
    }

    /// Byte layout of the subresources.
    pub fn layout(&self) -> &UploadBufferLayout {
        &self.layout
    }

    /// The staging buffer, once the render thread created it.
    pub fn staging_buffer(&self) -> Option<Arc<dyn Buffer>> {
        self.lock().staging_buffer.clone()
    }

    /// Gives `write` the mapped bytes of a subresource and its row stride.
    pub fn write_with<F>(&self, mip: u32, slice: u32, write: F) -> Result<(), UploadError>
    where
        F: FnOnce(&mut [u8], u32),
    {
        let index = self
            .desc
            .subresource_index(mip, slice)
            .ok_or(UploadError::InvalidSubresource { mip, slice })?;
        let (record, memory) = {
            let mapped = self.lock();
            match (mapped.subresources.get(index), &mapped.memory) {
                (Some(record), Some(memory)) => (*record, memory.clone()),
                _ => return Err(UploadError::NotMapped { mip, slice }),
            }
        };
        let mut bytes = memory.lock();
        let capacity = bytes.len();
        let start = record.offset as usize;
        let end = start + record.size as usize;
        let subresource = bytes
            .get_mut(start..end)
            .ok_or(UploadError::SubresourceOverflow { len: end, capacity })?;
        write(subresource, record.stride);
        Ok(())
    }

    /// Copies plain-old-data texels to the start of a subresource.
    pub fn write_texels<T: bytemuck::Pod>(
        &self,
        mip: u32,
        slice: u32,
        texels: &[T],
    ) -> Result<(), UploadError> {
        self.write_subresource(mip, slice, bytemuck::cast_slice(texels))
    }

    fn lock(&self) -> MutexGuard<'_, MappedState> {
        self.mapped.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: UploadBufferState) {
        self.lock().state = state;
    }

    fn ensure_staging_buffer(
        &self,
        factory: &dyn ResourceFactory,
    ) -> Result<Arc<dyn Buffer>, ResourceError> {
        if let Some(buffer) = self.staging_buffer() {
            return Ok(buffer);
        }
        let desc = BufferDesc {
            name: Some(Cow::Owned(format!(
                "Staging buffer for upload buffer {}x{}x{} ({} mips, {} slices)",
                self.desc.width,
                self.desc.height,
                self.desc.depth,
                self.desc.mip_levels,
                self.desc.array_size
            ))),
            size: self.layout.total_size(),
            usage: Usage::Staging,
            cpu_access: CpuAccessFlags::WRITE,
        };
        let buffer = factory.create_buffer(&desc)?;
        self.lock().staging_buffer = Some(buffer.clone());
        Ok(buffer)
    }

    fn publish_mapping(&self, memory: MappedMemory) {
        let subresources = (0..self.desc.num_subresources())
            .map(|index| self.layout.subresource(index))
            .collect();
        let mut mapped = self.lock();
        mapped.memory = Some(memory);
        mapped.subresources = subresources;
        mapped.state = UploadBufferState::Mapped;
    }

    fn reset(&self) {
        self.buffer_mapped.reset();
        self.copy_scheduled.reset();
        let mut mapped = self.lock();
        mapped.state = UploadBufferState::Idle;
        mapped.memory = None;
        mapped.subresources.clear();
    }
}

impl UploadBuffer for StagingUploadBuffer {
    fn desc(&self) -> &UploadBufferDesc {
        &self.desc
    }

    fn state(&self) -> UploadBufferState {
        self.lock().state
    }

    fn mapped_data(&self, mip: u32, slice: u32) -> MappedTextureSubresource {
        self.desc
            .subresource_index(mip, slice)
            .and_then(|index| self.lock().subresources.get(index).copied())
            .unwrap_or_default()
    }

    fn is_mapped(&self, mip: u32, slice: u32) -> bool {
        self.desc
            .subresource_index(mip, slice)
            .is_some_and(|index| self.lock().subresources.len() > index)
    }

    fn write_subresource(&self, mip: u32, slice: u32, data: &[u8]) -> Result<(), UploadError> {
        let capacity = self.mapped_data(mip, slice).size as usize;
        if self.is_mapped(mip, slice) && data.len() > capacity {
            return Err(UploadError::SubresourceOverflow {
                len: data.len(),
                capacity,
            });
        }
        self.write_with(mip, slice, |bytes, _| bytes[..data.len()].copy_from_slice(data))
    }

    fn wait_for_copy_scheduled(&self) {
        self.copy_scheduled.wait();
    }
}

enum PendingOperation {
    Map {
        buffer: Arc<StagingUploadBuffer>,
    },
    Copy {
        buffer: Arc<StagingUploadBuffer>,
        dst_texture: Arc<dyn Texture>,
        dst_slice: u32,
        dst_mip: u32,
    },
}

/// A [`TextureUploader`] that stages data in CPU-visible buffers and copies
/// it with `update_texture` on the render thread.
///
/// Recycled buffers are cached per [`UploadBufferDesc`] and reused first in,
/// first out.
pub struct StagingTextureUploader {
    factory: Arc<dyn ResourceFactory>,
    pending: Mutex<Vec<PendingOperation>>,
    cache: Mutex<HashMap<UploadBufferDesc, VecDeque<Arc<StagingUploadBuffer>>>>,
}

impl StagingTextureUploader {
    /// Creates an uploader that allocates staging buffers from `factory`.
    pub fn new(factory: Arc<dyn ResourceFactory>) -> Self {
        Self {
            factory,
            pending: Mutex::new(Vec::new()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of idle buffers in the cache.
    pub fn cached_buffer_count(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(VecDeque::len)
            .sum()
    }

    fn enqueue(&self, op: PendingOperation) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(op);
    }

    fn execute_map(&self, context: &dyn DeviceContext, buffer: &StagingUploadBuffer) {
        match buffer.ensure_staging_buffer(self.factory.as_ref()) {
            Ok(staging) => match context.map_buffer(&staging, MapType::Write, MapFlags::DISCARD) {
                Ok(memory) => buffer.publish_mapping(memory),
                Err(e) => log::error!("Failed to map staging buffer: {e}"),
            },
            Err(e) => log::error!("Failed to create staging buffer: {e}"),
        }
        buffer.buffer_mapped.trigger();
    }

    fn execute_copy(
        &self,
        context: &dyn DeviceContext,
        buffer: &StagingUploadBuffer,
        dst_texture: &Arc<dyn Texture>,
        dst_slice: u32,
        dst_mip: u32,
    ) {
        match buffer.staging_buffer() {
            Some(staging) => {
                context.unmap_buffer(&staging, MapType::Write);
                let desc = buffer.desc;
                let texture_desc = dst_texture.desc();
                for slice in 0..desc.array_size {
                    for mip in 0..desc.mip_levels {
                        let Some(index) = desc.subresource_index(mip, slice) else {
                            continue;
                        };
                        let (Some(target_mip), Some(target_slice)) =
                            (dst_mip.checked_add(mip), dst_slice.checked_add(slice))
                        else {
                            log::error!(
                                "Copy target mip {dst_mip}+{mip} slice {dst_slice}+{slice} is out of range"
                            );
                            continue;
                        };
                        let record = buffer.layout.subresource(index);
                        let props = texture_desc.mip_level_properties(target_mip);
                        let region = TextureRegion {
                            max_z: props.depth,
                            ..TextureRegion::with_size(props.logical_width, props.logical_height)
                        };
                        let data = TextureSubresourceData {
                            source: staging.clone(),
                            source_offset: record.offset,
                            stride: record.stride,
                            depth_stride: record.depth_stride,
                        };
                        if let Err(e) = context.update_texture(
                            dst_texture,
                            target_mip,
                            target_slice,
                            &region,
                            &data,
                        ) {
                            log::error!(
                                "Failed to copy mip {target_mip} slice {target_slice} into '{}': {e}",
                                texture_desc.name.as_deref().unwrap_or("")
                            );
                        }
                    }
                }
            }
            None => log::error!("Upload buffer was never mapped; nothing to copy"),
        }
        buffer.set_state(UploadBufferState::CopyScheduled);
        buffer.copy_scheduled.trigger();
    }
}

impl TextureUploader for StagingTextureUploader {
    type Buffer = StagingUploadBuffer;

    fn allocate_upload_buffer(&self, desc: &UploadBufferDesc) -> Arc<StagingUploadBuffer> {
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(desc)
            .and_then(VecDeque::pop_front);

        let buffer = match cached {
            Some(buffer) => {
                log::debug!(
                    "Reusing cached upload buffer {}x{}x{} ({:?})",
                    desc.width,
                    desc.height,
                    desc.depth,
                    desc.format
                );
                buffer
            }
            None => {
                let buffer = Arc::new(StagingUploadBuffer::new(*desc));
                log::info!(
                    "Created upload buffer {}x{}x{}, {} mip(s), {} slice(s), {:?}: {} bytes",
                    desc.width,
                    desc.height,
                    desc.depth,
                    desc.mip_levels,
                    desc.array_size,
                    desc.format,
                    buffer.layout.total_size()
                );
                buffer
            }
        };

        buffer.set_state(UploadBufferState::MapRequested);
        self.enqueue(PendingOperation::Map {
            buffer: buffer.clone(),
        });
        buffer.buffer_mapped.wait();
        buffer
    }

    fn schedule_gpu_copy(
        &self,
        dst_texture: &Arc<dyn Texture>,
        dst_slice: u32,
        dst_mip: u32,
        buffer: &Arc<StagingUploadBuffer>,
    ) {
        buffer.set_state(UploadBufferState::CopyRequested);
        self.enqueue(PendingOperation::Copy {
            buffer: buffer.clone(),
            dst_texture: dst_texture.clone(),
            dst_slice,
            dst_mip,
        });
    }

    fn recycle_buffer(&self, buffer: Arc<StagingUploadBuffer>) -> Result<(), UploadError> {
        if buffer.state() != UploadBufferState::CopyScheduled {
            let err = UploadError::RecycleBeforeCopyScheduled;
            log::error!("{err} (buffer state: {:?})", buffer.state());
            return Err(err);
        }
        buffer.reset();
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(buffer.desc)
            .or_default()
            .push_back(buffer);
        Ok(())
    }

    fn render_thread_update(&self, context: &dyn DeviceContext) {
        let in_work = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *pending)
        };
        for op in in_work {
            match op {
                PendingOperation::Map { buffer } => self.execute_map(context, &buffer),
                PendingOperation::Copy {
                    buffer,
                    dst_texture,
                    dst_slice,
                    dst_mip,
                } => self.execute_copy(context, &buffer, &dst_texture, dst_slice, dst_mip),
            }
        }
    }

    fn stats(&self) -> TextureUploaderStats {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner()).len();
        TextureUploaderStats {
            num_pending_operations: pending as u32,
        }
    }
}

impl Drop for StagingTextureUploader {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(|e| e.into_inner()).len();
        if pending > 0 {
            log::warn!(
                "Texture uploader destroyed with {pending} pending operation(s). \
                 Threads waiting on these buffers may never wake up."
            );
        }
        let cache = self.cache.get_mut().unwrap_or_else(|e| e.into_inner());
        for (desc, buffers) in cache.iter() {
            log::info!(
                "Texture uploader releasing {} upload buffer(s) {}x{}x{} ({:?})",
                buffers.len(),
                desc.width,
                desc.height,
                desc.depth,
                desc.format
            );
        }
    }
}
