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

mod common;

use anyhow::Result;
use common::{init_logger, make_device, GlCall, MockGl};
use lattice_core::graphics::api::{
    MapFlags, MapType, MappedMemory, TextureDesc, TextureDimension, TextureFormat, TextureRegion,
    TextureSubresourceData,
};
use lattice_core::graphics::traits::{Buffer, DeviceContext, ResourceFactory, Texture};
use lattice_core::graphics::upload::{
    TextureUploader, UploadBuffer, UploadBufferDesc, UploadBufferState,
};
use lattice_core::graphics::{ResourceError, UploadError};
use lattice_infra::graphics::gl::{GlContextHandle, GlTexture, GlTextureHandle};
use lattice_infra::graphics::{StagingTextureUploader, StagingUploadBuffer};
use std::borrow::Cow;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn rgba_desc(width: u32, height: u32, mip_levels: u32, array_size: u32) -> UploadBufferDesc {
    UploadBufferDesc {
        width,
        height,
        mip_levels,
        array_size,
        format: TextureFormat::Rgba8Unorm,
        ..UploadBufferDesc::default()
    }
}

fn texture(width: u32, height: u32, mip_levels: u32, array_size: u32) -> Arc<dyn Texture> {
    let desc = TextureDesc {
        name: Some(Cow::Borrowed("Albedo")),
        dimension: TextureDimension::Tex2DArray,
        width,
        height,
        depth_or_array_size: array_size,
        mip_levels,
        format: TextureFormat::Rgba8Unorm,
    };
    Arc::new(GlTexture::from_handle(desc, GlTextureHandle(42)))
}

/// Runs render-thread updates until `worker` finishes.
fn pump<T>(
    uploader: &StagingTextureUploader,
    context: &dyn DeviceContext,
    done: flume::Receiver<T>,
) -> T {
    loop {
        uploader.render_thread_update(context);
        match done.recv_timeout(Duration::from_millis(1)) {
            Ok(value) => return value,
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => panic!("Worker thread died"),
        }
    }
}

#[test]
fn test_allocated_buffer_is_mapped() -> Result<()> {
    // --- 1. ARRANGE ---
    init_logger();
    let gl = MockGl::new();
    let device = make_device(&gl, true);
    let context = device.create_device_context(GlContextHandle(0));
    let uploader = Arc::new(StagingTextureUploader::new(device.clone()));
    let desc = rgba_desc(16, 8, 2, 1);
    let (done_tx, done_rx) = flume::unbounded();

    // --- 2. ACT ---
    let worker = {
        let uploader = uploader.clone();
        thread::spawn(move || {
            let buffer = uploader.allocate_upload_buffer(&desc);
            done_tx.send(buffer).expect("Test thread should be alive");
        })
    };
    let buffer = pump(&uploader, &context, done_rx);
    worker.join().expect("Worker should not panic");

    // --- 3. ASSERT ---
    assert_eq!(buffer.state(), UploadBufferState::Mapped);
    assert!(buffer.is_mapped(0, 0));
    assert!(buffer.is_mapped(1, 0));
    assert!(!buffer.is_mapped(2, 0));
    let mip0 = buffer.mapped_data(0, 0);
    let mip1 = buffer.mapped_data(1, 0);
    assert_eq!((mip0.offset, mip0.size, mip0.stride), (0, 16 * 8 * 4, 16 * 4));
    assert_eq!((mip1.offset, mip1.size, mip1.stride), (512, 8 * 4 * 4, 8 * 4));

    let staging = buffer.staging_buffer().expect("Map creates the staging buffer");
    assert_eq!(staging.desc().size, 640);
    assert!(staging
        .desc()
        .name
        .as_deref()
        .is_some_and(|name| name.starts_with("Staging buffer")));
    assert_eq!(uploader.stats().num_pending_operations, 0);
    Ok(())
}

#[test]
fn test_full_upload_cycle_copies_every_subresource() -> Result<()> {
    init_logger();
    let gl = MockGl::new();
    let device = make_device(&gl, true);
    let context = device.create_device_context(GlContextHandle(0));
    let uploader = Arc::new(StagingTextureUploader::new(device.clone()));
    let desc = rgba_desc(4, 4, 2, 2);
    let dst = texture(8, 8, 4, 4);
    let (done_tx, done_rx) = flume::unbounded();

    let worker = {
        let uploader = uploader.clone();
        let dst = dst.clone();
        thread::spawn(move || -> Result<(), UploadError> {
            let buffer = uploader.allocate_upload_buffer(&desc);
            for slice in 0..2u32 {
                for mip in 0..2u32 {
                    let side = 4 >> mip;
                    let texels = vec![[mip as u8, slice as u8, 0xAB, 0xFF]; side * side];
                    buffer.write_texels(mip, slice, &texels)?;
                }
            }
            uploader.schedule_gpu_copy(&dst, 1, 2, &buffer);
            buffer.wait_for_copy_scheduled();
            uploader.recycle_buffer(buffer)?;
            done_tx.send(()).expect("Test thread should be alive");
            Ok(())
        })
    };
    pump(&uploader, &context, done_rx);
    worker.join().expect("Worker should not panic")?;

    let uploads: Vec<_> = gl
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GlCall::TexSubImage {
                texture,
                mip_level,
                slice,
                region,
                row_stride,
                data,
            } => Some((texture, mip_level, slice, region, row_stride, data)),
            _ => None,
        })
        .collect();
    assert_eq!(uploads.len(), 4, "One copy per (mip, slice)");

    // Destination mip 2 of an 8x8 texture is 2x2, mip 3 is 1x1.
    let (texture, mip_level, slice, region, row_stride, data) = &uploads[0];
    assert_eq!((*texture, *mip_level, *slice), (42, 2, 1));
    assert_eq!(*region, TextureRegion::with_size(2, 2));
    assert_eq!(*row_stride, 16);
    assert_eq!(&data[..4], &[0, 0, 0xAB, 0xFF]);

    let (_, mip_level, slice, region, _, _) = &uploads[3];
    assert_eq!((*mip_level, *slice), (3, 2));
    assert_eq!(*region, TextureRegion::with_size(1, 1));

    assert_eq!(uploader.cached_buffer_count(), 1);
    Ok(())
}

#[test]
fn test_volume_upload_copies_every_depth_slice() -> Result<()> {
    // --- 1. ARRANGE ---
    init_logger();
    let gl = MockGl::new();
    let device = make_device(&gl, true);
    let context = device.create_device_context(GlContextHandle(0));
    let uploader = Arc::new(StagingTextureUploader::new(device.clone()));
    let desc = UploadBufferDesc {
        depth: 4,
        ..rgba_desc(4, 4, 1, 1)
    };
    let dst: Arc<dyn Texture> = Arc::new(GlTexture::from_handle(
        TextureDesc {
            name: Some(Cow::Borrowed("Fog volume")),
            dimension: TextureDimension::Tex3D,
            width: 4,
            height: 4,
            depth_or_array_size: 4,
            mip_levels: 1,
            format: TextureFormat::Rgba8Unorm,
        },
        GlTextureHandle(7),
    ));
    let (done_tx, done_rx) = flume::unbounded();

    // --- 2. ACT ---
    let worker = {
        let uploader = uploader.clone();
        let dst = dst.clone();
        thread::spawn(move || -> Result<(), UploadError> {
            let buffer = uploader.allocate_upload_buffer(&desc);
            let texels: Vec<[u8; 4]> = (0..64u8).map(|i| [i, i / 16, 0, 0xFF]).collect();
            buffer.write_texels(0, 0, &texels)?;
            uploader.schedule_gpu_copy(&dst, 0, 0, &buffer);
            buffer.wait_for_copy_scheduled();
            uploader.recycle_buffer(buffer)?;
            done_tx.send(()).expect("Test thread should be alive");
            Ok(())
        })
    };
    pump(&uploader, &context, done_rx);
    worker.join().expect("Worker should not panic")?;

    // --- 3. ASSERT ---
    let uploads: Vec<_> = gl
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GlCall::TexSubImage { region, data, .. } => Some((region, data)),
            _ => None,
        })
        .collect();
    assert_eq!(uploads.len(), 1);
    let (region, data) = &uploads[0];
    assert_eq!(
        *region,
        TextureRegion {
            max_z: 4,
            ..TextureRegion::with_size(4, 4)
        }
    );
    assert_eq!(data.len(), 256, "Every depth slice should be staged");
    assert_eq!(&data[252..], &[63, 3, 0, 0xFF]);
    Ok(())
}

#[test]
fn test_recycled_buffers_are_reused() -> Result<()> {
    init_logger();
    let gl = MockGl::new();
    let device = make_device(&gl, true);
    let context = device.create_device_context(GlContextHandle(0));
    let uploader = Arc::new(StagingTextureUploader::new(device.clone()));
    let desc = rgba_desc(4, 4, 1, 1);
    let dst = texture(4, 4, 1, 1);

    let mut seen = Vec::new();
    for _ in 0..2 {
        let (done_tx, done_rx) = flume::unbounded();
        let worker = {
            let uploader = uploader.clone();
            let dst = dst.clone();
            thread::spawn(move || {
                let buffer = uploader.allocate_upload_buffer(&desc);
                let raw = Arc::as_ptr(&buffer) as usize;
                uploader.schedule_gpu_copy(&dst, 0, 0, &buffer);
                buffer.wait_for_copy_scheduled();
                uploader
                    .recycle_buffer(buffer)
                    .expect("Copy has been scheduled");
                done_tx.send(raw).expect("Test thread should be alive");
            })
        };
        seen.push(pump(&uploader, &context, done_rx));
        worker.join().expect("Worker should not panic");
    }

    assert_eq!(seen[0], seen[1], "The cached buffer should be handed out again");
    assert_eq!(uploader.cached_buffer_count(), 1);
    Ok(())
}

#[test]
fn test_recycle_before_copy_is_rejected() -> Result<()> {
    init_logger();
    let gl = MockGl::new();
    let device = make_device(&gl, true);
    let context = device.create_device_context(GlContextHandle(0));
    let uploader = Arc::new(StagingTextureUploader::new(device.clone()));
    let desc = rgba_desc(4, 4, 1, 1);
    let (done_tx, done_rx) = flume::unbounded();

    let worker = {
        let uploader = uploader.clone();
        thread::spawn(move || {
            let buffer = uploader.allocate_upload_buffer(&desc);
            let result = uploader.recycle_buffer(buffer.clone());
            done_tx.send((buffer, result)).expect("Test thread should be alive");
        })
    };
    let (buffer, result) = pump(&uploader, &context, done_rx);
    worker.join().expect("Worker should not panic");

    assert_eq!(result, Err(UploadError::RecycleBeforeCopyScheduled));
    assert_eq!(uploader.cached_buffer_count(), 0, "The cache must stay untouched");
    assert_eq!(buffer.state(), UploadBufferState::Mapped);
    assert!(buffer.is_mapped(0, 0));
    Ok(())
}

#[test]
fn test_write_errors() -> Result<()> {
    init_logger();
    let buffer = StagingUploadBuffer::new(rgba_desc(4, 4, 1, 1));

    assert_eq!(
        buffer.write_subresource(0, 0, &[0; 4]),
        Err(UploadError::NotMapped { mip: 0, slice: 0 })
    );
    assert_eq!(
        buffer.write_subresource(1, 0, &[0; 4]),
        Err(UploadError::InvalidSubresource { mip: 1, slice: 0 })
    );

    let gl = MockGl::new();
    let device = make_device(&gl, true);
    let context = device.create_device_context(GlContextHandle(0));
    let uploader = Arc::new(StagingTextureUploader::new(device.clone()));
    let (done_tx, done_rx) = flume::unbounded();
    let worker = {
        let uploader = uploader.clone();
        thread::spawn(move || {
            let buffer = uploader.allocate_upload_buffer(&rgba_desc(4, 4, 1, 1));
            done_tx.send(buffer).expect("Test thread should be alive");
        })
    };
    let mapped = pump(&uploader, &context, done_rx);
    worker.join().expect("Worker should not panic");

    assert_eq!(
        mapped.write_subresource(0, 0, &[0; 65]),
        Err(UploadError::SubresourceOverflow { len: 65, capacity: 64 })
    );
    mapped.write_with(0, 0, |bytes, row_stride| {
        assert_eq!(row_stride, 16);
        bytes[row_stride as usize] = 7;
    })?;
    let staging = mapped.staging_buffer().expect("Buffer is mapped");
    let memory = staging.host_memory().expect("GL staging buffers live in host memory");
    assert_eq!(memory.lock()[16], 7);
    Ok(())
}

/// A context whose map always fails.
struct FailingContext;

impl DeviceContext for FailingContext {
    fn map_buffer(
        &self,
        _buffer: &Arc<dyn Buffer>,
        _map_type: MapType,
        _flags: MapFlags,
    ) -> Result<MappedMemory, ResourceError> {
        Err(ResourceError::BackendError("out of memory".to_string()))
    }

    fn unmap_buffer(&self, _buffer: &Arc<dyn Buffer>, _map_type: MapType) {}

    fn update_texture(
        &self,
        _texture: &Arc<dyn Texture>,
        _mip_level: u32,
        _slice: u32,
        _region: &TextureRegion,
        _data: &TextureSubresourceData,
    ) -> Result<(), ResourceError> {
        Err(ResourceError::BackendError("lost context".to_string()))
    }
}

#[test]
fn test_failed_map_still_wakes_the_worker() -> Result<()> {
    init_logger();
    let gl = MockGl::new();
    let device = make_device(&gl, true);
    let factory: Arc<dyn ResourceFactory> = device.clone();
    let uploader = Arc::new(StagingTextureUploader::new(factory));
    let (done_tx, done_rx) = flume::unbounded();

    let worker = {
        let uploader = uploader.clone();
        thread::spawn(move || {
            let buffer = uploader.allocate_upload_buffer(&rgba_desc(4, 4, 1, 1));
            done_tx.send(buffer).expect("Test thread should be alive");
        })
    };
    let buffer = pump(&uploader, &FailingContext, done_rx);
    worker.join().expect("Worker should not panic");

    assert!(!buffer.is_mapped(0, 0));
    assert!(matches!(
        buffer.write_subresource(0, 0, &[1, 2, 3, 4]),
        Err(UploadError::NotMapped { .. })
    ));
    Ok(())
}

#[test]
fn test_pending_operations_are_counted() {
    init_logger();
    let gl = MockGl::new();
    let device = make_device(&gl, true);
    let uploader = StagingTextureUploader::new(device.clone());
    let buffer = Arc::new(StagingUploadBuffer::new(rgba_desc(4, 4, 1, 1)));

    uploader.schedule_gpu_copy(&texture(4, 4, 1, 1), 0, 0, &buffer);
    uploader.schedule_gpu_copy(&texture(4, 4, 1, 1), 0, 0, &buffer);

    assert_eq!(uploader.stats().num_pending_operations, 2);
    assert_eq!(buffer.state(), UploadBufferState::CopyRequested);
    // Dropped with pending work: only a warning is logged.
}
