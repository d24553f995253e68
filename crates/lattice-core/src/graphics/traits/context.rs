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

use crate::graphics::api::{MapFlags, MapType, MappedMemory, TextureRegion, TextureSubresourceData};
use crate::graphics::error::ResourceError;
use crate::graphics::traits::{Buffer, Texture};
use std::sync::Arc;

/// Records and executes GPU commands. Owned by the render thread.
pub trait DeviceContext: Send + Sync {
    /// Maps `buffer` into CPU-visible memory.
    fn map_buffer(
        &self,
        buffer: &Arc<dyn Buffer>,
        map_type: MapType,
        flags: MapFlags,
    ) -> Result<MappedMemory, ResourceError>;

    /// Ends a map started with [`map_buffer`](Self::map_buffer).
    fn unmap_buffer(&self, buffer: &Arc<dyn Buffer>, map_type: MapType);

    /// Copies `data` into `region` of one texture subresource.
    fn update_texture(
        &self,
        texture: &Arc<dyn Texture>,
        mip_level: u32,
        slice: u32,
        region: &TextureRegion,
        data: &TextureSubresourceData,
    ) -> Result<(), ResourceError>;
}
