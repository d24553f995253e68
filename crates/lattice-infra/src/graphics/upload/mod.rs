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

//! Texture upload through CPU-visible staging buffers.
//!
//! Worker threads allocate an upload buffer, fill it and schedule a copy; the
//! render thread performs the map and copy operations in
//! [`render_thread_update`](lattice_core::graphics::upload::TextureUploader::render_thread_update).

mod staging;

pub use self::staging::{StagingTextureUploader, StagingUploadBuffer};
