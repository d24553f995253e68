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

//! Flag sets used by the descriptor types and object interfaces.

use crate::lattice_bitflags;

lattice_bitflags! {
    /// A set of programmable pipeline stages.
    pub struct ShaderStages: u32 {
        /// Vertex stage.
        const VERTEX = 1 << 0;
        /// Pixel (fragment) stage.
        const PIXEL = 1 << 1;
        /// Geometry stage.
        const GEOMETRY = 1 << 2;
        /// Hull stage.
        const HULL = 1 << 3;
        /// Domain stage.
        const DOMAIN = 1 << 4;
        /// Compute stage.
        const COMPUTE = 1 << 5;
    }
}

impl ShaderStages {
    /// Every graphics stage.
    pub const ALL_GRAPHICS: Self = Self::from_bits_truncate(0b1_1111);
    /// Every stage.
    pub const ALL: Self = Self::from_bits_truncate(0b11_1111);
}

lattice_bitflags! {
    /// Controls which variables `bind_resources`-style calls update.
    pub struct BindShaderResourcesFlags: u32 {
        /// Update static variables.
        const UPDATE_STATIC = 1 << 0;
        /// Update mutable variables.
        const UPDATE_MUTABLE = 1 << 1;
        /// Update dynamic variables.
        const UPDATE_DYNAMIC = 1 << 2;
        /// Do not overwrite variables that are already bound.
        const KEEP_EXISTING = 1 << 3;
        /// Report variables the mapping could not resolve.
        const VERIFY_ALL_RESOLVED = 1 << 4;
    }
}

impl BindShaderResourcesFlags {
    /// All three update flags.
    pub const UPDATE_ALL: Self = Self::from_bits_truncate(0b111);
}

lattice_bitflags! {
    /// CPU access allowed on a buffer.
    pub struct CpuAccessFlags: u32 {
        /// The CPU can read the buffer.
        const READ = 1 << 0;
        /// The CPU can write the buffer.
        const WRITE = 1 << 1;
    }
}

lattice_bitflags! {
    /// Modifiers for a buffer map.
    pub struct MapFlags: u32 {
        /// The previous contents may be discarded.
        const DISCARD = 1 << 0;
        /// Do not wait for the GPU.
        const DO_NOT_WAIT = 1 << 1;
    }
}
