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

//! Hash helpers for structural layout hashes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hashes a value with a deterministic (unkeyed) hasher.
///
/// The result is stable for the lifetime of the process, which is all layout
/// hashes need since they are never persisted.
pub fn hash_value<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Folds `value` into `seed`. Order dependent.
pub fn hash_combine(seed: &mut u64, value: u64) {
    *seed ^= value
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

/// Combines a set of hashes so that the result does not depend on their order.
///
/// Each hash is scrambled before being summed, so that structurally similar
/// inputs (e.g. hashes that differ in a single low bit) do not cancel out.
pub fn combine_unordered<I: IntoIterator<Item = u64>>(hashes: I) -> u64 {
    hashes
        .into_iter()
        .map(mix64)
        .fold(0u64, |acc, h| acc.wrapping_add(h))
}

fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_combine_is_order_dependent() {
        let (a, b) = (hash_value("albedo"), hash_value("normal"));
        let mut ab = 0;
        hash_combine(&mut ab, a);
        hash_combine(&mut ab, b);
        let mut ba = 0;
        hash_combine(&mut ba, b);
        hash_combine(&mut ba, a);
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_combine_unordered_ignores_order() {
        let hashes = [hash_value(&1u32), hash_value(&2u32), hash_value(&3u32)];
        let forward = combine_unordered(hashes);
        let reversed = combine_unordered(hashes.iter().rev().copied());
        assert_eq!(forward, reversed);
        assert_ne!(forward, combine_unordered(hashes[..2].iter().copied()));
    }
}
