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

//! A bump arena for the names referenced by a pipeline's resource layout.
//!
//! The pool is reserved once with the exact number of bytes that will be
//! copied into it (string lengths plus one terminator each), then filled with
//! [`StringPool::copy_string`]. Copies are addressed by [`PooledStr`] handles,
//! which stay valid for as long as the pool lives. Overrunning the reservation
//! is a bug in the code computing the reservation, not a runtime condition.

/// A handle to a string stored in a [`StringPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PooledStr {
    offset: u32,
    len: u32,
}

impl PooledStr {
    /// Length of the string in bytes, without the terminator.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` for a zero-length string.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Contiguous storage for variable-length names with a single owner.
#[derive(Debug, Default)]
pub struct StringPool {
    buffer: String,
    reserved: usize,
}

impl StringPool {
    /// Creates an empty pool with no reservation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves exactly `total_bytes` of storage.
    ///
    /// Must be called once, before the first copy.
    pub fn reserve(&mut self, total_bytes: usize) {
        debug_assert!(
            self.buffer.is_empty(),
            "StringPool::reserve called after strings were copied"
        );
        self.buffer = String::with_capacity(total_bytes);
        self.reserved = total_bytes;
    }

    /// Number of bytes a string occupies in the pool.
    pub fn required_size(s: &str) -> usize {
        s.len() + 1
    }

    /// Copies `src` and its terminator at the cursor and returns its handle.
    pub fn copy_string(&mut self, src: &str) -> PooledStr {
        let offset = self.buffer.len();
        debug_assert!(
            offset + Self::required_size(src) <= self.reserved,
            "StringPool overflow: copying {} bytes with only {} remaining",
            Self::required_size(src),
            self.remaining_size()
        );
        self.buffer.push_str(src);
        self.buffer.push('\0');
        PooledStr {
            offset: offset as u32,
            len: src.len() as u32,
        }
    }

    /// Reads a previously copied string back.
    pub fn get(&self, handle: PooledStr) -> &str {
        let start = handle.offset as usize;
        &self.buffer[start..start + handle.len as usize]
    }

    /// Bytes still available in the reservation.
    pub fn remaining_size(&self) -> usize {
        self.reserved.saturating_sub(self.buffer.len())
    }

    /// Total reserved bytes.
    pub fn reserved_size(&self) -> usize {
        self.reserved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_fills_reservation_exactly() {
        let names = ["g_Albedo", "g_NormalMap", "", "cbCamera"];
        let total: usize = names.iter().map(|n| StringPool::required_size(n)).sum();

        let mut pool = StringPool::new();
        pool.reserve(total);
        let handles: Vec<_> = names.iter().map(|n| pool.copy_string(n)).collect();

        for (name, handle) in names.iter().zip(&handles) {
            assert_eq!(pool.get(*handle), *name);
            assert_eq!(handle.len(), name.len());
        }
        assert_eq!(pool.remaining_size(), 0);
        assert_eq!(pool.reserved_size(), total);
    }

    #[test]
    fn test_empty_pool() {
        let mut pool = StringPool::new();
        pool.reserve(0);
        assert_eq!(pool.remaining_size(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "StringPool overflow")]
    fn test_overflow_is_invariant_violation() {
        let mut pool = StringPool::new();
        pool.reserve(4);
        pool.copy_string("abcd");
    }
}
