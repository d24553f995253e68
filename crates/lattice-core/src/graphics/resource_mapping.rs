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

//! Name-to-resource tables used to bind many shader variables at once.

use crate::graphics::traits::{Buffer, Texture};
use std::collections::HashMap;
use std::sync::Arc;

/// A resource that can be bound to a shader variable.
#[derive(Debug, Clone)]
pub enum BoundResource {
    /// A buffer, for uniform and storage buffer variables.
    Buffer(Arc<dyn Buffer>),
    /// A texture, for sampled texture and image variables.
    Texture(Arc<dyn Texture>),
}

impl BoundResource {
    /// Returns `true` if both refer to the same object.
    pub fn ptr_eq(&self, other: &BoundResource) -> bool {
        match (self, other) {
            (BoundResource::Buffer(a), BoundResource::Buffer(b)) => Arc::ptr_eq(a, b),
            (BoundResource::Texture(a), BoundResource::Texture(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Maps shader variable names to resources.
///
/// Array variables are resolved element by element: element `i` of variable
/// `name` is looked up as `name[i]`, element 0 also as plain `name`.
#[derive(Debug, Clone, Default)]
pub struct ResourceMapping {
    entries: HashMap<String, BoundResource>,
}

impl ResourceMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the resource for `name`.
    pub fn insert(&mut self, name: impl Into<String>, resource: BoundResource) {
        self.entries.insert(name.into(), resource);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, resource: BoundResource) -> Self {
        self.insert(name, resource);
        self
    }

    /// Removes the resource for `name`.
    pub fn remove(&mut self, name: &str) -> Option<BoundResource> {
        self.entries.remove(name)
    }

    /// Looks up one element of a (possibly array) variable.
    pub fn resolve(&self, name: &str, array_index: u32) -> Option<&BoundResource> {
        let element = format!("{name}[{array_index}]");
        self.entries.get(&element).or_else(|| {
            if array_index == 0 {
                self.entries.get(name)
            } else {
                None
            }
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
