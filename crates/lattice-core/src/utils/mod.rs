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

//! General-purpose helpers shared by the graphics modules.

pub mod bitflags;
pub mod hash;
pub mod signal;
pub mod string_pool;

pub use self::hash::{combine_unordered, hash_combine, hash_value};
pub use self::signal::ThreadSignal;
pub use self::string_pool::{PooledStr, StringPool};
