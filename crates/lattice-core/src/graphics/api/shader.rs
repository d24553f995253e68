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

//! Shader creation descriptors.

use super::enums::ShaderType;
use crate::graphics::shader_source::ShaderSourceFactory;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Describes a shader object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderDesc<'a> {
    /// An optional debug name.
    pub name: Option<Cow<'a, str>>,
    /// The stage this shader runs at.
    pub shader_type: ShaderType,
}

impl<'a> ShaderDesc<'a> {
    /// Creates an unnamed description for the given stage.
    pub fn new(shader_type: ShaderType) -> Self {
        Self {
            name: None,
            shader_type,
        }
    }

    /// Sets the debug name.
    pub fn with_name(mut self, name: impl Into<Cow<'a, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The debug name, or an empty string.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Detaches the description from borrowed data.
    pub fn into_owned(self) -> ShaderDesc<'static> {
        ShaderDesc {
            name: self.name.map(|n| Cow::Owned(n.into_owned())),
            shader_type: self.shader_type,
        }
    }
}

/// Source language of a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShaderSourceLanguage {
    /// Backend default.
    #[default]
    Default,
    /// GLSL.
    Glsl,
    /// HLSL.
    Hlsl,
}

/// Where the source text of a shader comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource<'a> {
    /// Inline source code.
    Code(Cow<'a, str>),
    /// A file resolved through a [`ShaderSourceFactory`].
    File(Cow<'a, str>),
}

/// Everything a device needs to create a shader.
#[derive(Debug, Clone)]
pub struct ShaderCreateInfo<'a> {
    /// Shader description.
    pub desc: ShaderDesc<'a>,
    /// Source text or file.
    pub source: ShaderSource<'a>,
    /// Source language.
    pub source_language: ShaderSourceLanguage,
    /// Entry point name.
    pub entry_point: Cow<'a, str>,
    /// Resolves [`ShaderSource::File`] sources.
    pub source_factory: Option<&'a dyn ShaderSourceFactory>,
}

impl<'a> ShaderCreateInfo<'a> {
    /// Create info for inline source code with a `main` entry point.
    pub fn from_code(desc: ShaderDesc<'a>, code: impl Into<Cow<'a, str>>) -> Self {
        Self {
            desc,
            source: ShaderSource::Code(code.into()),
            source_language: ShaderSourceLanguage::Default,
            entry_point: Cow::Borrowed("main"),
            source_factory: None,
        }
    }

    /// Create info for a file resolved by `factory`.
    pub fn from_file(
        desc: ShaderDesc<'a>,
        path: impl Into<Cow<'a, str>>,
        factory: &'a dyn ShaderSourceFactory,
    ) -> Self {
        Self {
            desc,
            source: ShaderSource::File(path.into()),
            source_language: ShaderSourceLanguage::Default,
            entry_point: Cow::Borrowed("main"),
            source_factory: Some(factory),
        }
    }
}
