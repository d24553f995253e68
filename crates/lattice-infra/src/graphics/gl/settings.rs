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

//! Device settings and capabilities of the GL backend.

use anyhow::Context;
use lattice_core::graphics::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The flavour of the GL implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GlDeviceType {
    /// Desktop OpenGL.
    #[default]
    OpenGl,
    /// OpenGL ES.
    OpenGlEs,
}

/// What the GL implementation supports. Queried by the loader at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlDeviceCaps {
    /// `GL_ARB_separate_shader_objects` (or GL 4.1 / ES 3.1).
    pub separable_programs: bool,
    /// Desktop GL or GLES.
    pub device_type: GlDeviceType,
}

impl Default for GlDeviceCaps {
    fn default() -> Self {
        Self {
            separable_programs: true,
            device_type: GlDeviceType::OpenGl,
        }
    }
}

/// User-facing settings of a [`GlRenderDevice`](super::GlRenderDevice).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlDeviceSettings {
    /// Number of immediate contexts exposed as command queues.
    pub command_queue_count: u32,
    /// Always link all stages into one program, even if separable programs
    /// are supported.
    pub force_non_separable_programs: bool,
    /// Source of the fragment shader injected into graphics pipelines that
    /// have none.
    pub stub_fragment_shader_source: String,
}

impl Default for GlDeviceSettings {
    fn default() -> Self {
        Self {
            command_queue_count: 1,
            force_non_separable_programs: false,
            stub_fragment_shader_source: "void main(){}".to_string(),
        }
    }
}

impl GlDeviceSettings {
    /// Parses settings from a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON settings file.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read GL settings from '{}'", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Failed to parse GL settings '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings =
            GlDeviceSettings::from_json_str(r#"{ "force_non_separable_programs": true }"#)
                .unwrap();
        assert!(settings.force_non_separable_programs);
        assert_eq!(settings.command_queue_count, 1);
        assert_eq!(settings.stub_fragment_shader_source, "void main(){}");
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let err = GlDeviceSettings::from_json_str("{ command_queue_count: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = GlDeviceSettings::from_json_file("does/not/exist.json").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn test_caps_round_trip() {
        let caps = GlDeviceCaps {
            separable_programs: false,
            device_type: GlDeviceType::OpenGlEs,
        };
        let json = serde_json::to_string(&caps).unwrap();
        assert_eq!(serde_json::from_str::<GlDeviceCaps>(&json).unwrap(), caps);
    }
}
