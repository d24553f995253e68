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

//! Defines the hierarchy of error types for the graphics subsystem.

use crate::graphics::api::ShaderType;
use std::fmt;

/// An error related to loading or compiling a shader.
#[derive(Debug)]
pub enum ShaderError {
    /// The shader source could not be loaded.
    LoadError {
        /// The name of the source that failed to load.
        path: String,
        /// The underlying I/O error.
        source_error: String,
    },
    /// The native compiler rejected the shader.
    CompilationError {
        /// The shader name.
        label: String,
        /// The compiler log.
        details: String,
    },
    /// The shader create info names neither inline code nor a file.
    MissingSource {
        /// The shader name.
        label: String,
    },
    /// A file source was given without a source factory to resolve it.
    MissingSourceFactory {
        /// The requested file name.
        path: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::LoadError { path, source_error } => {
                write!(f, "Failed to load shader source from '{path}': {source_error}")
            }
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
            ShaderError::MissingSource { label } => {
                write!(f, "Shader '{label}' has no source")
            }
            ShaderError::MissingSourceFactory { path } => {
                write!(
                    f,
                    "Shader source '{path}' is a file but no source factory was provided"
                )
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// A fatal error raised while constructing a pipeline state.
#[derive(Debug)]
pub enum PipelineError {
    /// A shader was bound to a stage slot of a different type.
    InvalidShaderType {
        /// The pipeline name.
        pipeline: String,
        /// The slot the shader was bound to.
        expected: ShaderType,
        /// The type the shader actually has.
        actual: ShaderType,
    },
    /// A compute pipeline was described without a compute shader.
    MissingComputeShader {
        /// The pipeline name.
        pipeline: String,
    },
    /// A graphics pipeline was described without any shader.
    NoShaders {
        /// The pipeline name.
        pipeline: String,
    },
    /// The native program failed to link.
    LinkFailed {
        /// The pipeline name.
        pipeline: String,
        /// The native linker log.
        log: String,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidShaderType {
                pipeline,
                expected,
                actual,
            } => write!(
                f,
                "Pipeline '{pipeline}': a {actual} shader cannot be bound to the {expected} stage"
            ),
            PipelineError::MissingComputeShader { pipeline } => {
                write!(f, "Pipeline '{pipeline}': compute shader is not provided")
            }
            PipelineError::NoShaders { pipeline } => {
                write!(
                    f,
                    "Pipeline '{pipeline}': there must be at least one shader in the pipeline state"
                )
            }
            PipelineError::LinkFailed { pipeline, log } => {
                write!(f, "Pipeline '{pipeline}': failed to link shader program:\n{log}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error related to the creation or use of a GPU object.
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A pipeline-specific error occurred.
    Pipeline(PipelineError),
    /// The owning device has already been destroyed.
    DeviceLost,
    /// An object of an unexpected backend was passed in.
    BackendMismatch(&'static str),
    /// An error originating from the native backend.
    BackendError(String),
    /// An access fell outside the bounds of a resource.
    OutOfBounds,
    /// A resource of the wrong kind was bound to a shader variable.
    InvalidBinding {
        /// The variable name.
        variable: String,
        /// What the variable expects.
        expected: &'static str,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::DeviceLost => write!(f, "The owning device no longer exists."),
            ResourceError::BackendMismatch(expected) => {
                write!(f, "Object does not belong to the {expected} backend.")
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::InvalidBinding { variable, expected } => {
                write!(f, "Shader variable '{variable}' expects a {expected}.")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

/// An error reported by the texture upload engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// A buffer was recycled before its GPU copy was scheduled.
    RecycleBeforeCopyScheduled,
    /// A subresource was accessed while the buffer is not mapped.
    NotMapped {
        /// Mip level.
        mip: u32,
        /// Array slice.
        slice: u32,
    },
    /// Mip or slice is outside the buffer description.
    InvalidSubresource {
        /// Mip level.
        mip: u32,
        /// Array slice.
        slice: u32,
    },
    /// More bytes were written than the subresource holds.
    SubresourceOverflow {
        /// Bytes written.
        len: usize,
        /// Capacity of the subresource.
        capacity: usize,
    },
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::RecycleBeforeCopyScheduled => write!(
                f,
                "Upload buffer must be recycled only after its copy has been scheduled on the GPU"
            ),
            UploadError::NotMapped { mip, slice } => {
                write!(f, "Subresource (mip {mip}, slice {slice}) is not mapped")
            }
            UploadError::InvalidSubresource { mip, slice } => {
                write!(f, "Subresource (mip {mip}, slice {slice}) does not exist")
            }
            UploadError::SubresourceOverflow { len, capacity } => {
                write!(f, "Writing {len} bytes into a {capacity}-byte subresource")
            }
        }
    }
}

impl std::error::Error for UploadError {}

/// An error raised while loading settings.
#[derive(Debug)]
pub enum ConfigError {
    /// The settings document could not be parsed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "Invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::InvalidShaderType {
            pipeline: "Opaque".to_string(),
            expected: ShaderType::Vertex,
            actual: ShaderType::Pixel,
        };
        assert_eq!(
            err.to_string(),
            "Pipeline 'Opaque': a pixel shader cannot be bound to the vertex stage"
        );

        let err = PipelineError::MissingComputeShader {
            pipeline: "Cull".to_string(),
        };
        assert_eq!(err.to_string(), "Pipeline 'Cull': compute shader is not provided");
    }

    #[test]
    fn test_resource_error_wraps_pipeline_error() {
        let err: ResourceError = PipelineError::NoShaders {
            pipeline: "Empty".to_string(),
        }
        .into();
        assert!(matches!(err, ResourceError::Pipeline(PipelineError::NoShaders { .. })));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_upload_error_display() {
        assert_eq!(
            UploadError::NotMapped { mip: 2, slice: 1 }.to_string(),
            "Subresource (mip 2, slice 1) is not mapped"
        );
    }
}
