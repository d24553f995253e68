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

//! Shader source lookup through a list of search directories.

use crate::graphics::error::{ConfigError, ShaderError};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Resolves shader file names to source text.
pub trait ShaderSourceFactory: Debug + Send + Sync {
    /// Loads the source named `name`.
    fn load_source(&self, name: &str) -> Result<String, ShaderError>;
}

/// Settings of [`DefaultShaderSourceFactory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderSourceSettings {
    /// Semicolon-separated list of directories, searched in order before the
    /// current directory.
    pub search_directories: String,
    /// How many times an open failing with "too many open files" is retried.
    pub open_retry_limit: u32,
    /// Delay between two open attempts, in milliseconds.
    pub open_retry_delay_ms: u64,
}

impl Default for ShaderSourceSettings {
    fn default() -> Self {
        Self {
            search_directories: String::new(),
            open_retry_limit: 20,
            open_retry_delay_ms: 50,
        }
    }
}

impl ShaderSourceSettings {
    /// Parses settings from a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Looks shader files up in the configured directories, then in the
/// current directory.
#[derive(Debug, Clone)]
pub struct DefaultShaderSourceFactory {
    search_directories: Vec<String>,
    settings: ShaderSourceSettings,
}

impl DefaultShaderSourceFactory {
    /// Creates a factory from its settings.
    pub fn new(settings: ShaderSourceSettings) -> Self {
        let mut search_directories: Vec<String> = settings
            .search_directories
            .split(';')
            .filter(|dir| !dir.is_empty())
            .map(|dir| {
                if dir.ends_with('/') || dir.ends_with('\\') {
                    dir.to_string()
                } else {
                    format!("{dir}/")
                }
            })
            .collect();
        search_directories.push(String::new());
        Self {
            search_directories,
            settings,
        }
    }

    /// The directories searched, in order. The last one is always empty.
    pub fn search_directories(&self) -> &[String] {
        &self.search_directories
    }
}

impl ShaderSourceFactory for DefaultShaderSourceFactory {
    fn load_source(&self, name: &str) -> Result<String, ShaderError> {
        let name = name.trim_start_matches(['/', '\\']);
        for dir in &self.search_directories {
            let path = format!("{dir}{name}");
            if !Path::new(&path).is_file() {
                continue;
            }
            let delay = Duration::from_millis(self.settings.open_retry_delay_ms);
            let mut file = open_with_retry(Path::new(&path), self.settings.open_retry_limit, delay)
                .map_err(|e| ShaderError::LoadError {
                    path: path.clone(),
                    source_error: e.to_string(),
                })?;
            let mut source = String::new();
            file.read_to_string(&mut source)
                .map_err(|e| ShaderError::LoadError {
                    path: path.clone(),
                    source_error: e.to_string(),
                })?;
            log::debug!("Loaded shader source '{path}'");
            return Ok(source);
        }

        log::error!("Failed to find shader source file '{name}'");
        Err(ShaderError::LoadError {
            path: name.to_string(),
            source_error: "file not found in any search directory".to_string(),
        })
    }
}

#[cfg(unix)]
const TOO_MANY_OPEN_FILES: i32 = 24; // EMFILE
#[cfg(windows)]
const TOO_MANY_OPEN_FILES: i32 = 4; // ERROR_TOO_MANY_OPEN_FILES
#[cfg(not(any(unix, windows)))]
const TOO_MANY_OPEN_FILES: i32 = -1;

fn is_too_many_open_files(err: &io::Error) -> bool {
    err.raw_os_error() == Some(TOO_MANY_OPEN_FILES)
}

/// Opens `path`, retrying while the process is out of file handles.
pub fn open_with_retry(path: &Path, retry_limit: u32, delay: Duration) -> io::Result<File> {
    retry_on_exhaustion(retry_limit, delay, || File::open(path), |attempt| {
        log::warn!(
            "Failed to open '{}': too many open files. Retrying ({attempt}/{retry_limit})",
            path.display()
        );
    })
}

fn retry_on_exhaustion<T>(
    retry_limit: u32,
    delay: Duration,
    mut op: impl FnMut() -> io::Result<T>,
    mut on_retry: impl FnMut(u32),
) -> io::Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Err(e) if is_too_many_open_files(&e) && attempt < retry_limit => {
                attempt += 1;
                on_retry(attempt);
                thread::sleep(delay);
            }
            result => return result,
        }
    }
}
