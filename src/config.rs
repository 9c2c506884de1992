// Copyright 2024 OctoFHIR Team
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

//! Editor configuration options

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// Configuration shared by type analysis, suggestions and the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Name of the binding that holds the resource being edited
    pub resource_binding: String,

    /// Maximum nesting of function arguments evaluated during analysis
    pub max_analysis_depth: usize,

    /// Capacity of the type cache, 0 disables caching
    pub type_cache_size: usize,

    /// Unit of the default quantity literal offered by suggestions
    pub default_quantity_unit: String,

    /// Whether program typing rejects dependency cycles
    pub detect_cycles: bool,
}

impl EditorConfig {
    /// Parse a configuration from JSON, missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| EditorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_analysis_depth == 0 {
            return Err(EditorError::Config {
                message: "maxAnalysisDepth must be at least 1".to_string(),
            });
        }
        if self.resource_binding.is_empty() {
            return Err(EditorError::Config {
                message: "resourceBinding must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Create a configuration with caching disabled
    pub fn without_cache() -> Self {
        Self {
            type_cache_size: 0,
            ..Self::default()
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            resource_binding: "resource".to_string(),
            max_analysis_depth: 32,
            type_cache_size: 256,
            default_quantity_unit: "seconds".to_string(),
            detect_cycles: false,
        }
    }
}
