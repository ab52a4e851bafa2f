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

//! The `Turntable.toml` configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use turntable_compositor::{FontStrategy, LayoutOptions};
use turntable_core::RenderSettings;

use crate::error::ConfigError;

/// The Blender side of the render job protocol, run when no `renderer.script` is set.
pub const RENDER_SCRIPT: &str = include_str!("../scripts/turntable_render.py");

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "Turntable.toml";

/// Top-level configuration.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurntableConfig {
    /// Square output size of each view, in pixels.
    pub resolution: u32,
    /// Keep the per-view rasters after a successful composite.
    pub keep_intermediate: bool,
    /// Delete the per-view rasters even when the asset fails.
    pub cleanup_on_failure: bool,
    /// Assets processed concurrently by a batch.
    pub workers: usize,
    /// Where per-view rasters are written. Defaults to the model's directory.
    pub render_dir: Option<PathBuf>,
    /// The external renderer.
    pub renderer: RendererConfig,
    /// Sheet layout.
    pub layout: LayoutOptions,
    /// Font lookup.
    pub fonts: FontConfig,
}

impl Default for TurntableConfig {
    fn default() -> Self {
        Self {
            resolution: 1000,
            keep_intermediate: false,
            cleanup_on_failure: false,
            workers: 1,
            render_dir: None,
            renderer: RendererConfig::default(),
            layout: LayoutOptions::default(),
            fonts: FontConfig::default(),
        }
    }
}

/// `[renderer]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Program looked up on `PATH`.
    pub program: String,
    /// Arguments placed before the script.
    pub args: Vec<String>,
    /// Blender script driving the render. Unset runs the built-in script. A relative
    /// path in a config file is resolved against that file's directory.
    pub script: Option<PathBuf>,
    /// Seconds before a render is killed. `0` disables the deadline.
    pub timeout_secs: u64,
    /// Path-tracing samples per pixel.
    pub samples: u32,
    /// Seconds before an OBJ conversion is killed. `0` disables the deadline.
    pub convert_timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: "blender".to_owned(),
            args: vec!["--background".to_owned(), "--factory-startup".to_owned()],
            script: None,
            timeout_secs: 1800,
            samples: 64,
            convert_timeout_secs: 300,
        }
    }
}

impl RendererConfig {
    /// Full argument list placed before `-- --job <file>`.
    pub fn invocation_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        match &self.script {
            Some(script) => {
                args.push("--python".to_owned());
                args.push(script.to_string_lossy().into_owned());
            }
            None => {
                args.push("--python-expr".to_owned());
                args.push(RENDER_SCRIPT.to_owned());
            }
        }
        args
    }

    /// The render deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        seconds(self.timeout_secs)
    }

    /// The conversion deadline, if any.
    pub fn convert_timeout(&self) -> Option<Duration> {
        seconds(self.convert_timeout_secs)
    }
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// `[fonts]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font files tried before the built-in list.
    pub candidates: Vec<PathBuf>,
}

impl FontConfig {
    /// The lookup order for these settings.
    pub fn strategy(&self) -> FontStrategy {
        FontStrategy::with_preferred(self.candidates.iter().cloned())
    }
}

impl TurntableConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })?;
        if let Some(script) = config.renderer.script.take() {
            let base = path.parent().unwrap_or(Path::new(""));
            config.renderer.script = Some(base.join(script));
        }
        config.validate()?;
        log::info!("Loaded configuration from '{}'", path.display());
        Ok(config)
    }

    /// Loads `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists, else the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    log::debug!("No '{DEFAULT_CONFIG_FILE}' found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Rejects values no run could use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution == 0 {
            return Err(ConfigError::Invalid("resolution must be positive".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if !(1..=100).contains(&self.layout.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "layout.jpeg_quality must be in 1..=100, got {}",
                self.layout.jpeg_quality
            )));
        }
        if self.renderer.program.trim().is_empty() {
            return Err(ConfigError::Invalid("renderer.program is empty".into()));
        }
        Ok(())
    }

    /// Render settings for this configuration.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            samples: self.renderer.samples,
            resolution: self.resolution,
            ..RenderSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = TurntableConfig::from_toml_str("").unwrap();
        assert_eq!(config, TurntableConfig::default());
        assert_eq!(config.resolution, 1000);
        assert_eq!(config.layout.padding, 10);
        assert_eq!(config.renderer.timeout(), Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = TurntableConfig::from_toml_str(
            r#"
            resolution = 512
            workers = 4
            keep_intermediate = true

            [renderer]
            program = "/opt/blender/blender"
            timeout_secs = 0

            [layout]
            padding = 4
            jpeg_quality = 80

            [fonts]
            candidates = ["fonts/NotoSansSC.otf"]
            "#,
        )
        .unwrap();

        assert_eq!(config.resolution, 512);
        assert_eq!(config.workers, 4);
        assert!(config.keep_intermediate);
        assert_eq!(config.renderer.program, "/opt/blender/blender");
        assert_eq!(config.renderer.timeout(), None);
        assert_eq!(config.renderer.samples, 64);
        assert_eq!(config.layout.padding, 4);
        assert_eq!(config.layout.title_height, 40);
        assert_eq!(
            config.fonts.strategy().candidates()[0],
            PathBuf::from("fonts/NotoSansSC.otf")
        );
        assert_eq!(config.render_settings().resolution, 512);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            TurntableConfig::from_toml_str("resolution = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TurntableConfig::from_toml_str("[layout]\njpeg_quality = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TurntableConfig::from_toml_str("resolution = \"big\""),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_default_renderer_runs_the_built_in_script() {
        let args = RendererConfig::default().invocation_args();
        assert_eq!(args[..2], ["--background", "--factory-startup"]);
        assert_eq!(args[2], "--python-expr");
        assert!(args[3].contains("--job"));
        assert!(args.iter().all(|arg| !arg.ends_with(".py")));
    }

    #[test]
    fn test_relative_script_resolves_against_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Turntable.toml");
        std::fs::write(&path, "[renderer]\nscript = \"tools/render.py\"\n").unwrap();

        let config = TurntableConfig::load(&path).unwrap();
        let script = dir.path().join("tools").join("render.py");
        assert_eq!(config.renderer.script.as_deref(), Some(script.as_path()));
        let args = config.renderer.invocation_args();
        assert_eq!(
            args[2..],
            ["--python".to_owned(), script.to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = TurntableConfig::load(Path::new("/nonexistent/Turntable.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
