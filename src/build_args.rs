use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::env_file::EnvOverrides;
use crate::preset::Preset;

/// Environment override key that replaces the preset's Xaiva Media path.
pub const MEDIA_SOURCE_OVERRIDE: &str = "XAIVA_MEDIA_SOURCE_PATH";

/// How packages are sourced during the image build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BuildMode {
    #[default]
    Online,
    Offline,
    Auto,
}

impl BuildMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Online => "online",
            BuildMode::Offline => "offline",
            BuildMode::Auto => "auto",
        }
    }

    pub fn is_supported(self) -> bool {
        matches!(self, BuildMode::Online)
    }

    /// Only online builds work today; everything else falls back to it.
    pub fn resolve(self) -> BuildMode {
        BuildMode::Online
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purpose of the image; selects the Dockerfile target stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BuildType {
    Runtime,
    #[default]
    Dev,
}

impl BuildType {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildType::Runtime => "runtime",
            BuildType::Dev => "dev",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildSelection {
    pub mode: BuildMode,
    pub build_type: Option<BuildType>,
}

impl BuildSelection {
    pub fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            build_type: None,
        }
    }

    pub fn with_build_type(mut self, build_type: Option<BuildType>) -> Self {
        self.build_type = build_type;
        self
    }

    pub fn target_stage(&self) -> BuildType {
        self.build_type.unwrap_or_default()
    }
}

/// Ordered `--build-arg` set. Keys are unique; re-setting a key keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildArgs {
    entries: Vec<(String, String)>,
}

impl BuildArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flattens a validated preset into docker build arguments.
pub fn derive_build_args(
    preset: &Preset,
    preset_name: &str,
    selection: &BuildSelection,
    overrides: &EnvOverrides,
) -> BuildArgs {
    let mut args = BuildArgs::new();
    args.set("BASE_IMAGE", &preset.base_image);
    args.set("PRESET_NAME", preset_name);
    args.set("BUILD_MODE", selection.mode.as_str());
    args.set("PYTHON_VERSION", &preset.python.version);
    args.set(
        "PYTHON_VERSION_WITHOUT_DOT",
        &preset.python.version_without_dot,
    );
    args.set("CUDA_ARCH", &preset.cuda.arch);

    if let Some(build_type) = selection.build_type {
        args.set("BUILD_TYPE", build_type.as_str());
    }

    if let Some(version) = &preset.pytorch.torch_version {
        args.set("PYTORCH_VERSION", version);
    }
    if let Some(url) = &preset.pytorch.index_url {
        args.set("PYTORCH_INDEX_URL", url);
    }

    if preset.tensorrt.enabled
        && let Some(version) = &preset.tensorrt.version
    {
        args.set("TENSORRT_VERSION", version);
    }

    let options = &preset.build_options;
    if let Some(version) = &options.ffmpeg_version {
        args.set("FFMPEG_VERSION", version);
    }
    if let Some(version) = &options.opencv_version {
        args.set("OPENCV_VERSION", version);
    }
    if let Some(path) = preset.media_source().and_then(|source| source.path.as_ref()) {
        args.set("XAIVA_SOURCE_PATH", path);
    }

    if let Some(path) = overrides.get(MEDIA_SOURCE_OVERRIDE) {
        args.set("XAIVA_SOURCE_PATH", path);
    }

    args
}
