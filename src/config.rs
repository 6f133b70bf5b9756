use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Image repository every generated tag lives under.
pub const IMAGE_NAMESPACE: &str = "xaiva-kit";

/// Fixed project layout, resolved once at startup and passed to every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    pub project_root: PathBuf,
    pub presets_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub env_file: PathBuf,
    pub env_template: PathBuf,
    pub dockerfile: PathBuf,
    pub docker_bin: String,
}

impl BuilderConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            presets_dir: project_root.join("presets"),
            artifacts_dir: project_root.join("artifacts"),
            env_file: project_root.join(".env"),
            env_template: project_root.join("env.template"),
            dockerfile: project_root.join("docker").join("Dockerfile"),
            docker_bin: resolve_docker_binary(),
            project_root,
        }
    }

    /// Builds the configuration for `root`, made absolute against the working directory.
    pub fn discover(root: &Path) -> Result<Self> {
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()
                .context("Failed to determine current directory")?
                .join(root)
        };
        let root = root.canonicalize().unwrap_or(root);
        Ok(Self::new(root))
    }

    pub fn with_docker_bin(mut self, docker_bin: impl Into<String>) -> Self {
        self.docker_bin = docker_bin.into();
        self
    }

    /// Resolves a companion path from a preset: absolute paths are kept, relative ones hang off the project root.
    pub fn resolve_project_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.project_root.join(candidate)
        }
    }
}

pub fn resolve_docker_binary() -> String {
    std::env::var("DOCKER_BIN").unwrap_or_else(|_| "docker".to_string())
}
