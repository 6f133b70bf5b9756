//! Branch reconciliation for the Xaiva Media checkout consumed by the build.
//!
//! Only the external `git` primitives are used: `rev-parse`, `fetch`,
//! `checkout` and `pull`. Deciding what to do on a mismatch is left to the
//! caller, which may ask the user.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::config::BuilderConfig;
use crate::preset::Preset;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_SOURCE_PATH: &str = "xaiva-media";
const REMOTE: &str = "origin";

/// Where the checkout lives and which branch the build expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTarget {
    pub path: PathBuf,
    pub branch: String,
    pub branch_from_cli: bool,
}

/// Picks the target branch: CLI override, then preset, then `main`. `None` when the preset has no source section.
pub fn resolve_media_target(
    config: &BuilderConfig,
    preset: &Preset,
    override_branch: Option<&str>,
) -> Option<MediaTarget> {
    let source = preset.media_source()?;
    let (branch, branch_from_cli) = match override_branch {
        Some(branch) => (branch.to_string(), true),
        None => (
            source
                .branch
                .clone()
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            false,
        ),
    };
    let path = source.path.as_deref().unwrap_or(DEFAULT_SOURCE_PATH);

    Some(MediaTarget {
        path: config.resolve_project_path(path),
        branch,
        branch_from_cli,
    })
}

/// What to do when the checkout is on the wrong branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchAction {
    Switch,
    Continue,
    Cancel,
}

impl MismatchAction {
    pub const ALL: [MismatchAction; 3] = [
        MismatchAction::Switch,
        MismatchAction::Continue,
        MismatchAction::Cancel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MismatchAction::Switch => "Switch to target branch (recommended)",
            MismatchAction::Continue => "Continue with current branch",
            MismatchAction::Cancel => "Cancel build",
        }
    }
}

/// A local git working tree.
#[derive(Debug, Clone)]
pub struct GitCheckout {
    path: PathBuf,
}

impl GitCheckout {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Xaiva Media source not found: {}", path.display());
        }
        if !path.join(".git").exists() {
            bail!("Not a git repository: {}", path.display());
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_branch(&self) -> Result<String> {
        let output = self.run_checked(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Fetches from `origin`, streaming git's progress to the terminal.
    pub fn fetch(&self) -> Result<()> {
        let status = self
            .git(&["fetch", REMOTE])
            .status()
            .with_context(|| format!("Failed to run git fetch in {}", self.path.display()))?;
        if !status.success() {
            bail!("git fetch {REMOTE} failed with {status}");
        }
        Ok(())
    }

    pub fn checkout(&self, branch: &str) -> Result<()> {
        self.run_checked(&["checkout", branch])
            .map(|_| ())
            .with_context(|| format!("Failed to switch to branch '{branch}'"))
    }

    pub fn pull(&self, branch: &str) -> Result<()> {
        self.run_checked(&["pull", REMOTE, branch]).map(|_| ())
    }

    fn git(&self, args: &[&str]) -> Command {
        debug!(repo = %self.path.display(), ?args, "Running git");
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.path);
        cmd
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self
            .git(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output)
    }
}
