use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use tracing::{debug, info};

use crate::build_args::{BuildArgs, BuildType};
use crate::config::{BuilderConfig, IMAGE_NAMESPACE};
use crate::console;
use crate::interrupt;

/// Status reported when the user interrupts the build.
pub const INTERRUPTED_STATUS: i32 = 130;
/// Status reported when docker cannot be started at all.
pub const LAUNCH_FAILURE_STATUS: i32 = 1;

/// Deterministic image tag for a preset; an explicit build type becomes a suffix.
pub fn image_tag(preset_name: &str, build_type: Option<BuildType>) -> String {
    match build_type {
        Some(build_type) => format!("{IMAGE_NAMESPACE}:{preset_name}-{build_type}"),
        None => format!("{IMAGE_NAMESPACE}:{preset_name}"),
    }
}

/// A fully assembled `docker build` invocation.
#[derive(Debug, Clone)]
pub struct DockerBuild {
    program: String,
    dockerfile: PathBuf,
    image_tag: String,
    target: BuildType,
    args: BuildArgs,
    context: PathBuf,
}

impl DockerBuild {
    pub fn new(
        config: &BuilderConfig,
        image_tag: impl Into<String>,
        target: BuildType,
        args: BuildArgs,
    ) -> Self {
        Self {
            program: config.docker_bin.clone(),
            dockerfile: config.dockerfile.clone(),
            image_tag: image_tag.into(),
            target,
            args,
            context: config.project_root.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments after the program name, in the order docker receives them.
    pub fn arguments(&self) -> Vec<OsString> {
        let mut argv: Vec<OsString> = vec![
            "build".into(),
            "-f".into(),
            self.dockerfile.clone().into(),
            "-t".into(),
            self.image_tag.clone().into(),
            "--target".into(),
            self.target.as_str().into(),
        ];
        for (key, value) in self.args.iter() {
            argv.push("--build-arg".into());
            argv.push(format!("{key}={value}").into());
        }
        argv.push(self.context.clone().into());
        argv
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(
                self.arguments()
                    .iter()
                    .map(|arg| arg.to_string_lossy().to_string()),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the build (or only prints it on a dry run) and returns the process status.
    pub fn invoke(&self, dry_run: bool) -> i32 {
        console::print_section("Docker Build Command");
        console::print_detail(&self.command_line());

        if dry_run {
            console::print_success("Dry run mode - command not executed");
            return 0;
        }

        console::print_section("Building Docker Image");
        console::print_detail("This may take a while...");
        println!();

        debug!(program = %self.program, "Spawning docker build");
        let (result, interrupted) = interrupt::while_child_runs(|| {
            Command::new(&self.program)
                .args(self.arguments())
                .current_dir(&self.context)
                .status()
        });

        match result {
            Ok(status) => {
                let code = exit_code(status, interrupted);
                if code == INTERRUPTED_STATUS {
                    println!();
                    console::print_warning("Build cancelled by user");
                }
                info!(code, "docker build finished");
                code
            }
            Err(err) => {
                console::print_error(&format!("Failed to run docker build: {err}"));
                LAUNCH_FAILURE_STATUS
            }
        }
    }
}

fn exit_code(status: ExitStatus, interrupted: bool) -> i32 {
    if interrupted {
        return INTERRUPTED_STATUS;
    }
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        const SIGINT: i32 = 2;
        if let Some(signal) = status.signal() {
            return if signal == SIGINT {
                INTERRUPTED_STATUS
            } else {
                128 + signal
            };
        }
    }
    LAUNCH_FAILURE_STATUS
}
