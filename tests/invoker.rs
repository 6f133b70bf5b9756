use tempfile::tempdir;
use xaiva_builder::build_args::{BuildArgs, BuildType};
use xaiva_builder::config::BuilderConfig;
use xaiva_builder::docker::DockerBuild;

fn sample_args() -> BuildArgs {
    let mut args = BuildArgs::new();
    args.set("BASE_IMAGE", "ubuntu:22.04");
    args.set("PRESET_NAME", "p1");
    args
}

#[test]
fn dry_run_never_spawns() {
    let temp = tempdir().unwrap();
    let config = BuilderConfig::new(temp.path()).with_docker_bin("/nonexistent/docker");

    let build = DockerBuild::new(&config, "xaiva-kit:p1", BuildType::Dev, sample_args());
    assert_eq!(build.invoke(true), 0);
}

// Single test so no other thread forks while the scripts are being written.
#[cfg(unix)]
#[test]
fn process_statuses_are_passed_through() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use xaiva_builder::docker::{INTERRUPTED_STATUS, LAUNCH_FAILURE_STATUS};

    let temp = tempdir().unwrap();
    let write_script = |name: &str, body: &str| {
        let path = temp.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    };

    let ok = write_script("ok.sh", "exit 0");
    let failing = write_script("failing.sh", "exit 3");
    let interrupted = write_script("interrupted.sh", "kill -INT $$\nsleep 5");
    let record = write_script(
        "record.sh",
        &format!("printf '%s\\n' \"$@\" > {}", temp.path().join("argv.txt").display()),
    );

    let run = |program: &std::path::Path| {
        let config = BuilderConfig::new(temp.path()).with_docker_bin(program.to_string_lossy());
        DockerBuild::new(&config, "xaiva-kit:p1", BuildType::Dev, sample_args()).invoke(false)
    };

    assert_eq!(run(&temp.path().join("missing.sh")), LAUNCH_FAILURE_STATUS);
    assert_eq!(run(&ok), 0);
    assert_eq!(run(&failing), 3);
    assert_eq!(run(&interrupted), INTERRUPTED_STATUS);

    assert_eq!(run(&record), 0);
    let argv = fs::read_to_string(temp.path().join("argv.txt")).unwrap();
    let argv: Vec<_> = argv.lines().collect();
    let dockerfile = temp.path().join("docker").join("Dockerfile");
    assert_eq!(&argv[..3], &["build", "-f", dockerfile.to_str().unwrap()]);
    assert_eq!(&argv[3..7], &["-t", "xaiva-kit:p1", "--target", "dev"]);
    assert_eq!(
        &argv[7..11],
        &["--build-arg", "BASE_IMAGE=ubuntu:22.04", "--build-arg", "PRESET_NAME=p1"]
    );
    assert_eq!(argv[11], temp.path().to_str().unwrap());
}
