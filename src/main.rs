use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, prelude::*};
use xaiva_builder::artifacts::check_preset_artifacts;
use xaiva_builder::build_args::{BuildMode, BuildSelection, BuildType, derive_build_args};
use xaiva_builder::config::BuilderConfig;
use xaiva_builder::console::{
    print_detail, print_error, print_header, print_info, print_section, print_stat,
    print_success, print_warning,
};
use xaiva_builder::docker::{DockerBuild, image_tag};
use xaiva_builder::env_file::load_env_overrides;
use xaiva_builder::interrupt;
use xaiva_builder::preset::{Preset, PresetEntry, PresetStore};
use xaiva_builder::prompts::Prompter;
use xaiva_builder::source::{GitCheckout, MismatchAction, resolve_media_target};
use xaiva_builder::validation::load_validated;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = configure_tracing() {
        eprintln!("warning: failed to initialise logging: {err}");
    }
    interrupt::install();

    match run(cli) {
        Ok(code) => exit_code(code),
        Err(err) => {
            print_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn configure_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(())
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn run(cli: Cli) -> Result<i32> {
    print_header("XaivaKit - Build Driver");

    let config = BuilderConfig::discover(&cli.project_root)?;
    debug!(root = %config.project_root.display(), "Resolved project layout");

    let store = match PresetStore::load(&config.presets_dir) {
        Ok(store) => store,
        Err(err) => {
            print_error(&format!("{err:#}"));
            return Ok(1);
        }
    };
    for message in &store.skipped {
        print_warning(message);
    }

    if store.is_empty() {
        print_error("No presets found!");
        print_detail(&format!(
            "Please add preset JSON files to: {}",
            config.presets_dir.display()
        ));
        return Ok(1);
    }
    print_success(&format!("Loaded {} preset(s)", store.len()));

    if cli.list_presets {
        list_presets(&store);
        return Ok(0);
    }

    let interactive = !cli.non_interactive;
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    let entry = match &cli.preset {
        Some(name) => match store.get(name) {
            Some(entry) => entry,
            None => {
                print_error(&format!("Preset not found: {name}"));
                print_detail(&format!("Available presets: {}", store.names().join(", ")));
                return Ok(1);
            }
        },
        None if !interactive => {
            let Some(entry) = store.first() else {
                return Ok(1);
            };
            print_info(&format!("Using default preset: {}", entry.name));
            entry
        }
        None => match select_preset(&store, &mut prompter) {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Preset selection aborted: {err:#}");
                println!("Build cancelled by user");
                return Ok(0);
            }
        },
    };
    let preset_name = entry.name.as_str();

    print_section(&format!("Validating preset: {preset_name}"));
    let preset = match load_validated(&entry.document) {
        Ok((preset, warnings)) => {
            for warning in &warnings {
                print_warning(warning);
            }
            preset
        }
        Err(report) => {
            print_error("Preset validation failed:");
            for error in &report.errors {
                print_detail(&format!("- {error}"));
            }
            return Ok(1);
        }
    };
    print_success("Preset is valid");

    if !check_media_branch(
        &config,
        &preset,
        interactive,
        cli.xaiva_branch.as_deref(),
        &mut prompter,
    )? {
        print_error("Xaiva Media branch check failed");
        return Ok(1);
    }

    let warnings = check_preset_artifacts(&config.artifacts_dir, preset_name);
    if !warnings.is_empty() {
        print_warning("Artifacts check:");
        for warning in &warnings {
            print_detail(&format!("- {warning}"));
        }
        if interactive
            && !prompter
                .confirm("\nContinue anyway? (y/n) [n]: ", false)
                .unwrap_or(false)
        {
            println!("Build cancelled");
            return Ok(0);
        }
    }

    if !cli.build_mode.is_supported() {
        print_warning(&format!(
            "Build mode '{}' is not yet supported, using 'online' mode",
            cli.build_mode
        ));
    }
    let build_mode = cli.build_mode.resolve();
    if interactive {
        print_build_mode_info(build_mode);
    }

    let (overrides, env_warnings) = load_env_overrides(&config.env_file, &config.env_template);
    for warning in &env_warnings {
        print_warning(warning);
    }

    let selection = BuildSelection::new(build_mode).with_build_type(cli.build_type);
    let tag = image_tag(preset_name, cli.build_type);

    if interactive && !cli.dry_run && !confirm_build(preset_name, &selection, &tag, &mut prompter)? {
        println!("Build cancelled");
        return Ok(0);
    }

    let args = derive_build_args(&preset, preset_name, &selection, &overrides);
    info!(preset = %preset_name, args = args.len(), "Derived build arguments");

    let code = DockerBuild::new(&config, tag.clone(), selection.target_stage(), args)
        .invoke(cli.dry_run);

    if code == 0 {
        if !cli.dry_run {
            print_success("Build completed successfully!");
            println!();
            println!("Image tag: {tag}");
            println!();
            println!("Run with:");
            print_detail(&format!("docker run --rm -it --gpus all {tag}"));
        }
    } else {
        print_error(&format!("Build failed with exit code {code}"));
    }

    Ok(code)
}

fn list_presets(store: &PresetStore) {
    print_section("Available Presets");
    for entry in store.entries() {
        print_detail(&format!("• {}", entry.name));
        if let Some(description) = entry.description().filter(|d| !d.is_empty()) {
            print_detail(&format!("  {description}"));
        }
    }
}

fn select_preset<'a, R: BufRead, W: Write>(
    store: &'a PresetStore,
    prompter: &mut Prompter<R, W>,
) -> Result<&'a PresetEntry> {
    print_section("Available Presets");
    let entries: Vec<_> = store.entries().collect();
    for (idx, entry) in entries.iter().enumerate() {
        print_detail(&format!("{}. {}", idx + 1, entry.name));
        print_detail(&format!(
            "   {}",
            entry.description().unwrap_or("No description")
        ));
    }

    let idx = prompter.select(
        &format!("\nSelect preset (1-{}): ", entries.len()),
        entries.len(),
    )?;
    Ok(entries[idx])
}

fn check_media_branch<R: BufRead, W: Write>(
    config: &BuilderConfig,
    preset: &Preset,
    interactive: bool,
    override_branch: Option<&str>,
    prompter: &mut Prompter<R, W>,
) -> Result<bool> {
    let Some(target) = resolve_media_target(config, preset, override_branch) else {
        print_warning("No xaiva_media_source configuration found in preset");
        return Ok(true);
    };
    if target.branch_from_cli {
        print_info(&format!("Using CLI override branch: {}", target.branch));
    }

    print_section("Xaiva Media Branch Check");
    print_stat("Source path", &target.path.display().to_string());
    print_stat("Target branch", &target.branch);

    let checkout = match GitCheckout::open(&target.path) {
        Ok(checkout) => checkout,
        Err(err) => {
            print_error(&err.to_string());
            print_detail("Xaiva Media source must be an existing git repository for branch management");
            return Ok(false);
        }
    };

    let current = match checkout.current_branch() {
        Ok(branch) => branch,
        Err(err) => {
            print_error(&format!("Git command failed: {err:#}"));
            return Ok(false);
        }
    };
    print_stat("Current branch", &current);

    if current == target.branch {
        print_success("Already on target branch");
        return Ok(true);
    }

    print_warning("Branch mismatch detected!");
    print_stat("Expected", &target.branch);
    print_stat("Current", &current);

    if !interactive {
        print_error("Cannot switch branches in non-interactive mode");
        return Ok(false);
    }

    println!();
    println!("Options:");
    for (idx, action) in MismatchAction::ALL.iter().enumerate() {
        print_detail(&format!("{}. {}", idx + 1, action.label()));
    }
    let choice = match prompter.select_with_default(
        "\nSelect option (1-3) [1]: ",
        MismatchAction::ALL.len(),
        0,
    ) {
        Ok(idx) => MismatchAction::ALL[idx],
        Err(err) => {
            debug!("Branch prompt aborted: {err:#}");
            MismatchAction::Cancel
        }
    };

    match choice {
        MismatchAction::Switch => switch_branch(&checkout, &target.branch),
        MismatchAction::Continue => {
            print_warning("Continuing with current branch");
            print_detail("Note: This may cause build inconsistencies");
            Ok(true)
        }
        MismatchAction::Cancel => {
            println!("Build cancelled by user");
            Ok(false)
        }
    }
}

fn switch_branch(checkout: &GitCheckout, branch: &str) -> Result<bool> {
    println!();
    println!("Switching to branch '{branch}'...");

    if let Err(err) = checkout.fetch() {
        print_error(&format!("Git command failed: {err:#}"));
        return Ok(false);
    }
    if let Err(err) = checkout.checkout(branch) {
        print_error(&format!("{err:#}"));
        return Ok(false);
    }
    print_success(&format!("Switched to branch: {branch}"));

    match checkout.pull(branch) {
        Ok(()) => print_success("Updated to latest commit"),
        Err(err) => {
            warn!(repo = %checkout.path().display(), "git pull failed: {err:#}");
            print_warning("Failed to pull latest changes, continuing with current state");
        }
    }
    Ok(true)
}

fn print_build_mode_info(build_mode: BuildMode) {
    print_section("Build Mode");
    match build_mode {
        BuildMode::Online => {
            println!("Online Mode");
            print_detail("Downloading packages directly from internet");
            print_detail("Internet connection required for build");
            print_detail("Offline mode will be available once dependency sync is implemented");
        }
        other => println!("{other}"),
    }
}

fn confirm_build<R: BufRead, W: Write>(
    preset_name: &str,
    selection: &BuildSelection,
    tag: &str,
    prompter: &mut Prompter<R, W>,
) -> Result<bool> {
    print_section("Build Summary");
    print_stat("Preset", preset_name);
    print_stat("Build mode", selection.mode.as_str());
    print_stat("Build type", selection.target_stage().as_str());
    print_stat("Image tag", tag);

    match prompter.confirm("\nProceed with build? (y/n) [y]: ", true) {
        Ok(answer) => Ok(answer),
        Err(err) => {
            debug!("Build confirmation aborted: {err:#}");
            Ok(false)
        }
    }
}

#[derive(Parser)]
#[command(
    name = "xaiva-build",
    version,
    about = "XaivaKit - Interactive Build Driver",
    after_help = "Examples:\n  \
        xaiva-build\n      Interactive mode - prompts for preset\n  \
        xaiva-build --preset ubuntu22.04-cuda11.8-torch2.1 --non-interactive\n      Fully non-interactive build\n  \
        xaiva-build --preset ubuntu22.04-cuda11.8-torch2.1 --xaiva-branch develop\n      Build with specific Xaiva Media branch\n  \
        xaiva-build --list-presets\n      List available presets and exit"
)]
struct Cli {
    /// Preset name to use (skips preset selection)
    #[arg(long)]
    preset: Option<String>,
    /// Non-interactive mode (uses defaults)
    #[arg(long)]
    non_interactive: bool,
    /// List available presets and exit
    #[arg(long)]
    list_presets: bool,
    /// Show docker build command without executing
    #[arg(long)]
    dry_run: bool,
    /// Build mode (currently only 'online' is supported)
    #[arg(long = "build-mode", value_enum, default_value_t = BuildMode::Online)]
    build_mode: BuildMode,
    /// Dockerfile target stage; also appended to the image tag
    #[arg(long = "build-type", value_enum)]
    build_type: Option<BuildType>,
    /// Override Xaiva Media branch (overrides preset setting)
    #[arg(long = "xaiva-branch")]
    xaiva_branch: Option<String>,
    /// Project root containing presets/, artifacts/ and docker/
    #[arg(long = "project-root", default_value = ".")]
    project_root: PathBuf,
}
