pub mod artifacts;
pub mod build_args;
pub mod config;
pub mod console;
pub mod docker;
pub mod env_file;
pub mod interrupt;
pub mod preset;
pub mod prompts;
pub mod source;
pub mod validation;

pub use build_args::{BuildArgs, BuildMode, BuildSelection, BuildType, derive_build_args};
pub use config::BuilderConfig;
pub use preset::{Preset, PresetStore};
pub use validation::{ValidationReport, validate_preset};
