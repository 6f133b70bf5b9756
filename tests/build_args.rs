use std::collections::BTreeMap;

use serde_json::{Value, json};
use xaiva_builder::build_args::{
    BuildMode, BuildSelection, BuildType, MEDIA_SOURCE_OVERRIDE, derive_build_args,
};
use xaiva_builder::env_file::EnvOverrides;
use xaiva_builder::preset::Preset;

fn minimal_document() -> Value {
    json!({
        "metadata": {"name": "p1"},
        "base_image": "ubuntu:22.04",
        "python": {"version": "3.10", "version_without_dot": "310"},
        "pytorch": {},
        "tensorrt": {"enabled": false},
        "cuda": {"version": "11.8", "arch": "86"},
        "build_options": {},
        "system_packages": [],
        "environment": {}
    })
}

fn full_document() -> Value {
    let mut document = minimal_document();
    document["pytorch"] = json!({
        "torch_version": "2.1.2",
        "index_url": "https://download.pytorch.org/whl/cu118"
    });
    document["tensorrt"] = json!({
        "enabled": true,
        "required_in_runtime": true,
        "version": "8.6",
        "cuda_compatibility": {"8.6": "11.8"}
    });
    document["build_options"] = json!({
        "ffmpeg_version": "6.1",
        "opencv_version": "4.8.0",
        "xaiva_media_source": {"path": "xaiva-media", "branch": "main"}
    });
    document
}

fn preset(document: &Value) -> Preset {
    Preset::from_value(document).expect("preset should deserialize")
}

fn online() -> BuildSelection {
    BuildSelection::new(BuildMode::Online)
}

#[test]
fn minimal_preset_yields_exactly_the_base_arguments() {
    let args = derive_build_args(
        &preset(&minimal_document()),
        "p1",
        &online(),
        &EnvOverrides::default(),
    );

    let collected: Vec<_> = args.iter().collect();
    assert_eq!(
        collected,
        vec![
            ("BASE_IMAGE", "ubuntu:22.04"),
            ("PRESET_NAME", "p1"),
            ("BUILD_MODE", "online"),
            ("PYTHON_VERSION", "3.10"),
            ("PYTHON_VERSION_WITHOUT_DOT", "310"),
            ("CUDA_ARCH", "86"),
        ]
    );
}

#[test]
fn optional_sections_extend_in_order() {
    let args = derive_build_args(
        &preset(&full_document()),
        "p1",
        &online(),
        &EnvOverrides::default(),
    );

    let keys: Vec<_> = args.keys().skip(6).collect();
    assert_eq!(
        keys,
        vec![
            "PYTORCH_VERSION",
            "PYTORCH_INDEX_URL",
            "TENSORRT_VERSION",
            "FFMPEG_VERSION",
            "OPENCV_VERSION",
            "XAIVA_SOURCE_PATH",
        ]
    );
    assert_eq!(args.get("TENSORRT_VERSION"), Some("8.6"));
    assert_eq!(args.get("XAIVA_SOURCE_PATH"), Some("xaiva-media"));
}

#[test]
fn disabled_tensorrt_is_omitted() {
    let mut document = full_document();
    document["tensorrt"]["enabled"] = json!(false);

    let args = derive_build_args(&preset(&document), "p1", &online(), &EnvOverrides::default());
    assert!(!args.contains_key("TENSORRT_VERSION"));
}

#[test]
fn env_override_wins_over_preset_source_path() {
    let overrides: EnvOverrides = [(MEDIA_SOURCE_OVERRIDE, "/custom/path")]
        .into_iter()
        .collect();

    let args = derive_build_args(&preset(&full_document()), "p1", &online(), &overrides);
    assert_eq!(args.get("XAIVA_SOURCE_PATH"), Some("/custom/path"));
    assert_eq!(args.keys().filter(|k| *k == "XAIVA_SOURCE_PATH").count(), 1);
}

#[test]
fn env_override_applies_without_preset_source() {
    let overrides: EnvOverrides = [(MEDIA_SOURCE_OVERRIDE, "/custom/path")]
        .into_iter()
        .collect();

    let args = derive_build_args(&preset(&minimal_document()), "p1", &online(), &overrides);
    assert_eq!(args.len(), 7);
    assert_eq!(args.get("XAIVA_SOURCE_PATH"), Some("/custom/path"));
}

#[test]
fn derivation_is_deterministic() {
    let preset = preset(&full_document());
    let overrides = EnvOverrides::parse("XAIVA_MEDIA_SOURCE_PATH=/opt/media\n");

    let first = derive_build_args(&preset, "p1", &online(), &overrides);
    let second = derive_build_args(&preset, "p1", &online(), &overrides);

    let as_map = |args: &xaiva_builder::BuildArgs| {
        args.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>()
    };
    assert_eq!(as_map(&first), as_map(&second));
}

#[test]
fn explicit_build_type_follows_the_base_set() {
    let selection = online().with_build_type(Some(BuildType::Runtime));
    let args = derive_build_args(
        &preset(&minimal_document()),
        "p1",
        &selection,
        &EnvOverrides::default(),
    );

    assert_eq!(args.len(), 7);
    assert_eq!(args.keys().nth(6), Some("BUILD_TYPE"));
    assert_eq!(args.get("BUILD_TYPE"), Some("runtime"));
}
