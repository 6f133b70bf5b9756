use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Strongly typed view of a preset, produced after structural validation.
#[derive(Debug, Clone, Deserialize)]
pub struct Preset {
    pub metadata: Metadata,
    #[serde(deserialize_with = "scalar")]
    pub base_image: String,
    pub python: PythonSpec,
    #[serde(default)]
    pub pytorch: PytorchSpec,
    #[serde(default)]
    pub tensorrt: TensorRtSpec,
    pub cuda: CudaSpec,
    #[serde(default)]
    pub build_options: BuildOptions,
    #[serde(default)]
    pub system_packages: Vec<Value>,
    #[serde(default)]
    pub environment: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PythonSpec {
    #[serde(deserialize_with = "scalar")]
    pub version: String,
    #[serde(deserialize_with = "scalar")]
    pub version_without_dot: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PytorchSpec {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub torch_version: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub index_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TensorRtSpec {
    #[serde(default, deserialize_with = "truthy")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "truthy")]
    pub required_in_runtime: bool,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CudaSpec {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub version: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub arch: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildOptions {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub ffmpeg_version: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub opencv_version: Option<String>,
    #[serde(default)]
    pub xaiva_media_source: Option<MediaSource>,
}

/// Location and branch of the Xaiva Media checkout consumed by the build.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaSource {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub branch: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MediaSource {
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.branch.is_none() && self.extra.is_empty()
    }
}

impl Preset {
    /// Converts a validated document into the typed model.
    pub fn from_value(value: &Value) -> Result<Self> {
        Preset::deserialize(value).with_context(|| match failing_section(value) {
            Some(section) => format!("Preset section '{section}' does not match the expected schema"),
            None => "Preset does not match the expected schema".to_string(),
        })
    }

    /// The Xaiva Media section, unless it is missing or an empty object.
    pub fn media_source(&self) -> Option<&MediaSource> {
        self.build_options
            .xaiva_media_source
            .as_ref()
            .filter(|source| !source.is_empty())
    }
}

fn failing_section(value: &Value) -> Option<&'static str> {
    fn rejects<T: DeserializeOwned>(value: &Value, section: &str) -> bool {
        value
            .get(section)
            .is_some_and(|section| T::deserialize(section).is_err())
    }

    let sections: [(&'static str, fn(&Value, &str) -> bool); 6] = [
        ("metadata", rejects::<Metadata>),
        ("python", rejects::<PythonSpec>),
        ("pytorch", rejects::<PytorchSpec>),
        ("tensorrt", rejects::<TensorRtSpec>),
        ("cuda", rejects::<CudaSpec>),
        ("build_options", rejects::<BuildOptions>),
    ];
    sections
        .into_iter()
        .find(|(section, rejects)| rejects(value, section))
        .map(|(section, _)| section)
}

/// Renders a JSON scalar the way it reads in the preset file.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// JSON truthiness: null, false, zero and empty containers are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(&value).ok_or_else(|| {
        serde::de::Error::custom(format!("expected a string or number, found {value}"))
    })
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    scalar_to_string(&value).map(Some).ok_or_else(|| {
        serde::de::Error::custom(format!("expected a string or number, found {value}"))
    })
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| is_truthy(&value))
}

/// A preset file as read from disk, before validation.
#[derive(Debug, Clone)]
pub struct PresetEntry {
    pub name: String,
    pub path: PathBuf,
    pub document: Value,
}

impl PresetEntry {
    pub fn description(&self) -> Option<&str> {
        self.document
            .get("metadata")
            .and_then(|m| m.get("description"))
            .and_then(Value::as_str)
    }
}

/// All presets found in the presets directory, keyed and ordered by name.
#[derive(Debug, Default)]
pub struct PresetStore {
    presets: BTreeMap<String, PresetEntry>,
    pub skipped: Vec<String>,
}

const PRESET_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

impl PresetStore {
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("Presets directory not found: {}", dir.display());
        }

        let mut store = PresetStore::default();
        let mut files = Vec::new();
        for ext in PRESET_EXTENSIONS {
            let pattern = dir.join(format!("*.{ext}"));
            let pattern = pattern.to_string_lossy();
            let matches = glob::glob(&pattern)
                .with_context(|| format!("Invalid preset glob pattern: {pattern}"))?;
            for entry in matches {
                match entry {
                    Ok(path) if path.is_file() => files.push(path),
                    Ok(_) => {}
                    Err(err) => store
                        .skipped
                        .push(format!("Failed to read preset entry: {err}")),
                }
            }
        }
        files.sort();

        for path in files {
            debug!(file = %path.display(), "Loading preset");
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let document = match read_document(&path) {
                Ok(document) => document,
                Err(err) => {
                    let message = format!("Failed to load {file_name}: {err:#}");
                    debug!("{message}");
                    store.skipped.push(message);
                    continue;
                }
            };

            let Some(name) = document
                .get("metadata")
                .and_then(|m| m.get("name"))
                .and_then(Value::as_str)
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string)
            else {
                let message = format!("Preset {file_name} has no metadata.name field, skipping");
                debug!("{message}");
                store.skipped.push(message);
                continue;
            };

            if let Some(previous) = store.presets.get(&name) {
                let message = format!(
                    "Preset name '{name}' in {file_name} replaces the one from {}",
                    previous.path.display()
                );
                debug!("{message}");
                store.skipped.push(message);
            }

            store.presets.insert(
                name.clone(),
                PresetEntry {
                    name,
                    path,
                    document,
                },
            );
        }

        Ok(store)
    }

    pub fn get(&self, name: &str) -> Option<&PresetEntry> {
        self.presets.get(name)
    }

    pub fn first(&self) -> Option<&PresetEntry> {
        self.presets.values().next()
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PresetEntry> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read preset file: {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse preset JSON: {}", path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse preset YAML: {}", path.display()))
    }
}
