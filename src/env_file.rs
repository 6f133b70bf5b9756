use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

/// `KEY=VALUE` pairs read from the project's `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    values: BTreeMap<String, String>,
}

impl EnvOverrides {
    /// Parses `.env` content with dotenvy's rules; lines it rejects are skipped.
    pub fn parse(content: &str) -> Self {
        Self::from_entries(dotenvy::from_read_iter(content.as_bytes()))
    }

    fn from_entries(entries: impl IntoIterator<Item = dotenvy::Result<(String, String)>>) -> Self {
        let mut values = BTreeMap::new();
        for entry in entries {
            match entry {
                Ok((key, value)) => {
                    values.insert(key, value);
                }
                Err(err) => debug!("Ignoring env line: {err}"),
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvOverrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Reads `env_file`. A missing or unreadable file yields empty overrides plus warnings.
pub fn load_env_overrides(env_file: &Path, template: &Path) -> (EnvOverrides, Vec<String>) {
    let mut warnings = Vec::new();

    if !env_file.exists() {
        warnings.push(format!(
            ".env file not found. Using template: {}",
            template.display()
        ));
        if template.exists() {
            warnings.push(format!(
                "Run: cp {} {}",
                template.display(),
                env_file.display()
            ));
        }
        return (EnvOverrides::default(), warnings);
    }

    match dotenvy::from_path_iter(env_file) {
        Ok(entries) => (EnvOverrides::from_entries(entries), warnings),
        Err(err) => {
            warnings.push(format!("Failed to load .env file: {err}"));
            (EnvOverrides::default(), warnings)
        }
    }
}
