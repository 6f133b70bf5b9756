use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Directory,
    File,
}

const EXPECTED_ITEMS: &[(&str, ItemKind)] = &[
    ("wheels", ItemKind::Directory),
    ("sources", ItemKind::Directory),
    ("requirements.txt", ItemKind::File),
];

/// Lists what is missing from `<artifacts_dir>/<preset_name>`. Warnings only; the build may still proceed.
pub fn check_preset_artifacts(artifacts_dir: &Path, preset_name: &str) -> Vec<String> {
    let preset_dir = artifacts_dir.join(preset_name);
    if !preset_dir.exists() {
        return vec![format!(
            "Artifacts directory not found: {}",
            preset_dir.display()
        )];
    }

    let mut warnings = Vec::new();
    for (name, kind) in EXPECTED_ITEMS {
        let path = preset_dir.join(name);
        if !path.exists() {
            warnings.push(format!("Missing: {}", path.display()));
        } else if *kind == ItemKind::Directory && !path.is_dir() {
            warnings.push(format!("Not a directory: {}", path.display()));
        } else if *kind == ItemKind::File && !path.is_file() {
            warnings.push(format!("Not a file: {}", path.display()));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_preset_directory_short_circuits() {
        let temp = tempdir().unwrap();
        let warnings = check_preset_artifacts(temp.path(), "p1");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Artifacts directory not found"));
    }

    #[test]
    fn complete_layout_has_no_warnings() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("p1");
        fs::create_dir_all(dir.join("wheels")).unwrap();
        fs::create_dir_all(dir.join("sources")).unwrap();
        fs::write(dir.join("requirements.txt"), "numpy\n").unwrap();

        assert!(check_preset_artifacts(temp.path(), "p1").is_empty());
    }

    #[test]
    fn wrong_kinds_are_reported() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("p1");
        fs::create_dir_all(dir.join("requirements.txt")).unwrap();
        fs::write(dir.join("wheels"), "").unwrap();

        let warnings = check_preset_artifacts(temp.path(), "p1");
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].starts_with("Not a directory"));
        assert!(warnings[1].starts_with("Missing"));
        assert!(warnings[2].starts_with("Not a file"));
    }
}
