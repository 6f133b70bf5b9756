use serde::Serialize;
use serde_json::Value;

use crate::preset::{Preset, is_truthy, scalar_to_string};

#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Structural kind a top-level preset field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Object,
    String,
    List,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::Object => value.is_object(),
            FieldKind::String => value.is_string(),
            FieldKind::List => value.is_array(),
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            FieldKind::Object => "dict",
            FieldKind::String => "str",
            FieldKind::List => "list",
        }
    }
}

pub const REQUIRED_FIELDS: &[(&str, FieldKind)] = &[
    ("metadata", FieldKind::Object),
    ("base_image", FieldKind::String),
    ("python", FieldKind::Object),
    ("pytorch", FieldKind::Object),
    ("tensorrt", FieldKind::Object),
    ("cuda", FieldKind::Object),
    ("build_options", FieldKind::Object),
    ("system_packages", FieldKind::List),
    ("environment", FieldKind::Object),
];

/// Checks a raw preset document; an empty error list means the preset is usable.
pub fn validate_preset(document: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (field, kind) in REQUIRED_FIELDS {
        match document.get(field) {
            None => report
                .errors
                .push(format!("Missing required field: {field}")),
            Some(value) if !kind.matches(value) => report
                .errors
                .push(format!("Field {field} must be {}", kind.type_name())),
            Some(_) => {}
        }
    }

    if let (Some(tensorrt), Some(cuda)) = (document.get("tensorrt"), document.get("cuda")) {
        report.merge(validate_cuda_compatibility(tensorrt, cuda));
    }

    report
}

fn validate_cuda_compatibility(tensorrt: &Value, cuda: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let flag = |key: &str| tensorrt.get(key).is_some_and(is_truthy);
    if !(flag("enabled") && flag("required_in_runtime")) {
        return report;
    }

    let Some(trt_version) = tensorrt.get("version").and_then(Value::as_str) else {
        return report;
    };
    let Some(expected) = tensorrt
        .get("cuda_compatibility")
        .and_then(|table| table.get(trt_version))
    else {
        report.warnings.push(format!(
            "TensorRT {trt_version} has no cuda_compatibility entry, CUDA version not checked"
        ));
        return report;
    };

    let cuda_version = cuda
        .get("version")
        .and_then(scalar_to_string)
        .unwrap_or_default();

    match scalar_to_string(expected) {
        Some(prefix) if cuda_version.starts_with(&prefix) => {}
        Some(prefix) => report.errors.push(format!(
            "TensorRT {trt_version} requires CUDA {prefix}, but preset uses CUDA {cuda_version}"
        )),
        None => report.errors.push(format!(
            "TensorRT {trt_version} compatibility entry must be a version string, found {expected}"
        )),
    }

    report
}

/// Validates the document and, when clean, converts it into the typed model.
/// Non-fatal findings come back alongside the preset.
pub fn load_validated(document: &Value) -> Result<(Preset, Vec<String>), ValidationReport> {
    let mut report = validate_preset(document);
    if !report.is_ok() {
        return Err(report);
    }
    match Preset::from_value(document) {
        Ok(preset) => Ok((preset, report.warnings)),
        Err(err) => {
            report.errors.push(format!("{err:#}"));
            Err(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_document_reports_every_field() {
        let report = validate_preset(&json!("not a preset"));
        assert_eq!(report.errors.len(), REQUIRED_FIELDS.len());
    }

    #[test]
    fn non_object_sections_skip_the_compatibility_check() {
        let report = validate_preset(&json!({"tensorrt": "yes", "cuda": 12}));
        assert!(report.errors.contains(&"Field tensorrt must be dict".to_string()));
        assert!(report.errors.contains(&"Field cuda must be dict".to_string()));
        assert!(!report.errors.iter().any(|e| e.contains("requires CUDA")));
    }

    #[test]
    fn unlisted_tensorrt_version_is_a_warning() {
        let report = validate_preset(&json!({
            "tensorrt": {
                "enabled": true,
                "required_in_runtime": true,
                "version": "10.0",
                "cuda_compatibility": {"8.6": "11.8"}
            },
            "cuda": {"version": "12.1"}
        }));
        assert!(!report.errors.iter().any(|e| e.contains("TensorRT")));
        assert_eq!(
            report.warnings,
            vec!["TensorRT 10.0 has no cuda_compatibility entry, CUDA version not checked".to_string()]
        );
    }
}
