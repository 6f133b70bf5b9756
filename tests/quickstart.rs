use std::path::Path;

use xaiva_builder::preset::PresetStore;
use xaiva_builder::validation::load_validated;

#[test]
fn bundled_presets_are_valid() {
    let store = PresetStore::load(Path::new("presets")).expect("bundled presets should load");
    assert!(!store.is_empty());
    assert!(store.skipped.is_empty(), "skipped: {:?}", store.skipped);

    for entry in store.entries() {
        if let Err(report) = load_validated(&entry.document) {
            panic!("{} should pass validation: {:?}", entry.name, report.errors);
        }
    }
}
