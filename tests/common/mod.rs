use std::fs;
use std::path::{Path, PathBuf};

pub fn dataset_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/dataset")
}

pub fn vrd_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/vrd_sample.json")
}

/// Copies the fixture dataset into `dest` so a test can modify it.
pub fn copy_dataset(dest: &Path) {
    let src = dataset_dir();
    fs::create_dir_all(dest.join("by-id")).expect("create by-id dir");
    for name in [
        "image_data.json",
        "synsets.json",
        "region_descriptions.json",
        "question_answers.json",
    ] {
        fs::copy(src.join(name), dest.join(name)).expect("copy dataset file");
    }
    for entry in fs::read_dir(src.join("by-id")).expect("read by-id dir") {
        let entry = entry.expect("dir entry");
        fs::copy(entry.path(), dest.join("by-id").join(entry.file_name())).expect("copy graph file");
    }
}
