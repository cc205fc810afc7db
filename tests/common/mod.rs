//! Shared helpers for integration tests

#![allow(dead_code)]

pub mod class_builder;

use std::fs;
use std::path::{Path, PathBuf};

/// Helper to get the fixtures directory path
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// pkg.A (empty), pkg.B (overrides), pkg.C (instance field)
pub fn scenario_fixture() -> PathBuf {
    fixtures_dir().join("tostring-scenario")
}

/// Maven-style module: sources under src/main/java, plugin configured in pom.xml
pub fn model_fixture() -> PathBuf {
    fixtures_dir().join("model-hierarchy")
}

/// Write a class file at its package path below `root`
pub fn write_class(root: &Path, internal_name: &str, bytes: Vec<u8>) {
    let path = root.join(format!("{internal_name}.class"));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}
