//! Integration tests for the model tooling
//!
//! Builds must be reproducible and verification must catch any drift.

use activity_tree_core::reference::REFERENCE_TREE_JSON;
use activity_tree_core::EngineConfig;
use activity_tree_tool::{build, classify, deploy, export_json, inspect, InputFormat};
use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_reference(dir: &Path) -> Result<std::path::PathBuf> {
    let path = dir.join("trained.json");
    fs::write(&path, REFERENCE_TREE_JSON)?;
    Ok(path)
}

fn gaming_window() -> Vec<f32> {
    let mut features = vec![0.0f32; 30];
    features[27] = 30.0;
    features[10] = 1435.0;
    features[19] = 9000.0;
    features[21] = 1.9;
    features
}

#[test]
fn test_build_is_reproducible() -> Result<()> {
    let dir = tempdir()?;
    let input = write_reference(dir.path())?;
    let config = EngineConfig::default();

    let first = build(&input, InputFormat::Nested, &dir.path().join("a"), &config)?;
    let second = build(&input, InputFormat::Nested, &dir.path().join("b"), &config)?;

    assert_eq!(first.hash, second.hash, "Hash should be identical");
    assert_eq!(fs::read(&first.model_path)?, fs::read(&second.model_path)?);
    assert_eq!(fs::read_to_string(&first.hash_path)?, first.hash);
    assert_eq!(first.nodes, 449);
    assert_eq!(first.depth, 15);
    Ok(())
}

#[test]
fn test_no_names_artifact_is_smaller() -> Result<()> {
    let dir = tempdir()?;
    let input = write_reference(dir.path())?;

    let named = build(&input, InputFormat::Nested, &dir.path().join("named"), &EngineConfig::default())?;

    let mut bare_config = EngineConfig::default();
    bare_config.codec.include_names = false;
    let bare = build(&input, InputFormat::Nested, &dir.path().join("bare"), &bare_config)?;

    assert!(bare.bytes < named.bytes);
    assert_ne!(bare.hash, named.hash);

    let result = classify(&bare.model_path, &gaming_window(), false, &bare_config)?;
    assert_eq!(result.class_index, 5);
    assert_eq!(result.class_name, None);

    let named_header = inspect(&named.model_path, &EngineConfig::default())?;
    assert_eq!(named_header.format_version, 1);
    assert_eq!(named_header.flags, Some(0x0003));
    assert!(named_header.to_string().contains("flags 0x0003"));

    let bare_header = inspect(&bare.model_path, &bare_config)?;
    assert_eq!(bare_header.format_version, 1);
    assert_eq!(bare_header.flags, Some(0));
    assert_eq!(bare_header.class_names, None);
    Ok(())
}

#[test]
fn test_inspect_classify_export() -> Result<()> {
    let dir = tempdir()?;
    let input = write_reference(dir.path())?;
    let config = EngineConfig::default();
    let report = build(&input, InputFormat::Nested, dir.path(), &config)?;

    let inspection = inspect(&report.model_path, &config)?;
    assert_eq!(inspection.encoding, "binary");
    assert_eq!(inspection.num_features, 30);
    assert_eq!(inspection.num_classes, 6);
    assert_eq!(inspection.artifact_hash, report.hash);
    assert_eq!(inspection.model_hash, report.hash);
    assert!(inspection.to_string().contains("GAMING"));

    let traced = classify(&report.model_path, &gaming_window(), true, &config)?;
    assert_eq!(traced.class_index, 5);
    assert_eq!(traced.class_name.as_deref(), Some("GAMING"));
    let trace = traced.trace.as_ref().expect("trace requested");
    assert_eq!(trace.path[0].feature_index, 27);
    assert!(traced.to_string().ends_with("class 5 (GAMING)"));

    let json_path = dir.path().join("model.json");
    let json = export_json(&report.model_path, &json_path, &config)?;
    let from_json = inspect(&json_path, &config)?;
    assert_eq!(from_json.encoding, "json");
    assert_eq!(from_json.format_version, 1);
    assert_eq!(from_json.flags, None);
    assert_eq!(from_json.model_hash, report.hash);
    assert_eq!(fs::read_to_string(&json_path)?, json);
    Ok(())
}

#[test]
fn test_classify_rejects_wrong_length() -> Result<()> {
    let dir = tempdir()?;
    let input = write_reference(dir.path())?;
    let config = EngineConfig::default();
    let report = build(&input, InputFormat::Nested, dir.path(), &config)?;

    let err = classify(&report.model_path, &[1.0, 2.0], false, &config).unwrap_err();
    assert!(format!("{err:#}").contains("30"));
    Ok(())
}

#[test]
fn test_build_sklearn_format() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("sklearn.json");
    fs::write(
        &input,
        r#"{
            "num_features": 2,
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [1, -2, -2],
            "threshold": [0.5, -2.0, -2.0],
            "value": [[5.0, 5.0], [4.0, 1.0], [1.0, 4.0]]
        }"#,
    )?;
    let config = EngineConfig::default();
    let report = build(&input, InputFormat::Sklearn, dir.path(), &config)?;
    assert_eq!(report.nodes, 3);

    assert_eq!(classify(&report.model_path, &[0.0, 0.5], false, &config)?.class_index, 0);
    assert_eq!(classify(&report.model_path, &[0.0, 0.6], false, &config)?.class_index, 1);
    Ok(())
}

#[test]
fn test_verify_deployment() -> Result<()> {
    let dir = tempdir()?;
    let input = write_reference(dir.path())?;
    let config = EngineConfig::default();
    let report = build(&input, InputFormat::Nested, dir.path(), &config)?;

    let deploy_path = dir.path().join("deploy.toml");
    fs::write(
        &deploy_path,
        format!(
            "[model]\npath = {:?}\nexpected_hash = \"{}\"\n",
            report.model_path.display().to_string(),
            report.hash.to_uppercase()
        ),
    )?;
    let verified = deploy::verify(&deploy_path, &config)?;
    assert_eq!(verified.hash, report.hash);
    assert_eq!(verified.nodes, 449);

    let wrong = dir.path().join("wrong.toml");
    fs::write(
        &wrong,
        format!(
            "[model]\npath = {:?}\nexpected_hash = \"{}\"\n",
            report.model_path.display().to_string(),
            "0".repeat(64)
        ),
    )?;
    let err = deploy::verify(&wrong, &config).unwrap_err();
    assert!(err.to_string().contains("mismatch"));

    let missing = dir.path().join("missing.toml");
    fs::write(&missing, "[other]\nkey = 1\n")?;
    assert!(deploy::verify(&missing, &config).is_err());
    Ok(())
}
