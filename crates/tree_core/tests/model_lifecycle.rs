//! Build → save → load → hot reload, the way a deployment uses the engine

use activity_tree_core::{
    load_model_from_path, EngineConfig, FileSource, ModelBuilder, ModelHandle, SklearnTree,
    TrainedModel, TrainedNode, TreeError,
};
use std::fs;
use tempfile::tempdir;

const SKLEARN_JSON: &str = r#"{
    "num_features": 3,
    "class_names": ["still", "walk", "run"],
    "children_left":  [1, -1, 3, -1, -1],
    "children_right": [2, -1, 4, -1, -1],
    "feature":        [0, -2, 2, -2, -2],
    "threshold":      [0.5, -2.0, 12.25, -2.0, -2.0],
    "value": [
        [10.0, 10.0, 10.0],
        [9.0, 1.0, 0.0],
        [1.0, 9.0, 10.0],
        [0.0, 8.0, 1.0],
        [1.0, 1.0, 9.0]
    ]
}"#;

fn nested_equivalent() -> TrainedModel {
    let mut trained = TrainedModel::new(
        3,
        3,
        TrainedNode::split(
            0,
            0.5,
            TrainedNode::leaf(0),
            TrainedNode::split(2, 12.25, TrainedNode::leaf(1), TrainedNode::leaf(2)),
        ),
    );
    trained.class_names = Some(vec!["still".into(), "walk".into(), "run".into()]);
    trained
}

#[test]
fn test_sklearn_and_nested_build_identical_models() {
    let builder = ModelBuilder::default();
    let from_sklearn = builder
        .build_sklearn(SklearnTree::from_json_str(SKLEARN_JSON).unwrap())
        .unwrap();
    let from_nested = builder.build(&nested_equivalent()).unwrap();

    assert_eq!(from_sklearn, from_nested);
    assert_eq!(from_sklearn.hash_hex(), from_nested.hash_hex());
    assert_eq!(from_sklearn.classify(&[1.0, 0.0, 20.0]).unwrap(), 2);
    assert_eq!(from_sklearn.class_name(2), Some("run"));
}

#[test]
fn test_save_and_load_both_encodings() {
    let dir = tempdir().unwrap();
    let model = ModelBuilder::default().build(&nested_equivalent()).unwrap();
    let config = EngineConfig::default();

    let bin_path = dir.path().join("model.bin");
    let json_path = dir.path().join("model.json");
    model.save_binary(&bin_path).unwrap();
    model.save_json(&json_path).unwrap();

    let from_bin = load_model_from_path(&bin_path, &config.limits).unwrap();
    let from_json = load_model_from_path(&json_path, &config.limits).unwrap();
    assert_eq!(from_bin, model);
    assert_eq!(from_json, model);
}

#[test]
fn test_handle_reload_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let config = EngineConfig::default();
    let builder = ModelBuilder::from_config(&config);

    let first = builder.build(&nested_equivalent()).unwrap();
    first.save_binary(&path).unwrap();
    let handle = ModelHandle::new(
        load_model_from_path(&path, &config.limits).unwrap(),
        config.limits,
    );
    assert_eq!(handle.classify(&[0.0, 0.0, 0.0]).unwrap(), 0);

    let mut swapped = nested_equivalent();
    swapped.tree = TrainedNode::split(0, 0.5, TrainedNode::leaf(2), TrainedNode::leaf(1));
    builder.build(&swapped).unwrap().save_binary(&path).unwrap();

    let source = FileSource::new(&path);
    handle.reload_from_source(&source).unwrap();
    assert_eq!(handle.classify(&[0.0, 0.0, 0.0]).unwrap(), 2);
    assert_eq!(handle.generation(), 1);

    // a damaged file on disk must not replace the active model
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        handle.reload_from_source(&source),
        Err(TreeError::CorruptModel(_))
    ));
    assert_eq!(handle.classify(&[0.0, 0.0, 0.0]).unwrap(), 2);
    assert_eq!(handle.generation(), 1);

    fs::remove_file(&path).unwrap();
    assert!(matches!(
        handle.reload_from_source(&source),
        Err(TreeError::Io(_))
    ));
    assert_eq!(handle.current().class_name(2), Some("run"));
}

#[test]
fn test_config_limits_flow_into_builder() {
    let config = EngineConfig::from_toml_str("[limits]\nmax_depth = 1\n").unwrap();
    let err = ModelBuilder::from_config(&config)
        .build(&nested_equivalent())
        .unwrap_err();
    assert!(matches!(err, TreeError::InvalidModel(_)));
    assert!(!err.is_per_inference());
}

#[test]
fn test_deep_nested_document_builds_under_raised_limit() {
    let config = EngineConfig::from_toml_str("[limits]\nmax_depth = 100\n").unwrap();

    let mut tree = TrainedNode::leaf(0);
    for _ in 0..70 {
        tree = TrainedNode::split(0, 1.0, tree, TrainedNode::leaf(1));
    }
    let trained = TrainedModel::new(1, 2, tree);

    let dir = tempdir().unwrap();
    let path = dir.path().join("deep.json");
    fs::write(&path, serde_json::to_string(&trained).unwrap()).unwrap();

    let parsed = TrainedModel::from_json_file(&path).unwrap();
    assert_eq!(parsed, trained);

    let model = ModelBuilder::from_config(&config).build(&parsed).unwrap();
    assert_eq!(model.table().depth(), 70);
    assert_eq!(model.classify(&[0.5]).unwrap(), 0);
    assert_eq!(model.classify(&[2.0]).unwrap(), 1);

    // default limits still reject it, as a depth error
    assert!(matches!(
        ModelBuilder::default().build(&parsed),
        Err(TreeError::InvalidModel(reason)) if reason.contains("deeper")
    ));
}
