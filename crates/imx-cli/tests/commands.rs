//! Exit codes of the `build` and `check` handlers.

use std::path::Path;

use imx_build::BuildConfig;
use imx_cli::build::{run_build, BuildArgs};
use imx_cli::check::{run_check, CheckArgs};
use imx_cli::{PathArgs, EXIT_DATASET, EXIT_OK, EXIT_OPERATIONAL};
use serde_json::json;

fn paths(root: &Path) -> PathArgs {
    PathArgs {
        features: Some(root.join("features")),
        resources: Some(root.join("resources")),
        dist: Some(root.join("dist")),
        i18n: Some(root.join("i18n/en.yaml")),
        schemas: None,
    }
}

fn seed(root: &Path) {
    std::fs::create_dir_all(root.join("features")).unwrap();
    std::fs::create_dir_all(root.join("resources")).unwrap();
    let feature = json!({
        "type": "Feature",
        "id": "area",
        "properties": {},
        "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
    });
    let resource = json!({
        "id": "area-tiles",
        "featureId": "area",
        "name": "Area tiles",
        "type": "tms",
        "url": "https://t.example.com/{zoom}/{x}/{y}.png"
    });
    std::fs::write(root.join("features/area.geojson"), feature.to_string()).unwrap();
    std::fs::write(root.join("resources/area.json"), resource.to_string()).unwrap();
}

#[test]
fn check_fails_until_build_has_run() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let check = CheckArgs { paths: paths(dir.path()) };
    let build = BuildArgs { paths: paths(dir.path()) };

    assert_eq!(run_check(&check, BuildConfig::default()).unwrap(), EXIT_DATASET);
    assert!(!dir.path().join("dist").exists());

    assert_eq!(run_build(&build, BuildConfig::default()).unwrap(), EXIT_OK);
    assert!(dir.path().join("dist/features.min.json").is_file());
    assert!(dir.path().join("i18n/en.yaml").is_file());

    assert_eq!(run_check(&check, BuildConfig::default()).unwrap(), EXIT_OK);
}

#[test]
fn dataset_error_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    std::fs::write(
        dir.path().join("resources/orphan.json"),
        json!({"id": "orphan", "name": "Orphan", "type": "wms", "url": "https://w"}).to_string(),
    )
    .unwrap();

    let build = BuildArgs { paths: paths(dir.path()) };
    assert_eq!(run_build(&build, BuildConfig::default()).unwrap(), EXIT_DATASET);
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn missing_schema_dir_exits_with_two() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let mut args = paths(dir.path());
    args.schemas = Some(dir.path().join("no-schemas"));

    let build = BuildArgs { paths: args };
    assert_eq!(run_build(&build, BuildConfig::default()).unwrap(), EXIT_OPERATIONAL);
}

#[test]
fn non_utf8_document_is_a_dataset_error() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    std::fs::write(dir.path().join("resources/latin1.json"), b"{\"name\": \"M\xfcnchen\"}").unwrap();

    let build = BuildArgs { paths: paths(dir.path()) };
    assert_eq!(run_build(&build, BuildConfig::default()).unwrap(), EXIT_DATASET);
}
