// tests/render_command.rs

//! The production renderer against real (scripted) renderer processes.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use stagehand::errors::StagehandError;
use stagehand::plan::{CommandRenderer, StageRenderer};

use stagehand_test_utils::{init_tracing, with_timeout};

/// Write an executable shell script and return its path.
fn script(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

#[tokio::test]
async fn renderer_parses_a_step_list() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let renderer = script(
        &dir,
        "renderer",
        r#"echo '{"steps": [{"id": "discover", "label": "discover nodes"}, {"id": "apply", "label": "apply config"}]}'"#,
    );

    let plan = with_timeout(
        CommandRenderer::new(renderer.to_str().unwrap()).render("cluster.stage.1"),
    )
    .await
    .unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.get(0).unwrap().id, "discover");
    assert_eq!(plan.get(1).unwrap().label, "apply config");
    assert!(!plan.get(0).unwrap().dynamic);
}

#[tokio::test]
async fn renderer_maps_state_errors() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let renderer = script(
        &dir,
        "renderer",
        r#"echo '{"error": "states", "states": ["cluster.foo"], "description": "undefined state"}'; exit 1"#,
    );

    let err = with_timeout(
        CommandRenderer::new(renderer.to_str().unwrap()).render("cluster.stage.1"),
    )
    .await
    .unwrap_err();

    match err {
        StagehandError::StateRendering { states, .. } => {
            assert_eq!(states, vec!["cluster.foo"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn renderer_garbage_failure_becomes_a_stage_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let renderer = script(&dir, "renderer", "echo 'boom' >&2; exit 3");

    let err = with_timeout(
        CommandRenderer::new(renderer.to_str().unwrap()).render("cluster.stage.1"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StagehandError::StageRendering { .. }));
    assert!(err.is_rendering());
}
