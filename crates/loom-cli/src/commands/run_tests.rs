// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn run_errors_without_initialized_project() {
    let dir = tempdir().unwrap();
    let result = run(dir.path().to_path_buf()).await;
    assert!(result.is_err());
}

#[test]
fn project_name_uses_directory_basename() {
    assert_eq!(project_name(Path::new("/work/my-plans")), "my-plans");
}

#[test]
fn project_name_falls_back_to_full_path_for_root() {
    assert_eq!(project_name(Path::new("/")), "/");
}
