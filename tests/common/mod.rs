//! Common test utilities for integration tests

#![allow(dead_code)]

use git2::{Repository, Signature, Time};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Initialize an empty repository in a temporary directory
pub fn setup_test_repo() -> (TempDir, Repository) {
    let temp_dir = TempDir::new().unwrap();
    let repo = Repository::init(temp_dir.path()).unwrap();

    // Configure git user for the test repo
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    (temp_dir, repo)
}

/// Write `content` to `name` in the working tree without staging it
pub fn write_file(temp_dir: &TempDir, name: &str, content: &[u8]) {
    let file_path = temp_dir.path().join(name);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();
}

/// Write `content` to `name` and add it to the index
pub fn add_file(repo: &Repository, temp_dir: &TempDir, name: &str, content: &[u8]) {
    write_file(temp_dir, name, content);

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
}

/// Commit the current index on top of HEAD
pub fn commit_index(repo: &Repository, message: &str) {
    let mut index = repo.index().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    // Use a fixed time for signature to avoid CI issues
    let time = Time::new(1_700_000_000, 0);
    let signature = Signature::new("Test User", "test@example.com", &time).unwrap();

    let parent = repo
        .head()
        .ok()
        .and_then(|head| head.target())
        .map(|oid| repo.find_commit(oid).unwrap());
    let parents: Vec<_> = parent.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap();
}

/// Blob content recorded in the index for `name`
pub fn index_content(repo: &Repository, name: &str) -> Vec<u8> {
    let mut index = repo.index().unwrap();
    index.read(true).unwrap();
    let entry = index.get_path(Path::new(name), 0).unwrap();
    repo.find_blob(entry.id).unwrap().content().to_vec()
}

pub fn read(temp_dir: &TempDir, name: &str) -> Vec<u8> {
    fs::read(temp_dir.path().join(name)).unwrap()
}
