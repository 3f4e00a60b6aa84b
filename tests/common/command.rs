use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

/// Root tree of the `init_repository_dir` fixture
pub const FIXTURE_TREE_OID: &str = "88484bd9e7919fa9b7dfeb008fb8f6c85743d171";

/// Commit created by the `init_repository_dir` fixture
pub const FIXTURE_COMMIT_OID: &str = "e972be13fc5b660dd06f6de2e96b36a6b93bbcd7";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A repository with `1.txt`, `a/2.txt` and `a/b/3.txt` committed on master
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_bitstore_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    ));

    run_bitstore_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    bitstore_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_bitstore_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("bitstore").expect("Failed to find bitstore binary");
    cmd.current_dir(dir);
    // keep the user's own ignore file out of the picture
    cmd.env("XDG_CONFIG_HOME", dir.join(".no-config"));
    cmd.env_remove("RUST_LOG");
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn bitstore_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_bitstore_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("GIT_AUTHOR_NAME", "fake_user"),
        ("GIT_AUTHOR_EMAIL", "fake_email@email.com"),
        ("GIT_AUTHOR_DATE", "2023-01-01 12:00:00 +0000"), // %Y-%m-%d %H:%M:%S %z
    ]);
    cmd
}

pub fn stdout_of(mut cmd: Command) -> String {
    let output = cmd.assert().success();
    String::from_utf8(output.get_output().stdout.clone()).expect("stdout is not utf-8")
}
