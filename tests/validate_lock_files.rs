use std::path::Path;

use deplock::{Deplock, LockFileHandling};
use pretty_assertions::assert_eq;

const RESOLUTION: &str = r#"
[[scopes]]
name = "compileClasspath"

[[scopes.components]]
group = "org.slf4j"
module = "slf4j-api"
version = "1.7.25"

[[scopes.components]]
project = ":core"

[[scopes]]
name = "testRuntimeClasspath"

[[scopes.components]]
group = "org.slf4j"
module = "slf4j-api"
version = "1.7.25"

[[scopes.components]]
group = "junit"
module = "junit"
version = "4.12"
"#;

fn setup(lock_files: &[(&str, &str)]) -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("resolution.toml"), RESOLUTION).unwrap();
    let locks = root.path().join("dependency-locks");
    std::fs::create_dir_all(&locks).unwrap();
    for (scope, contents) in lock_files {
        std::fs::write(locks.join(format!("{scope}.lockfile")), contents).unwrap();
    }
    root
}

fn locked_lines(root: &Path, scope: &str) -> Vec<String> {
    std::fs::read_to_string(root.join("dependency-locks").join(format!("{scope}.lockfile")))
        .unwrap()
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

#[tokio::test]
async fn first_run_creates_lock_files() {
    let root = setup(&[]);
    let deplock = Deplock::builder().root(root.path()).try_build().unwrap();
    let plan = deplock.validate(false).await.unwrap();
    assert_eq!(plan.pending_writes(), 2);

    assert_eq!(
        locked_lines(root.path(), "compileClasspath"),
        vec!["org.slf4j:slf4j-api:1.7.25"]
    );
    assert_eq!(
        locked_lines(root.path(), "testRuntimeClasspath"),
        vec!["junit:junit:4.12", "org.slf4j:slf4j-api:1.7.25"]
    );

    let second = deplock.validate(false).await.unwrap();
    assert_eq!(second.pending_writes(), 0);
}

#[tokio::test]
async fn outdated_lock_fails_and_is_left_alone() {
    let lock = "# comment\norg.slf4j:slf4j-api:1.7.20\n";
    let root = setup(&[("compileClasspath", lock)]);
    let deplock = Deplock::builder().root(root.path()).try_build().unwrap();

    let error = deplock.validate(false).await.unwrap_err();
    assert_eq!(
        error.to_string(),
        "Scope compileClasspath: Dependency lock out of date:\n\
         \tlock expected 'org.slf4j:slf4j-api:1.7.20' but resolution result was 'org.slf4j:slf4j-api:1.7.25'"
    );
    let contents =
        std::fs::read_to_string(root.path().join("dependency-locks/compileClasspath.lockfile"))
            .unwrap();
    assert_eq!(contents, lock);
    assert!(!root
        .path()
        .join("dependency-locks/testRuntimeClasspath.lockfile")
        .exists());
}

#[tokio::test]
async fn upgrade_modules_from_config_file() {
    let root = setup(&[("compileClasspath", "org.slf4j:slf4j-api:1.7.20\n")]);
    std::fs::write(
        root.path().join("deplock.toml"),
        "[locking]\nupgrade = [\"org.slf4j:slf4j-api\"]\n",
    )
    .unwrap();
    let deplock = Deplock::builder().root(root.path()).try_build().unwrap();
    assert_eq!(deplock.settings().upgrade_modules.len(), 1);

    deplock.validate(false).await.unwrap();
    assert_eq!(
        locked_lines(root.path(), "compileClasspath"),
        vec!["org.slf4j:slf4j-api:1.7.25"]
    );
}

#[tokio::test]
async fn lock_regenerates_outdated_files() {
    let lock = "org.slf4j:slf4j-api:1.7.20\nold:module:1.0\n";
    let root = setup(&[("compileClasspath", lock)]);
    let deplock = Deplock::builder().root(root.path()).try_build().unwrap();
    assert_eq!(deplock.settings().lock_file_handling, LockFileHandling::Default);

    deplock.lock(false).await.unwrap();
    assert_eq!(
        locked_lines(root.path(), "compileClasspath"),
        vec!["org.slf4j:slf4j-api:1.7.25"]
    );
}

#[tokio::test]
async fn unlockable_module_fails_before_writing() {
    let root = setup(&[]);
    std::fs::write(
        root.path().join("resolution.toml"),
        "[[scopes]]\nname = \"compileClasspath\"\n\n\
         [[scopes.components]]\ngroup = \"a\"\nmodule = \"b\"\nversion = \"1:2\"\n",
    )
    .unwrap();
    let deplock = Deplock::builder().root(root.path()).try_build().unwrap();

    let error = deplock.validate(false).await.unwrap_err();
    assert_eq!(
        error.root_cause().to_string(),
        "Invalid module `a:b:1:2` in scope compileClasspath, expected `group:module:version`"
    );
    assert!(!root
        .path()
        .join("dependency-locks/compileClasspath.lockfile")
        .exists());
}

#[tokio::test]
async fn strict_mode_rejects_missing_lock_files() {
    let root = setup(&[("compileClasspath", "org.slf4j:slf4j-api:1.7.25\n")]);
    let deplock = Deplock::builder()
        .root(root.path())
        .strict(true)
        .try_build()
        .unwrap();
    let error = deplock.validate(false).await.unwrap_err();
    assert_eq!(
        error.to_string(),
        "Locking strict mode: no lock state for testRuntimeClasspath"
    );
}

#[test]
fn show_scope() {
    let root = setup(&[("compileClasspath", "org.slf4j:slf4j-api:1.7.25\n")]);
    let deplock = Deplock::builder()
        .root(root.path())
        .lock_directory_name("dependency-locks")
        .try_build()
        .unwrap();
    let record = deplock.show("compileClasspath").unwrap().unwrap();
    assert_eq!(record.entries()[0].line(), "org.slf4j:slf4j-api:1.7.25");
    assert_eq!(deplock.show("testRuntimeClasspath").unwrap(), None);
}

#[test]
fn missing_explicit_config_file() {
    let root = setup(&[]);
    let result = Deplock::builder()
        .root(root.path())
        .config_file_name("missing.toml")
        .try_build();
    assert!(result.is_err());
}
