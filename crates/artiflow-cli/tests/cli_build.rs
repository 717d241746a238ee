use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn artiflow_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("artiflow").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("ARTIFLOW_URL")
        .env_remove("ARTIFLOW_ACCESS_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn builds_dir(home: &TempDir) -> std::path::PathBuf {
    home.path().join(".artiflow").join("builds")
}

#[test]
fn test_collect_and_publish() {
    let tmp = TempDir::new().unwrap();
    let artifact = tmp.path().join("app.jar");
    fs::write(&artifact, "hello").unwrap();

    artiflow_cmd(&tmp)
        .args(["build", "add-artifacts", "my-build", "3", "--module", "org.acme:app:1.0"])
        .arg(&artifact)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 artifact(s)"));

    artiflow_cmd(&tmp)
        .args(["build", "collect-env", "my-build", "3"])
        .env("CI_JOB_NAME", "nightly")
        .env("DEPLOY_PASSWORD", "hunter2")
        .assert()
        .success();

    artiflow_cmd(&tmp)
        .args([
            "build", "add-vcs", "my-build", "3",
            "--url", "https://git.example/app.git",
            "--revision", "abc123",
        ])
        .assert()
        .success();

    let output = tmp.path().join("build-info.json");
    artiflow_cmd(&tmp)
        .args(["build", "publish", "my-build", "3", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Published"));

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["name"], "my-build");
    assert_eq!(doc["number"], "3");
    assert_eq!(doc["agent"]["name"], "artiflow");
    assert_eq!(doc["modules"][0]["id"], "org.acme:app:1.0");
    assert_eq!(
        doc["modules"][0]["artifacts"][0]["sha1"],
        "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
    );
    assert_eq!(doc["vcs"][0]["revision"], "abc123");
    assert_eq!(doc["properties"]["buildInfo.env.CI_JOB_NAME"], "nightly");
    assert!(doc["properties"].get("buildInfo.env.DEPLOY_PASSWORD").is_none());

    let remaining = fs::read_dir(builds_dir(&tmp)).unwrap().count();
    assert_eq!(remaining, 0);
}

#[test]
fn test_dry_run_prints_and_keeps_partials() {
    let tmp = TempDir::new().unwrap();

    artiflow_cmd(&tmp)
        .args(["build", "collect-env", "dry", "1"])
        .assert()
        .success();

    artiflow_cmd(&tmp)
        .args(["build", "publish", "dry", "1", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"dry\""));

    assert_eq!(fs::read_dir(builds_dir(&tmp)).unwrap().count(), 1);

    artiflow_cmd(&tmp)
        .args(["build", "clean", "dry", "1"])
        .assert()
        .success();
    assert_eq!(fs::read_dir(builds_dir(&tmp)).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn test_collect_env_skips_non_utf8_values() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tmp = TempDir::new().unwrap();
    artiflow_cmd(&tmp)
        .args(["build", "collect-env", "raw", "1"])
        .env("ARTIFLOW_BAD_BYTES", OsStr::from_bytes(b"\xff\xfe"))
        .env("ARTIFLOW_GOOD", "ok")
        .assert()
        .success();

    let output = tmp.path().join("raw.json");
    artiflow_cmd(&tmp)
        .args(["build", "publish", "raw", "1", "--output"])
        .arg(&output)
        .assert()
        .success();

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["properties"]["buildInfo.env.ARTIFLOW_GOOD"], "ok");
    assert!(doc["properties"].get("buildInfo.env.ARTIFLOW_BAD_BYTES").is_none());
}

#[test]
fn test_append_published_build() {
    let tmp = TempDir::new().unwrap();

    artiflow_cmd(&tmp)
        .args(["build", "collect-env", "lib", "5"])
        .assert()
        .success();
    artiflow_cmd(&tmp)
        .args(["build", "publish", "lib", "5", "--output"])
        .arg(tmp.path().join("lib.json"))
        .assert()
        .success();

    artiflow_cmd(&tmp)
        .args(["build", "append", "app", "9", "lib", "5"])
        .assert()
        .success();

    let output = tmp.path().join("app.json");
    artiflow_cmd(&tmp)
        .args(["build", "publish", "app", "9", "--output"])
        .arg(&output)
        .assert()
        .success();

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["modules"][0]["id"], "lib/5");
    assert_eq!(doc["modules"][0]["type"], "build");
    assert!(doc["modules"][0]["sha1"].is_string());
}

#[test]
fn test_append_unpublished_build_fails() {
    let tmp = TempDir::new().unwrap();
    artiflow_cmd(&tmp)
        .args(["build", "append", "app", "1", "ghost", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has not been published"));
}

#[test]
fn test_publish_without_partials_fails() {
    let tmp = TempDir::new().unwrap();
    artiflow_cmd(&tmp)
        .args(["build", "publish", "empty", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no build-info collected"));
}
