use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::Server;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// Writes a settings file pointing at `registry` and `npm`.
fn write_settings(dir: &TempDir, src_root: &Path, registry: &str, npm: &Path) -> PathBuf {
    let path = dir.path().join("config.json");
    let settings = serde_json::json!({
        "srcRoot": src_root,
        "engine": "engine-sqlite",
        "services": ["svc-mail"],
        "apps": ["blog"],
        "registry": registry,
        "npm": npm,
    });
    std::fs::write(&path, settings.to_string()).unwrap();
    path
}

/// A stand-in npm that records its arguments in `<dir>/npm-args`.
#[cfg(unix)]
fn fake_npm(dir: &TempDir) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join("npm");
    let args = dir.path().join("npm-args");
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 10.8.2; exit 0; fi\necho \"$@\" > {}\n",
        args.display()
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn npmi(config: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("npmi"));
    cmd.env_remove("NPM_CONFIG_REGISTRY")
        .env_remove("NPM_TOKEN")
        .arg("--config")
        .arg(config);
    cmd
}

#[test]
fn test_install_without_arguments_is_noop() {
    let dir = tempdir().unwrap();
    let config = write_settings(
        &dir,
        dir.path(),
        "http://127.0.0.1:9",
        Path::new("/nonexistent/npm"),
    );

    npmi(&config).arg("install").assert().success();
}

#[test]
fn test_install_missing_manifest_is_noop() {
    let dir = tempdir().unwrap();
    let app = tempdir().unwrap();
    let config = write_settings(
        &dir,
        dir.path(),
        "http://127.0.0.1:9",
        Path::new("/nonexistent/npm"),
    );

    npmi(&config)
        .arg("install")
        .arg("--where")
        .arg(app.path())
        .assert()
        .success();
}

#[test]
fn test_invalid_settings_file_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{ nope").unwrap();

    npmi(&config)
        .arg("backends")
        .assert()
        .failure()
        .stderr(predicates::str::contains("Invalid settings file"));
}

#[test]
fn test_empty_install_ignores_settings() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{ nope").unwrap();

    npmi(&config)
        .env("NPM_TOKEN", "bad\ntoken")
        .arg("install")
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn test_install_manifest_end_to_end() {
    let dir = tempdir().unwrap();
    let app = tempdir().unwrap();
    std::fs::write(
        app.path().join("package.json"),
        r#"{"dependencies": {"foo": "^1.0.0", "npm": "^6.0.0"}}"#,
    )
    .unwrap();
    let npm = fake_npm(&dir);
    let config = write_settings(&dir, dir.path(), "http://127.0.0.1:9", &npm);

    npmi(&config)
        .arg("install")
        .arg("--where")
        .arg(app.path())
        .assert()
        .success();

    let args = std::fs::read_to_string(dir.path().join("npm-args")).unwrap();
    assert_eq!(
        args.trim(),
        format!(
            "install --no-audit --no-fund --prefix {} foo@^1.0.0",
            app.path().display()
        )
    );
}

#[cfg(unix)]
#[test]
fn test_install_list_end_to_end() {
    let mut server = Server::new();
    let _found = server
        .mock("GET", "/left-pad")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name": "left-pad", "dist-tags": {"latest": "1.3.0"}}"#)
        .create();
    let _missing = server
        .mock("GET", "/not-a-real-pkg-xyz")
        .with_status(404)
        .with_body(r#"{"error": "Not found"}"#)
        .create();

    let dir = tempdir().unwrap();
    let npm = fake_npm(&dir);
    let config = write_settings(&dir, dir.path(), &server.url(), &npm);

    npmi(&config)
        .arg("install")
        .arg("left-pad")
        .arg("not-a-real-pkg-xyz")
        .assert()
        .success();

    let args = std::fs::read_to_string(dir.path().join("npm-args")).unwrap();
    assert_eq!(args.trim(), "install --no-audit --no-fund left-pad");
}

#[cfg(unix)]
#[test]
fn test_install_list_registry_failure() {
    let mut server = Server::new();
    let _denied = server
        .mock("GET", "/left-pad")
        .with_status(403)
        .create();

    let dir = tempdir().unwrap();
    let npm = fake_npm(&dir);
    let config = write_settings(&dir, dir.path(), &server.url(), &npm);

    npmi(&config)
        .arg("install")
        .arg("left-pad")
        .assert()
        .failure()
        .stderr(predicates::str::contains("denied access"));

    assert!(!dir.path().join("npm-args").exists());
}

#[cfg(unix)]
#[test]
fn test_plugins_skips_git_checkouts() {
    let mut server = Server::new();
    let blog = server
        .mock("GET", "/blog")
        .with_status(200)
        .with_body(r#"{"name": "blog"}"#)
        .expect(0)
        .create();

    let dir = tempdir().unwrap();
    let src_root = tempdir().unwrap();
    std::fs::create_dir_all(src_root.path().join("apps/node_modules/blog/.git")).unwrap();
    let npm = fake_npm(&dir);
    let config = write_settings(&dir, src_root.path(), &server.url(), &npm);

    npmi(&config).arg("plugins").assert().success();

    blog.assert();
    assert!(!dir.path().join("npm-args").exists());
}
