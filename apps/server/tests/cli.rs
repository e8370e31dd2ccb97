use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CONFIG: &str = "\
[Media]
path = ./media

[VisAssets]
download_missing = True
download_missing_from = https://assets.example.org/library/

[Schemas]
notifier_send = ws_outgoing_schema.json
notifier_receive = ws_incoming_schema.json
abr_schema_name = abr_schema.json
";

struct Sandbox {
    _tmp: TempDir,
    root: PathBuf,
    base: PathBuf,
    home: PathBuf,
}

fn sandbox() -> Sandbox {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();
    let base = root.join("ABRServer~").join("abr_server");
    let home = root.join("home");

    fs::create_dir_all(root.join("ABRSchemas~")).unwrap();
    fs::create_dir_all(&base).unwrap();
    fs::create_dir_all(&home).unwrap();
    fs::write(base.join("abr_server.cfg"), CONFIG).unwrap();

    Sandbox { _tmp: tmp, root, base, home }
}

fn server_on(sandbox: &Sandbox, platform: &str) -> Command {
    let mut cmd = Command::cargo_bin("abr-server").unwrap();
    cmd.env("HOME", &sandbox.home)
        .env_remove("ABR__MEDIA__PATH")
        .env_remove("RUST_LOG")
        .arg("--base-dir")
        .arg(&sandbox.base)
        .args(["--platform", platform]);
    cmd
}

fn server(sandbox: &Sandbox) -> Command {
    server_on(sandbox, "linux")
}

#[test]
fn prints_resolved_settings_as_json() {
    let sandbox = sandbox();

    let output = server(&sandbox).arg("--json").assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();

    let media = sandbox.base.join("media");
    assert_eq!(json["media"]["root"], media.to_str().unwrap());
    assert_eq!(json["media"]["states"], media.join("states").to_str().unwrap());
    assert_eq!(
        json["schemas"]["abr_schema"],
        sandbox.root.join("ABRSchemas~").join("abr_schema.json").to_str().unwrap()
    );
    assert_eq!(
        json["backup"]["path"],
        sandbox.home.join(".config/abr/abr_backup.json").to_str().unwrap()
    );
    assert_eq!(json["backup"]["retention"]["secs"], 3600);
    assert_eq!(json["visassets"]["download_missing_from"], "https://assets.example.org/library/");

    for name in ["visassets", "datasets", "thumbnails", "states"] {
        assert!(media.join(name).is_dir(), "{name} should be provisioned");
    }
}

#[test]
fn second_start_succeeds_on_provisioned_root() {
    let sandbox = sandbox();

    server(&sandbox).assert().success();
    server(&sandbox).assert().success().stdout(predicate::str::is_empty());
}

#[test]
fn environment_overrides_media_path() {
    let sandbox = sandbox();
    let elsewhere = sandbox.root.join("data");

    server(&sandbox).env("ABR__MEDIA__PATH", &elsewhere).assert().success();

    assert!(elsewhere.join("thumbnails").is_dir());
    assert!(!sandbox.base.join("media").exists());
}

#[test]
fn missing_config_fails_startup() {
    let sandbox = sandbox();
    fs::remove_file(sandbox.base.join("abr_server.cfg")).unwrap();

    server(&sandbox)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"))
        .stderr(predicate::str::contains("abr_server.cfg"));
}

#[test]
fn missing_schema_directory_fails_startup() {
    let sandbox = sandbox();
    fs::remove_dir(sandbox.root.join("ABRSchemas~")).unwrap();

    server(&sandbox)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Schema directory 'ABRSchemas~' not found"));
}

#[test]
fn unsupported_platform_fails_startup() {
    let sandbox = sandbox();

    server_on(&sandbox, "plan9")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported platform: plan9"));
}

#[test]
fn explicit_config_file_is_used() {
    let sandbox = sandbox();
    let custom = sandbox.root.join("custom.cfg");
    fs::write(&custom, CONFIG.replace("./media", "./assets")).unwrap();

    server(&sandbox).arg("--config").arg(&custom).assert().success();

    assert!(sandbox.base.join("assets").join("datasets").is_dir());
}
