use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const GENERIC_FAILURE: &str =
    "Encountered an unknown error processing this request, please try again.";

fn deploy_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cdnify-deploy"));
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("APP_ENV")
        .arg("--root")
        .arg(root);
    cmd
}

/// Project with a mix manifest: one built asset, one entry without a file.
fn project(extra_config: &str) -> TempDir {
    let root = TempDir::new().expect("project root");
    fs::write(
        root.path().join("cdnify.yaml"),
        format!(
            "cdn: [\"https://cdn.example.com\"]\n\
             command:\n  disk: local\n{extra_config}\
             disks:\n  local: {{ driver: local, root: bucket }}\n"
        ),
    )
    .expect("write config");

    let public = root.path().join("public");
    fs::create_dir_all(public.join("js")).expect("public/js");
    fs::write(public.join("js/app.js"), "console.log('app')").expect("asset");
    fs::write(
        public.join("mix-manifest.json"),
        r#"{"/js/app.js":"/js/app.js?id=7c1e","/css/app.css":"/css/app.css?id=99"}"#,
    )
    .expect("manifest");
    root
}

#[test]
fn uploads_to_local_disk_and_reports_counts() {
    let root = project("");

    deploy_cmd(root.path())
        .args(["--yes", "--skip-build"])
        .assert()
        .success()
        .stdout(contains("Uploaded 1 assets, skipped 1."));

    let uploaded = root.path().join("bucket/js/app-7c1e.js");
    assert_eq!(fs::read_to_string(uploaded).unwrap(), "console.log('app')");
    assert!(!root.path().join("bucket/css").exists());
}

#[test]
fn second_run_skips_existing_unless_forced() {
    let root = project("");
    deploy_cmd(root.path())
        .args(["--yes", "--skip-build"])
        .assert()
        .success();

    deploy_cmd(root.path())
        .args(["--yes", "--skip-build"])
        .assert()
        .success()
        .stdout(contains("Uploaded 0 assets, skipped 2."));

    deploy_cmd(root.path())
        .args(["--yes", "--skip-build", "--force"])
        .assert()
        .success()
        .stdout(contains("Uploaded 1 assets, skipped 1."));
}

#[test]
fn detail_prints_per_asset_lines() {
    let root = project("");
    deploy_cmd(root.path())
        .args(["--yes", "--skip-build", "--detail", "--dest", "/build"])
        .assert()
        .success()
        .stdout(contains("[-msg-] Skipping. Local file doesn't exist. (/css/app.css)"))
        .stdout(contains("(build/js/app-7c1e.js)"));
    assert!(root.path().join("bucket/build/js/app-7c1e.js").is_file());
}

#[test]
fn quiet_run_prints_only_the_summary() {
    let root = project("");
    deploy_cmd(root.path())
        .args(["--yes", "--skip-build"])
        .assert()
        .success()
        .stdout(contains("[-msg-]").not())
        .stdout(contains("Skipping").not());
}

#[test]
fn unknown_disk_fails_before_any_work() {
    let root = project("  build: touch built.marker\n");

    deploy_cmd(root.path())
        .args(["--yes", "--disk", "floppy"])
        .assert()
        .code(1)
        .stderr(contains("[-err-]"))
        .stderr(contains(GENERIC_FAILURE));

    assert!(!root.path().join("built.marker").exists());
    assert!(!root.path().join("bucket").exists());
}

#[test]
fn failure_prints_one_generic_line_by_default() {
    let root = project("");
    let output = deploy_cmd(root.path())
        .args(["--yes", "--skip-build", "--disk", "floppy"])
        .output()
        .expect("run cdnify-deploy");
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.trim(), format!("[-err-] {GENERIC_FAILURE}"));
}

#[test]
fn detail_logs_the_failure_chain() {
    let root = project("");
    deploy_cmd(root.path())
        .args(["--yes", "--skip-build", "--disk", "floppy", "--detail"])
        .assert()
        .code(1)
        .stderr(contains("disk 'floppy' is not usable"))
        .stderr(contains("ERROR").not())
        .stderr(contains(GENERIC_FAILURE));
}

#[test]
fn unconfigured_remote_disk_is_rejected() {
    let root = project("");
    deploy_cmd(root.path())
        .args(["--yes", "--skip-build", "--disk", "s3"])
        .assert()
        .failure()
        .stderr(contains(GENERIC_FAILURE));
}

#[test]
fn declining_the_prompt_does_nothing() {
    let root = project("  build: touch built.marker\n");

    deploy_cmd(root.path())
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(contains("Do you wish to continue? [y/N]"))
        .stdout(contains("Uploaded").not());

    assert!(!root.path().join("built.marker").exists());
    assert!(!root.path().join("bucket").exists());
}

#[test]
fn answering_yes_at_the_prompt_deploys() {
    let root = project("");
    deploy_cmd(root.path())
        .arg("--skip-build")
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(contains("Uploaded 1 assets"));
}

#[cfg(unix)]
#[test]
fn configured_build_command_runs_in_project_root() {
    let root = project("  build: touch built.marker\n");
    deploy_cmd(root.path()).arg("--yes").assert().success();
    assert!(root.path().join("built.marker").exists());
}

#[cfg(unix)]
#[test]
fn failing_build_aborts_without_uploading() {
    let root = project("  build: exit 3\n");
    deploy_cmd(root.path())
        .arg("--yes")
        .assert()
        .code(1)
        .stderr(contains(GENERIC_FAILURE));
    assert!(!root.path().join("bucket").exists());
}

#[test]
fn malformed_manifest_is_a_failure() {
    let root = project("");
    fs::write(root.path().join("public/mix-manifest.json"), "{ nope").unwrap();
    deploy_cmd(root.path())
        .args(["--yes", "--skip-build"])
        .assert()
        .code(1)
        .stderr(contains(GENERIC_FAILURE));
}

#[test]
fn deploy_without_cdn_origins_uploads() {
    let root = project("");
    fs::write(root.path().join("cdnify.yaml"), "command: {disk: local}\n").unwrap();

    deploy_cmd(root.path())
        .args(["--yes", "--skip-build"])
        .assert()
        .success()
        .stdout(contains("Uploaded 1 assets, skipped 1."));
    assert!(root.path().join("storage/app/js/app-7c1e.js").is_file());
}

#[test]
fn json_report_lists_outcomes() {
    let root = project("");
    let output = deploy_cmd(root.path())
        .args(["--yes", "--skip-build", "--json"])
        .output()
        .expect("run cdnify-deploy");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["counters"]["uploaded"], 1);
    assert_eq!(report["counters"]["skipped"], 1);
    assert_eq!(report["outcomes"][0]["outcome"], "uploaded");
    assert_eq!(report["outcomes"][0]["key"], "js/app-7c1e.js");
    assert_eq!(report["outcomes"][1]["outcome"], "missing_local");
}

#[test]
fn explicit_config_file_is_used() {
    let root = project("");
    let elsewhere = TempDir::new().unwrap();
    let config = elsewhere.path().join("deploy.yaml");
    fs::write(
        &config,
        "cdn: [\"https://cdn.example.com\"]\n\
         disks:\n  other: { driver: local, root: other-bucket }\n",
    )
    .unwrap();

    deploy_cmd(root.path())
        .arg("--config")
        .arg(&config)
        .args(["--yes", "--skip-build", "--disk", "other"])
        .assert()
        .success();
    assert!(root.path().join("other-bucket/js/app-7c1e.js").is_file());
}
