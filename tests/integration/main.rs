//! Integration tests for nodepack

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn nodepack() -> Command {
        cargo_bin_cmd!("nodepack")
    }

    #[test]
    fn help_displays() {
        nodepack()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("BUILD_DIR"))
            .stdout(predicate::str::contains("CACHE_DIR"));
    }

    #[test]
    fn version_displays() {
        nodepack()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("nodepack"));
    }

    #[test]
    fn missing_arguments_rejected() {
        nodepack().assert().failure();
    }

    #[test]
    fn missing_build_dir_fails() {
        let temp = TempDir::new().unwrap();
        nodepack()
            .arg(temp.path().join("missing"))
            .arg(temp.path().join("cache"))
            .env("NODEPACK_EXPORT_PATH", temp.path().join("export"))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Path not found"));
    }

    #[test]
    fn malformed_manifest_fails_before_any_download() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build");
        std::fs::create_dir(&build).unwrap();
        std::fs::write(build.join("package.json"), "{ not json").unwrap();

        nodepack()
            .arg(&build)
            .arg(temp.path().join("cache"))
            .env("NODEPACK_EXPORT_PATH", temp.path().join("export"))
            .env("NODEPACK_RESOLVER_URL", "http://127.0.0.1:9")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid manifest"))
            .stderr(predicate::str::contains("Hint:"));

        assert!(temp.path().join("cache").is_dir());
        assert!(!temp.path().join("cache").join("node").exists());
    }
}
