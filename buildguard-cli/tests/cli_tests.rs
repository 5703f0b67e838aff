//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::PathBuf;

/// Build command for the buildguard-cli binary with no Neo4j settings leaking
/// in from the environment.
fn buildguard_cli() -> Command {
    let mut cmd = cargo_bin_cmd!("buildguard-cli");
    for var in [
        "BUILDGUARD_NEO4J_URI",
        "BUILDGUARD_NEO4J_USER",
        "BUILDGUARD_NEO4J_PASSWORD",
        "BUILDGUARD_NEO4J_DATABASE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Path to the library's fixture catalog (relative to workspace).
fn catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("buildguard")
        .join("tests")
        .join("fixtures")
        .join("catalog.json")
}

fn check_with_fixture() -> Command {
    let mut cmd = buildguard_cli();
    cmd.arg("check").arg("--catalog").arg(catalog_path());
    cmd
}

const COMPATIBLE: [&str; 4] = [
    "AMD Ryzen 5 7600",
    "ASUS ROG STRIX B650-A GAMING WIFI",
    "EVGA 550 B5 550W",
    "Gigabyte AORUS MASTER 8GB GeForce RTX 3070",
];

#[test]
fn test_cli_help() {
    let mut cmd = buildguard_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("PC build compatibility"));
}

#[test]
fn test_cli_version() {
    let mut cmd = buildguard_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_check_compatible_build() {
    let mut cmd = check_with_fixture();
    cmd.args(COMPATIBLE);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("✔ CPU-Motherboard compatible: AM5"))
        .stdout(predicate::str::contains("✅ Valid build"));
}

#[test]
fn test_cli_check_incompatible_build_fails() {
    let mut cmd = check_with_fixture();
    cmd.arg("AMD Ryzen 9 7900X 4.70GHz AM5")
        .arg("ASRock Z87 Extreme3 LGA1150 ATX");

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("❌ Invalid build:"))
        .stdout(predicate::str::contains(
            " - CPU-Motherboard incompatible: AM5 vs LGA1150",
        ));
}

#[test]
fn test_cli_fail_on_never_reports_but_succeeds() {
    let mut cmd = check_with_fixture();
    cmd.arg("AMD Ryzen 9 7900X 4.70GHz AM5")
        .arg("ASRock Z87 Extreme3 LGA1150 ATX")
        .arg("--fail-on")
        .arg("never");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("AM5 vs LGA1150"));
}

#[test]
fn test_cli_fail_on_warning_catches_unknown_part() {
    let mut cmd = check_with_fixture();
    cmd.args(COMPATIBLE).arg("Xilence LQ360");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Product not found in catalog: Xilence LQ360"));

    let mut cmd = check_with_fixture();
    cmd.args(COMPATIBLE)
        .arg("Xilence LQ360")
        .arg("--fail-on")
        .arg("warning");
    cmd.assert().code(1);
}

#[test]
fn test_cli_json_input() {
    let mut cmd = check_with_fixture();
    cmd.arg("--json")
        .arg(r#"["AMD Ryzen 5 7600", "ASUS ROG STRIX B650-A GAMING WIFI"]"#);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CPU-Motherboard compatible: AM5"));
}

#[test]
fn test_cli_delimited_input() {
    let mut cmd = check_with_fixture();
    cmd.arg("--list")
        .arg("AMD Ryzen 5 7600|ASUS ROG STRIX B650-A GAMING WIFI");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CPU-Motherboard compatible: AM5"));
}

#[test]
fn test_cli_delimited_input_with_bracketed_name() {
    let mut cmd = check_with_fixture();
    cmd.arg("--list")
        .arg("[OEM] Mystery Cooler|AMD Ryzen 5 7600|ASUS ROG STRIX B650-A GAMING WIFI");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Product not found in catalog: [OEM] Mystery Cooler",
        ))
        .stdout(predicate::str::contains("CPU-Motherboard compatible: AM5"));
}

#[test]
fn test_cli_json_input_must_be_an_array() {
    let mut cmd = check_with_fixture();
    cmd.arg("--json").arg("AMD Ryzen 5 7600|ASUS ROG STRIX B650-A GAMING WIFI");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("--json must be a JSON array"));
}

#[test]
fn test_cli_malformed_json_input() {
    let mut cmd = check_with_fixture();
    cmd.arg("--json").arg("[\"AMD Ryzen 5 7600\"");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_requires_some_parts() {
    let mut cmd = check_with_fixture();

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("no parts given"));
}

#[test]
fn test_cli_missing_catalog_file() {
    let mut cmd = buildguard_cli();
    cmd.arg("check")
        .arg("--catalog")
        .arg("does_not_exist.json")
        .arg("AMD Ryzen 5 7600");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_tags_format() {
    let mut cmd = check_with_fixture();
    cmd.arg("--format")
        .arg("tags")
        .arg("AMD Ryzen 9 7900X 4.70GHz AM5")
        .arg("ASRock Z87 Extreme3 LGA1150 ATX")
        .arg("Xilence LQ360");

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("[WARN] Product not found in catalog: Xilence LQ360"))
        .stdout(predicate::str::contains(
            "[ERROR] CPU-Motherboard incompatible: AM5 vs LGA1150",
        ))
        .stdout(predicate::str::contains("[INVALID]"));
}

#[test]
fn test_cli_json_format() {
    let mut cmd = check_with_fixture();
    cmd.arg("--format").arg("json").args(COMPATIBLE);

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["report"]["valid"], true);
    assert_eq!(json["components"].as_array().map(|a| a.len()), Some(4));
    assert!(json["run_id"].is_string());
}

#[test]
fn test_cli_strict_mode() {
    let mut cmd = check_with_fixture();
    cmd.arg("Intel Core i5-4690K").arg("AMD Ryzen 5 7600");
    cmd.assert().success();

    let mut cmd = check_with_fixture();
    cmd.arg("Intel Core i5-4690K")
        .arg("AMD Ryzen 5 7600")
        .arg("--strict");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Duplicate category cpu"));
}

#[test]
fn test_cli_rule_subset() {
    let mut cmd = check_with_fixture();
    cmd.arg("--rule")
        .arg("gpu_case_clearance")
        .arg("AMD Ryzen 9 7900X 4.70GHz AM5")
        .arg("ASRock Z87 Extreme3 LGA1150 ATX");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CPU-Motherboard").not());
}

#[test]
fn test_cli_unknown_rule() {
    let mut cmd = check_with_fixture();
    cmd.arg("--rule").arg("no_such_rule").arg("AMD Ryzen 5 7600");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("unknown rule 'no_such_rule'"));
}

#[test]
fn test_cli_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let config = serde_json::json!({
        "catalog": { "backend": "memory", "path": catalog_path() },
        "strict_mode": true
    });
    write!(file, "{}", config).unwrap();

    let mut cmd = buildguard_cli();
    cmd.arg("check")
        .arg("--config")
        .arg(file.path())
        .arg("Intel Core i5-4690K")
        .arg("AMD Ryzen 5 7600");

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Duplicate category cpu"));
}

#[test]
fn test_cli_invalid_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ \"call_timeout_secs\": 0 }}").unwrap();

    let mut cmd = buildguard_cli();
    cmd.arg("check")
        .arg("--config")
        .arg(file.path())
        .arg("AMD Ryzen 5 7600");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("call_timeout_secs"));
}

#[test]
fn test_cli_unreachable_neo4j() {
    let mut cmd = buildguard_cli();
    cmd.arg("check")
        .arg("--neo4j-uri")
        .arg("http://127.0.0.1:9")
        .arg("--timeout")
        .arg("2")
        .arg("AMD Ryzen 5 7600");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_rules_command() {
    let mut cmd = buildguard_cli();

    cmd.arg("rules");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("cpu_motherboard_socket"))
        .stdout(predicate::str::contains("psu_power_budget"));
}

#[test]
fn test_cli_rules_verbose() {
    let mut cmd = buildguard_cli();

    cmd.arg("rules").arg("--verbose");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Requires: power-supply"));
}

#[test]
fn test_cli_normalize() {
    let mut cmd = buildguard_cli();

    cmd.arg("normalize")
        .arg("Transcend MTE245S 250GB M.2-2280")
        .arg("  CPU   Núcleo! ");

    cmd.assert()
        .success()
        .stdout("transcend mte245s 250gb m22280\ncpu nucleo\n");
}

#[test]
fn test_cli_output_formats_are_different() {
    let mut cmd_human = check_with_fixture();
    cmd_human.args(COMPATIBLE);
    let human_output = cmd_human.output().unwrap();

    let mut cmd_tags = check_with_fixture();
    cmd_tags.arg("--format").arg("tags").args(COMPATIBLE);
    let tags_output = cmd_tags.output().unwrap();

    assert_ne!(
        human_output.stdout, tags_output.stdout,
        "Different formats should produce different output"
    );
}
