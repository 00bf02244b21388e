//! Integration tests for `pacaller kconfig`

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn kernel_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let files = [
        (
            "Kconfig",
            "source \"arch/$(SRCARCH)/Kconfig\"\nsource \"net/Kconfig\"\n",
        ),
        ("arch/x86/Kconfig", "config X86\n\tdef_bool y\n"),
        (
            "net/Kconfig",
            "menuconfig NET\n\tbool \"Networking support\"\n\
             config INET\n\tbool \"TCP/IP networking\"\n\tdepends on NET\n\
             source \"net/sctp/Kconfig\"\n",
        ),
        (
            "net/sctp/Kconfig",
            "menuconfig IP_SCTP\n\ttristate \"SCTP\"\n\tdepends on INET\n\
             \tdepends on IPV6 || IPV6=n\n\tselect CRYPTO_HMAC\n\
             \thelp\n\t  Stream Control Transmission Protocol\n\n\
             config SCTP_COOKIE_HASH\n\tstring\n\tdepends on IP_SCTP\n",
        ),
    ];
    for (rel, content) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn kconfig(kernel_dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pacaller");
    cmd.arg("kconfig").arg("--kernel-dir").arg(kernel_dir);
    cmd
}

#[test]
fn test_kconfig_text_output() {
    let tree = kernel_tree();

    kconfig(tree.path())
        .arg("--arch")
        .arg("none")
        .arg("--target")
        .arg("IP_SCTP")
        .assert()
        .success()
        .stdout("CRYPTO_HMAC\nINET\nIPV6\nIP_SCTP\nNET\n");
}

#[test]
fn test_kconfig_json_output() {
    let tree = kernel_tree();

    let output = kconfig(tree.path())
        .arg("--arch")
        .arg("none")
        .args(["--target", "IP_SCTP", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["targets"], serde_json::json!(["IP_SCTP"]));
    assert_eq!(report["complete"], true);
    assert_eq!(
        report["undeclared"],
        serde_json::json!(["CRYPTO_HMAC", "IPV6"])
    );
    assert_eq!(report["required"].as_array().unwrap().len(), 5);
}

#[test]
fn test_kconfig_config_fragment() {
    let tree = kernel_tree();

    kconfig(tree.path())
        .arg("--arch")
        .arg("none")
        .args(["-t", "SCTP_COOKIE_HASH", "--format", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CONFIG_IP_SCTP=y\n"))
        .stdout(predicate::str::contains("CONFIG_NET=y\n"))
        .stdout(predicate::str::contains(
            "# CONFIG_SCTP_COOKIE_HASH needs a string value\n",
        ))
        .stdout(predicate::str::contains("CONFIG_IPV6").not());
}

#[test]
fn test_kconfig_arch_entry_point() {
    let tree = kernel_tree();

    // arch/x86/Kconfig does not source net/, so nothing beyond the target is known
    kconfig(tree.path())
        .args(["-t", "IP_SCTP"])
        .assert()
        .success()
        .stdout("IP_SCTP\n");
}

#[test]
fn test_kconfig_budget_exhaustion_warns() {
    let tree = kernel_tree();

    kconfig(tree.path())
        .args(["--arch", "none", "-t", "IP_SCTP", "--max-iterations", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("may be incomplete"));
}

#[test]
fn test_kconfig_missing_kernel_dir_fails() {
    let tree = kernel_tree();

    kconfig(&tree.path().join("linux-missing"))
        .args(["-t", "NET"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Kernel directory not found"));
}

#[test]
fn test_kconfig_requires_target() {
    let tree = kernel_tree();

    kconfig(tree.path()).assert().failure();
}
