use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn upgrade_requires_a_database() {
    let mut cmd = cargo_bin_cmd!("dbakit");
    cmd.arg("upgrade")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one --database is required"));
}

#[test]
fn upgrade_refuses_system_databases() {
    let mut cmd = cargo_bin_cmd!("dbakit");
    cmd.args(["upgrade", "--database", "master", "--database", "msdb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no non-system databases to upgrade"));
}

#[test]
fn upgrade_is_write_gated() {
    let mut cmd = cargo_bin_cmd!("dbakit");
    cmd.args(["upgrade", "--database", "AppDb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("write operations are disabled"))
        .stderr(predicate::str::contains("--allow-write"));
}
