use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn timeline_requires_a_source() {
    let mut cmd = cargo_bin_cmd!("dbakit");
    cmd.arg("timeline")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--source is required"));
}

#[test]
fn timeline_rejects_unknown_sources() {
    let mut cmd = cargo_bin_cmd!("dbakit");
    cmd.args(["timeline", "--source", "sessions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
