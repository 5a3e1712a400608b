use assert_cmd::cargo::cargo_bin_cmd;

#[test]
fn help_shows_core_commands_only() {
    let mut cmd = cargo_bin_cmd!("dbakit");
    cmd.arg("--help");
    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8_lossy(&output);

    for name in [
        "status",
        "dependency",
        "similar-tables",
        "timeline",
        "upgrade",
        "init",
        "config",
    ] {
        assert!(stdout.contains(name), "missing core command: {}", name);
    }

    for name in ["completions"] {
        assert!(!stdout.contains(name), "advanced command leaked: {}", name);
    }
}

#[test]
fn help_all_shows_advanced_commands() {
    let mut cmd = cargo_bin_cmd!("dbakit");
    cmd.args(["help", "--all"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8_lossy(&output);

    for name in ["completions"] {
        assert!(stdout.contains(name), "missing advanced command: {}", name);
    }
}

#[test]
fn help_for_single_command_shows_flags() {
    let mut cmd = cargo_bin_cmd!("dbakit");
    cmd.args(["help", "dependency"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8_lossy(&output);

    for flag in ["--parents", "--include-system", "--include-self", "--no-script", "--csv"] {
        assert!(stdout.contains(flag), "missing flag in help: {}", flag);
    }
}
