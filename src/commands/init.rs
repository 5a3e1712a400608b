use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use serde_json::json;

use crate::cli::{CliArgs, InitArgs};
use crate::commands::common;
use crate::config::OutputFormat;
use crate::output::json as json_out;

pub fn run(args: &CliArgs, cmd: &InitArgs) -> Result<()> {
    let resolved = common::load_config(args)?;
    let format = common::output_format(args, &resolved);

    let profile_name = cmd.profile.as_deref().unwrap_or("default");
    let target = resolve_target_path(cmd.path.as_ref());

    if target.exists() && !cmd.force {
        return Err(anyhow!("Config already exists: {}", target.display()));
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let template = render_config_template(profile_name);
    fs::write(&target, template)?;

    if args.quiet {
        return Ok(());
    }

    if matches!(format, OutputFormat::Json) {
        let payload = json!({
            "path": target.display().to_string(),
            "created": true,
            "overwritten": cmd.force,
        });
        let body = json_out::emit_json_value(&payload, common::json_pretty(&resolved))?;
        println!("{}", body);
    } else {
        println!("Wrote config to {}", target.display());
    }

    Ok(())
}

fn resolve_target_path(path: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = path {
        if path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| matches!(ext, "yaml" | "yml" | "json"))
        {
            return path.clone();
        }
        return path.join(".dbakit").join("config.yaml");
    }

    Path::new(".dbakit").join("config.yaml")
}

fn render_config_template(profile: &str) -> String {
    format!(
        r#"# dbakit configuration
# Defaults favor read-only access.

defaultProfile: {profile}
settings:
  allowWriteDefault: false
  output:
    # defaultFormat controls output when no explicit flag is used.
    # Values: pretty | markdown | json
    defaultFormat: pretty
    json:
      # contractVersion allows JSON shape upgrades while keeping defaults stable.
      # Values: v1
      contractVersion: v1
      # pretty controls indentation when emitting JSON.
      pretty: true

profiles:
  {profile}:
    server: localhost
    port: 1433
    database: master
    user: sa
    passwordEnv: DBAKIT_PASSWORD
    password: null
    encrypt: true
    trustCert: true
    timeout: 30000
    defaultSchemas: [dbo]
    settings:
      allowWriteDefault: false
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_is_local_config_dir() {
        let target = resolve_target_path(None);
        assert_eq!(target, Path::new(".dbakit").join("config.yaml"));
    }

    #[test]
    fn explicit_config_file_is_kept() {
        let path = PathBuf::from("custom/settings.yml");
        assert_eq!(resolve_target_path(Some(&path)), path);
    }

    #[test]
    fn directory_target_gets_the_standard_name() {
        let path = PathBuf::from("project");
        assert_eq!(
            resolve_target_path(Some(&path)),
            Path::new("project").join(".dbakit").join("config.yaml")
        );
    }

    #[test]
    fn template_parses_as_yaml() {
        let template = render_config_template("staging");
        let parsed: serde_yaml::Value = serde_yaml::from_str(&template).expect("valid yaml");
        assert_eq!(
            parsed["defaultProfile"],
            serde_yaml::Value::String("staging".to_string())
        );
        assert!(parsed["profiles"]["staging"]["server"].is_string());
    }
}
