use anyhow::Result;
use tiberius::{AuthMethod, Config, EncryptionLevel};

use crate::config::ConnectionSettings;
use crate::error::{AppError, ErrorKind};

/// Translate resolved connection settings into a tiberius client config.
pub fn build_config(settings: &ConnectionSettings) -> Result<Config> {
    let mut config = Config::new();
    config.host(&settings.server);
    config.port(settings.port);
    config.database(&settings.database);
    config.application_name("dbakit");

    match (&settings.user, &settings.password) {
        (Some(user), Some(password)) => {
            config.authentication(AuthMethod::sql_server(user, password));
        }
        (Some(user), None) => {
            return Err(AppError::new(
                ErrorKind::Config,
                format!("user '{user}' was provided without a password; set DBAKIT_PASSWORD or --password"),
            )
            .into());
        }
        _ => {
            return Err(AppError::new(
                ErrorKind::Config,
                "no credentials configured; provide --user/--password, environment variables, or a profile",
            )
            .into());
        }
    }

    if settings.encrypt {
        config.encryption(EncryptionLevel::Required);
    } else {
        config.encryption(EncryptionLevel::NotSupported);
    }
    if settings.trust_cert {
        config.trust_cert();
    }

    Ok(config)
}

/// ADO-style connection string for display. The password is always masked.
pub fn build_ado_string(settings: &ConnectionSettings) -> String {
    let mut parts = vec![
        format!("Server=tcp:{},{}", settings.server, settings.port),
        format!("Database={}", settings.database),
    ];
    match &settings.user {
        Some(user) => {
            parts.push(format!("User ID={user}"));
            parts.push("Password=***".to_string());
        }
        None => parts.push("Integrated Security=True".to_string()),
    }
    parts.push(format!("Encrypt={}", if settings.encrypt { "True" } else { "False" }));
    if settings.trust_cert {
        parts.push("TrustServerCertificate=True".to_string());
    }
    parts.push(format!("Connection Timeout={}", settings.timeout_ms / 1000));
    parts.join(";")
}
