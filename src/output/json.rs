use serde::Serialize;
use serde_json::json;

use crate::config::ResolvedConfig;
use crate::db::connection;
use crate::db::types::ResultSet;

pub fn emit_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

pub fn emit_json_value(value: &serde_json::Value, pretty: bool) -> anyhow::Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

pub fn error_json(message: &str, kind: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "kind": kind,
        }
    })
}

pub fn result_set_rows_to_objects(result_set: &ResultSet) -> Vec<serde_json::Value> {
    result_set
        .rows
        .iter()
        .map(|row| {
            let mut map = serde_json::Map::new();
            for (col, value) in result_set.columns.iter().zip(row.iter()) {
                let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                map.insert(col.name.clone(), value);
            }
            serde_json::Value::Object(map)
        })
        .collect()
}

pub fn config_to_json(resolved: &ResolvedConfig) -> serde_json::Value {
    json!({
        "configPath": resolved.config_path.as_ref().map(|p| p.display().to_string()),
        "profileName": resolved.profile_name,
        "connection": {
            "server": resolved.connection.server,
            "port": resolved.connection.port,
            "database": resolved.connection.database,
            "user": resolved.connection.user,
            "password": resolved.connection.password.as_ref().map(|_| "***"),
            "encrypt": resolved.connection.encrypt,
            "trustCert": resolved.connection.trust_cert,
            "timeoutMs": resolved.connection.timeout_ms,
            "defaultSchemas": resolved.connection.default_schemas,
        },
        "connectionString": connection::build_ado_string(&resolved.connection),
        "settings": {
            "allowWriteDefault": resolved.settings.allow_write_default,
            "output": {
                "defaultFormat": resolved.settings.output.default_format.as_str(),
                "json": {
                    "contractVersion": resolved.settings.output.json.contract_version.as_str(),
                    "pretty": resolved.settings.output.json.pretty,
                }
            }
        }
    })
}
