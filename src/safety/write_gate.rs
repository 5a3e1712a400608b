use anyhow::{Result, anyhow};

use crate::error::{AppError, ErrorKind};

const ALLOWED_PROCS: &[&str] = &["sp_updatestats", "sp_refreshview"];

/// Gate for the one write path. Everything else in the binary is read-only.
pub fn ensure_write_allowed(allow_write: bool) -> Result<()> {
    if allow_write {
        return Ok(());
    }
    Err(AppError::new(
        ErrorKind::InvalidInput,
        "write operations are disabled; pass --allow-write or set allowWriteDefault: true",
    )
    .into())
}

/// Check a statement against the fixed maintenance shapes before it is
/// sent to the server. The binary only ever emits these; anything else
/// reaching this point is a bug, not a user error.
pub fn validate_maintenance(sql: &str) -> Result<()> {
    let trimmed = sql.trim();
    let lead = first_token(trimmed).ok_or_else(|| anyhow!("Empty maintenance statement"))?;

    match lead.to_uppercase().as_str() {
        "ALTER" => {
            let upper = trimmed.to_uppercase();
            if upper.starts_with("ALTER DATABASE") && upper.contains("SET COMPATIBILITY_LEVEL") {
                return Ok(());
            }
            Err(anyhow!("ALTER statement outside the maintenance allowlist"))
        }
        "DBCC" => {
            let upper = trimmed.to_uppercase();
            if upper.contains("CHECKDB") || upper.contains("UPDATEUSAGE") {
                return Ok(());
            }
            Err(anyhow!("DBCC statement outside the maintenance allowlist"))
        }
        "EXEC" | "EXECUTE" => {
            let target = extract_exec_target(trimmed)
                .ok_or_else(|| anyhow!("EXEC requires a stored procedure name"))?;
            let normalized = normalize_proc_name(&target)
                .ok_or_else(|| anyhow!("EXEC target could not be parsed"))?;
            if ALLOWED_PROCS.contains(&normalized.as_str()) {
                return Ok(());
            }
            Err(anyhow!(
                "Stored procedure '{}' is not in the maintenance allowlist",
                normalized
            ))
        }
        other => Err(anyhow!(
            "Statement type '{}' is not in the maintenance allowlist",
            other
        )),
    }
}

fn first_token(input: &str) -> Option<String> {
    let mut token = String::new();
    for ch in input.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            token.push(ch);
        } else if !token.is_empty() {
            break;
        }
    }
    if token.is_empty() { None } else { Some(token) }
}

fn extract_exec_target(input: &str) -> Option<String> {
    let rest = input
        .trim_start()
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim_start())?;
    let target: String = rest
        .chars()
        .take_while(|ch| !ch.is_whitespace() && *ch != '(' && *ch != ';' && *ch != ',')
        .collect();
    if target.is_empty() { None } else { Some(target) }
}

fn normalize_proc_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts: Vec<&str> = trimmed.split('.').collect();
    let last = parts.last()?;
    let name = last.trim_matches(|c| c == '[' || c == ']');
    if name.is_empty() {
        return None;
    }
    Some(name.to_lowercase())
}
