use anyhow::Result;
use serde_json::json;
use tracing::{info, warn};

use crate::cli::{CliArgs, DependencyArgs};
use crate::commands::common;
use crate::config::OutputFormat;
use crate::db::client;
use crate::db::types::{Column, ResultSet, Value};
use crate::deps::{
    CatalogProvider, DependencyProvider, DiscoveryOptions, Resolution, ResolveOptions,
    ResolvedDependency, resolve_dependencies,
};
use crate::error::{AppError, ErrorKind};
use crate::output::{TableOptions, csv, json as json_out, table};

pub fn run(args: &CliArgs, cmd: &DependencyArgs) -> Result<()> {
    let resolved = common::load_config(args)?;
    let format = common::output_format(args, &resolved);

    if cmd.objects.is_empty() {
        return Err(AppError::new(
            ErrorKind::InvalidInput,
            "at least one object name is required",
        )
        .into());
    }

    // Scripts only surface in JSON and CSV output. Skip the extra catalog
    // round trips when neither will be produced.
    let wants_script = !cmd.no_script && (matches!(format, OutputFormat::Json) || cmd.csv.is_some());
    let options = ResolveOptions {
        discovery: DiscoveryOptions {
            parents: cmd.parents,
            include_system: cmd.include_system,
        },
        include_self: cmd.include_self,
        with_script: wants_script,
    };

    let database = resolved.connection.database.clone();
    let (resolutions, failures) = tokio::runtime::Runtime::new()?.block_on(async {
        let mut client = client::connect(&resolved.connection).await?;
        let mut provider = CatalogProvider::new(
            &mut client,
            database.clone(),
            resolved.connection.default_schemas.clone(),
        );
        let server = provider.server_identity().await?;

        let mut resolutions: Vec<Resolution> = Vec::new();
        let mut failures: Vec<(String, String)> = Vec::new();
        for object in &cmd.objects {
            match resolve_dependencies(&mut provider, &server, object, cmd.schema.as_deref(), options)
                .await
            {
                Ok(resolution) => resolutions.push(resolution),
                Err(err) => failures.push((object.clone(), err.to_string())),
            }
        }
        Ok::<_, anyhow::Error>((resolutions, failures))
    })?;

    for (object, message) in &failures {
        warn!("Skipping {}: {}", object, message);
    }
    for resolution in &resolutions {
        for warning in &resolution.warnings {
            warn!("{}", warning);
        }
        if resolution.is_trivial() {
            info!(
                "No dependencies found for {}",
                resolution.root.qualified_name()
            );
        }
    }

    if resolutions.is_empty() {
        if let Some((object, message)) = failures.first() {
            return Err(AppError::new(
                ErrorKind::InvalidInput,
                format!("{object}: {message}"),
            )
            .into());
        }
    }

    let csv_path = if let Some(path) = cmd.csv.as_ref() {
        let export = dependency_result_set(&resolutions, true);
        csv::write_result_set(path, &export)?;
        Some(path.clone())
    } else {
        None
    };

    if matches!(format, OutputFormat::Json) {
        let payload = json!({
            "database": database,
            "parents": cmd.parents,
            "includeSelf": cmd.include_self,
            "resolutions": resolutions.iter().map(resolution_to_json).collect::<Vec<_>>(),
            "failures": failures
                .iter()
                .map(|(object, error)| json!({"object": object, "error": error}))
                .collect::<Vec<_>>(),
            "csvPath": csv_path.as_ref().map(|p| p.display().to_string()),
        });
        let body = json_out::emit_json_value(&payload, common::json_pretty(&resolved))?;
        if !args.quiet {
            println!("{}", body);
        }
        return Ok(());
    }

    if args.quiet {
        return Ok(());
    }

    for (idx, resolution) in resolutions.iter().enumerate() {
        if idx > 0 {
            println!();
        }
        if resolution.is_trivial() && resolution.dependencies.is_empty() {
            println!(
                "No dependencies found for {}",
                resolution.root.qualified_name()
            );
            continue;
        }
        println!(
            "{} of {} ({})",
            if cmd.parents { "Prerequisites" } else { "Dependents" },
            resolution.root.qualified_name(),
            resolution.dependencies.len()
        );
        let display = dependency_result_set(std::slice::from_ref(resolution), false);
        let rendered = table::render_result_set_table(&display, format, &TableOptions::default());
        println!("{}", rendered);
    }

    if let Some(path) = csv_path {
        println!("\nCSV written: {}", path.display());
    }

    Ok(())
}

fn resolution_to_json(resolution: &Resolution) -> serde_json::Value {
    json!({
        "root": resolution.root.qualified_name(),
        "rootUrn": resolution.root_urn,
        "trivial": resolution.is_trivial(),
        "warnings": resolution.warnings,
        "dependencies": resolution.dependencies,
    })
}

fn dependency_result_set(resolutions: &[Resolution], full: bool) -> ResultSet {
    let mut names = vec![
        "tier",
        "schema",
        "dependent",
        "kind",
        "owner",
        "isSchemaBound",
        "parent",
        "parentKind",
    ];
    if full {
        names = [
            vec!["computerName", "instanceName", "sqlInstance", "database"],
            names,
            vec!["urn", "originalResource", "script", "scriptError"],
        ]
        .concat();
    }
    let columns = names
        .into_iter()
        .map(|name| Column {
            name: name.to_string(),
            data_type: None,
        })
        .collect();

    let rows = resolutions
        .iter()
        .flat_map(|resolution| resolution.dependencies.iter())
        .map(|dep| dependency_row(dep, full))
        .collect();

    ResultSet { columns, rows }
}

fn dependency_row(dep: &ResolvedDependency, full: bool) -> Vec<Value> {
    let text_or_null = |value: &Option<String>| match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    };

    let mut row = vec![
        Value::Int(dep.tier as i64),
        Value::Text(dep.schema.clone()),
        Value::Text(dep.dependent.clone()),
        Value::Text(dep.kind.to_string()),
        text_or_null(&dep.owner),
        Value::Bool(dep.is_schema_bound),
        text_or_null(&dep.parent),
        match dep.parent_kind {
            Some(kind) => Value::Text(kind.to_string()),
            None => Value::Null,
        },
    ];
    if full {
        let mut identity = vec![
            Value::Text(dep.computer_name.clone()),
            Value::Text(dep.instance_name.clone()),
            Value::Text(dep.sql_instance.clone()),
            Value::Text(dep.database.clone()),
        ];
        identity.append(&mut row);
        identity.extend([
            Value::Text(dep.urn.to_string()),
            Value::Text(dep.original_resource.to_string()),
            text_or_null(&dep.script),
            text_or_null(&dep.script_error),
        ]);
        return identity;
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::{ObjectKind, ObjectRef, ServerIdentity, Urn};

    fn sample_dependency(tier: i32) -> ResolvedDependency {
        let server = ServerIdentity {
            computer_name: "SQL01".to_string(),
            instance_name: "MSSQLSERVER".to_string(),
            sql_instance: "SQL01".to_string(),
        };
        ResolvedDependency {
            computer_name: server.computer_name.clone(),
            instance_name: server.instance_name.clone(),
            sql_instance: server.sql_instance.clone(),
            database: "Sales".to_string(),
            schema: "dbo".to_string(),
            dependent: "Orders".to_string(),
            kind: ObjectKind::Table,
            owner: Some("dbo".to_string()),
            is_schema_bound: false,
            parent: None,
            parent_kind: None,
            tier,
            urn: Urn::object(&server, "Sales", "dbo", "Orders"),
            original_resource: Urn::object(&server, "Sales", "dbo", "Orders"),
            script: Some("CREATE TABLE [dbo].[Orders] ();".to_string()),
            script_error: None,
        }
    }

    fn resolution_with(deps: Vec<ResolvedDependency>) -> Resolution {
        Resolution {
            root: ObjectRef {
                object_id: 1,
                schema: "dbo".to_string(),
                name: "Orders".to_string(),
                kind: ObjectKind::Table,
                is_system: false,
            },
            root_urn: deps
                .first()
                .map(|d| d.original_resource.clone())
                .unwrap_or_else(|| {
                    Urn::object(
                        &ServerIdentity {
                            computer_name: "SQL01".to_string(),
                            instance_name: "MSSQLSERVER".to_string(),
                            sql_instance: "SQL01".to_string(),
                        },
                        "Sales",
                        "dbo",
                        "Orders",
                    )
                }),
            dependencies: deps,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn display_projection_omits_identity_and_script() {
        let resolution = resolution_with(vec![sample_dependency(1)]);
        let rs = dependency_result_set(std::slice::from_ref(&resolution), false);
        assert_eq!(rs.columns.first().unwrap().name, "tier");
        assert_eq!(rs.columns.len(), 8);
        assert_eq!(rs.rows.len(), 1);
    }

    #[test]
    fn full_projection_carries_script_and_urns() {
        let resolution = resolution_with(vec![sample_dependency(2)]);
        let rs = dependency_result_set(std::slice::from_ref(&resolution), true);
        assert_eq!(rs.columns.first().unwrap().name, "computerName");
        let names: Vec<&str> = rs.columns.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"script"));
        assert!(names.contains(&"originalResource"));
        let row = &rs.rows[0];
        assert_eq!(row[names.iter().position(|n| *n == "tier").unwrap()], Value::Int(2));
    }

    #[test]
    fn json_projection_reports_trivial_flag() {
        let resolution = resolution_with(Vec::new());
        let value = resolution_to_json(&resolution);
        assert_eq!(value["trivial"], serde_json::Value::Bool(true));
        assert_eq!(value["root"], serde_json::Value::String("dbo.Orders".to_string()));
    }
}
