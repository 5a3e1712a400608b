use anyhow::Result;
use serde_json::json;
use tiberius::Query;
use tracing::warn;

use crate::cli::{CliArgs, UpgradeArgs};
use crate::commands::common;
use crate::config::OutputFormat;
use crate::db::client::{self, SqlClient};
use crate::db::executor;
use crate::db::queries::{quote_ident, quote_literal};
use crate::db::types::{Column, ResultSet, Value, cell_i64, cell_text};
use crate::error::{AppError, ErrorKind};
use crate::output::{TableOptions, json as json_out, table};
use crate::safety;

const SYSTEM_DATABASES: &[&str] = &["master", "model", "msdb", "tempdb"];

const DATABASE_COMPAT: &str = r#"
SELECT d.compatibility_level AS compatibilityLevel,
       CONVERT(int, SERVERPROPERTY('ProductMajorVersion')) AS serverMajorVersion
FROM sys.databases d
WHERE d.name = @P1;
"#;

#[derive(Debug)]
struct StepOutcome {
    step: &'static str,
    status: &'static str,
    detail: String,
}

#[derive(Debug)]
struct DatabaseReport {
    database: String,
    steps: Vec<StepOutcome>,
}

impl DatabaseReport {
    fn success(&self) -> bool {
        self.steps.iter().all(|step| step.status != "failed")
    }
}

pub fn run(args: &CliArgs, cmd: &UpgradeArgs) -> Result<()> {
    let resolved = common::load_config(args)?;
    let format = common::output_format(args, &resolved);

    if cmd.databases.is_empty() {
        return Err(AppError::new(
            ErrorKind::InvalidInput,
            "at least one --database is required",
        )
        .into());
    }

    let mut targets = Vec::new();
    for database in &cmd.databases {
        if SYSTEM_DATABASES
            .iter()
            .any(|system| database.eq_ignore_ascii_case(system))
        {
            warn!("Skipping system database {}", database);
            continue;
        }
        targets.push(database.clone());
    }
    if targets.is_empty() {
        return Err(AppError::new(
            ErrorKind::InvalidInput,
            "no non-system databases to upgrade",
        )
        .into());
    }

    if !cmd.dry_run {
        safety::ensure_write_allowed(common::allow_write(args, &resolved))?;
    }

    let reports = tokio::runtime::Runtime::new()?.block_on(async {
        let mut client = client::connect(&resolved.connection).await?;
        let mut reports = Vec::new();
        for database in &targets {
            reports.push(upgrade_database(&mut client, database, cmd).await);
        }
        Ok::<_, anyhow::Error>(reports)
    })?;

    for report in &reports {
        for step in &report.steps {
            if step.status == "failed" {
                warn!("{} {}: {}", report.database, step.step, step.detail);
            }
        }
    }

    if matches!(format, OutputFormat::Json) {
        let payload = json!({
            "dryRun": cmd.dry_run,
            "databases": reports
                .iter()
                .map(|report| {
                    json!({
                        "database": report.database,
                        "success": report.success(),
                        "steps": report
                            .steps
                            .iter()
                            .map(|step| json!({
                                "step": step.step,
                                "status": step.status,
                                "detail": step.detail,
                            }))
                            .collect::<Vec<_>>(),
                    })
                })
                .collect::<Vec<_>>(),
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

    let rendered =
        table::render_result_set_table(&report_result_set(&reports), format, &TableOptions::default());
    println!("{}", rendered);

    Ok(())
}

async fn upgrade_database(
    client: &mut SqlClient,
    database: &str,
    cmd: &UpgradeArgs,
) -> DatabaseReport {
    let mut steps = Vec::new();

    let mut query = Query::new(DATABASE_COMPAT);
    query.bind(database);
    let compat = match executor::run_query(query, client).await {
        Ok(sets) => sets.into_iter().next().unwrap_or_default(),
        Err(err) => {
            steps.push(StepOutcome {
                step: "resolve",
                status: "failed",
                detail: err.to_string(),
            });
            return DatabaseReport {
                database: database.to_string(),
                steps,
            };
        }
    };
    let Some(row) = compat.rows.first() else {
        steps.push(StepOutcome {
            step: "resolve",
            status: "failed",
            detail: format!("database '{}' not found", database),
        });
        return DatabaseReport {
            database: database.to_string(),
            steps,
        };
    };
    let current_level = cell_i64(row, 0).unwrap_or(0);
    let target_level = cell_i64(row, 1).unwrap_or(0) * 10;

    if target_level > 0 && current_level < target_level {
        steps.push(
            execute_step(
                client,
                "compatibility",
                compat_statement(database, target_level),
                cmd.dry_run,
            )
            .await,
        );
    } else {
        steps.push(StepOutcome {
            step: "compatibility",
            status: "skipped",
            detail: format!("already at level {}", current_level),
        });
    }

    if cmd.no_checkdb {
        steps.push(disabled("checkdb"));
    } else {
        steps.push(execute_step(client, "checkdb", checkdb_statement(database), cmd.dry_run).await);
    }

    if cmd.no_update_usage {
        steps.push(disabled("update-usage"));
    } else {
        steps.push(
            execute_step(
                client,
                "update-usage",
                update_usage_statement(database),
                cmd.dry_run,
            )
            .await,
        );
    }

    if cmd.no_update_stats {
        steps.push(disabled("update-stats"));
    } else {
        steps.push(
            execute_step(
                client,
                "update-stats",
                update_stats_statement(database),
                cmd.dry_run,
            )
            .await,
        );
    }

    if cmd.no_refresh_views {
        steps.push(disabled("refresh-views"));
    } else {
        match executor::run_query(Query::new(views_query(database)), client).await {
            Ok(sets) => {
                let views = sets.into_iter().next().unwrap_or_default();
                if views.rows.is_empty() {
                    steps.push(StepOutcome {
                        step: "refresh-views",
                        status: "skipped",
                        detail: "no user views".to_string(),
                    });
                }
                for row in &views.rows {
                    let schema = cell_text(row, 0);
                    let view = cell_text(row, 1);
                    steps.push(
                        execute_step(
                            client,
                            "refresh-view",
                            refresh_view_statement(database, &schema, &view),
                            cmd.dry_run,
                        )
                        .await,
                    );
                }
            }
            Err(err) => steps.push(StepOutcome {
                step: "refresh-views",
                status: "failed",
                detail: err.to_string(),
            }),
        }
    }

    DatabaseReport {
        database: database.to_string(),
        steps,
    }
}

async fn execute_step(
    client: &mut SqlClient,
    step: &'static str,
    sql: String,
    dry_run: bool,
) -> StepOutcome {
    if let Err(err) = safety::validate_maintenance(&sql) {
        return StepOutcome {
            step,
            status: "failed",
            detail: format!("{}: {}", err, sql),
        };
    }
    if dry_run {
        return StepOutcome {
            step,
            status: "planned",
            detail: sql,
        };
    }
    match executor::run_batch(&sql, client).await {
        Ok(()) => StepOutcome {
            step,
            status: "ok",
            detail: sql,
        },
        Err(err) => StepOutcome {
            step,
            status: "failed",
            detail: err.to_string(),
        },
    }
}

fn disabled(step: &'static str) -> StepOutcome {
    StepOutcome {
        step,
        status: "skipped",
        detail: "disabled by flag".to_string(),
    }
}

fn report_result_set(reports: &[DatabaseReport]) -> ResultSet {
    let columns = ["database", "step", "status", "detail"]
        .iter()
        .map(|name| Column {
            name: (*name).to_string(),
            data_type: None,
        })
        .collect();
    let rows = reports
        .iter()
        .flat_map(|report| {
            report.steps.iter().map(|step| {
                vec![
                    Value::Text(report.database.clone()),
                    Value::Text(step.step.to_string()),
                    Value::Text(step.status.to_string()),
                    Value::Text(step.detail.clone()),
                ]
            })
        })
        .collect();
    ResultSet { columns, rows }
}

fn views_query(database: &str) -> String {
    format!(
        r#"SELECT s.name AS schemaName, v.name AS viewName
FROM {db}.sys.views v
JOIN {db}.sys.schemas s ON s.schema_id = v.schema_id
WHERE v.is_ms_shipped = 0
ORDER BY s.name, v.name;"#,
        db = quote_ident(database)
    )
}

fn compat_statement(database: &str, level: i64) -> String {
    format!(
        "ALTER DATABASE {} SET COMPATIBILITY_LEVEL = {}",
        quote_ident(database),
        level
    )
}

fn checkdb_statement(database: &str) -> String {
    format!(
        "DBCC CHECKDB({}) WITH DATA_PURITY, NO_INFOMSGS",
        quote_literal(database)
    )
}

fn update_usage_statement(database: &str) -> String {
    format!("DBCC UPDATEUSAGE({}) WITH NO_INFOMSGS", quote_literal(database))
}

fn update_stats_statement(database: &str) -> String {
    format!("EXEC {}.sys.sp_updatestats", quote_ident(database))
}

fn refresh_view_statement(database: &str, schema: &str, view: &str) -> String {
    format!(
        "EXEC {}.sys.sp_refreshview {}",
        quote_ident(database),
        quote_literal(&format!("{}.{}", quote_ident(schema), quote_ident(view)))
    )
}
