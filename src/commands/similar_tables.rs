use anyhow::Result;
use serde_json::json;
use tiberius::Query;
use tracing::info;

use crate::cli::{CliArgs, SimilarTablesArgs};
use crate::commands::common;
use crate::config::OutputFormat;
use crate::db::client;
use crate::db::executor;
use crate::output::{TableOptions, csv, json as json_out, table};

pub fn run(args: &CliArgs, cmd: &SimilarTablesArgs) -> Result<()> {
    let resolved = common::load_config(args)?;
    let format = common::output_format(args, &resolved);

    let match_percent = cmd.match_percent.unwrap_or(0).min(100);
    let table_filter = cmd.table.clone();
    let schema_filter = cmd.schema.clone();

    let result_set = tokio::runtime::Runtime::new()?.block_on(async {
        let mut client = client::connect(&resolved.connection).await?;
        let sql = r#"
WITH ColumnCounts AS (
    SELECT c.TABLE_SCHEMA, c.TABLE_NAME, COUNT(1) AS column_count
    FROM INFORMATION_SCHEMA.COLUMNS c
    GROUP BY c.TABLE_SCHEMA, c.TABLE_NAME
)
SELECT
    t.TABLE_SCHEMA AS tableSchema,
    t.TABLE_NAME AS tableName,
    tc.column_count AS columnCount,
    m.TABLE_SCHEMA AS matchSchema,
    m.TABLE_NAME AS matchName,
    mc.column_count AS matchColumnCount,
    COUNT(1) AS matchingColumns,
    CAST(COUNT(1) * 100.0 / tc.column_count AS decimal(5, 1)) AS matchPercent
FROM INFORMATION_SCHEMA.COLUMNS t
JOIN INFORMATION_SCHEMA.TABLES tt
    ON tt.TABLE_SCHEMA = t.TABLE_SCHEMA AND tt.TABLE_NAME = t.TABLE_NAME
JOIN INFORMATION_SCHEMA.COLUMNS m
    ON m.COLUMN_NAME = t.COLUMN_NAME
    AND (m.TABLE_SCHEMA <> t.TABLE_SCHEMA OR m.TABLE_NAME <> t.TABLE_NAME)
JOIN INFORMATION_SCHEMA.TABLES mt
    ON mt.TABLE_SCHEMA = m.TABLE_SCHEMA AND mt.TABLE_NAME = m.TABLE_NAME
JOIN ColumnCounts tc
    ON tc.TABLE_SCHEMA = t.TABLE_SCHEMA AND tc.TABLE_NAME = t.TABLE_NAME
JOIN ColumnCounts mc
    ON mc.TABLE_SCHEMA = m.TABLE_SCHEMA AND mc.TABLE_NAME = m.TABLE_NAME
WHERE (@P1 IS NULL OR t.TABLE_NAME = @P1)
  AND (@P2 IS NULL OR t.TABLE_SCHEMA = @P2)
  AND (@P3 = 1 OR (tt.TABLE_TYPE = 'BASE TABLE' AND mt.TABLE_TYPE = 'BASE TABLE'))
GROUP BY t.TABLE_SCHEMA, t.TABLE_NAME, tc.column_count,
         m.TABLE_SCHEMA, m.TABLE_NAME, mc.column_count
HAVING COUNT(1) * 100.0 / tc.column_count >= @P4
ORDER BY matchPercent DESC, tableSchema, tableName, matchSchema, matchName;
"#;
        let mut query = Query::new(sql);
        query.bind(table_filter.as_deref());
        query.bind(schema_filter.as_deref());
        query.bind(cmd.include_views);
        query.bind(match_percent as f64);
        let result_sets = executor::run_query(query, &mut client).await?;
        Ok::<_, anyhow::Error>(result_sets.into_iter().next().unwrap_or_default())
    })?;

    if result_set.rows.is_empty() {
        info!("No similar tables found at or above {}% match", match_percent);
    }

    let csv_path = if let Some(path) = cmd.csv.as_ref() {
        csv::write_result_set(path, &result_set)?;
        Some(path.clone())
    } else {
        None
    };

    if matches!(format, OutputFormat::Json) {
        let payload = json!({
            "table": table_filter,
            "schema": schema_filter,
            "includeViews": cmd.include_views,
            "matchPercent": match_percent,
            "matches": json_out::result_set_rows_to_objects(&result_set),
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

    if result_set.rows.is_empty() {
        println!("No similar tables found");
    } else {
        let rendered = table::render_result_set_table(&result_set, format, &TableOptions::default());
        println!("{}", rendered);
    }

    if let Some(path) = csv_path {
        println!("\nCSV written: {}", path.display());
    }

    Ok(())
}
