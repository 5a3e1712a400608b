use std::fs;

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;
use tiberius::Query;
use tracing::{info, warn};

use crate::cli::{CliArgs, TimelineArgs};
use crate::commands::common;
use crate::config::OutputFormat;
use crate::db::client;
use crate::db::executor;
use crate::db::types::{ResultSet, cell_i64, cell_text};
use crate::error::{AppError, ErrorKind};
use crate::output::html::{TimelineEvent, render_timeline};
use crate::output::json as json_out;

const SINCE_DAYS_DEFAULT: u64 = 30;

const JOB_HISTORY: &str = r#"
SELECT
    j.name AS jobName,
    h.run_date AS runDate,
    h.run_time AS runTime,
    h.run_duration AS runDuration,
    h.run_status AS runStatus
FROM msdb.dbo.sysjobhistory h
JOIN msdb.dbo.sysjobs j ON j.job_id = h.job_id
WHERE h.step_id = 0
  AND h.run_date >= CONVERT(int, CONVERT(varchar(8), DATEADD(day, -@P1, SYSDATETIME()), 112))
  AND (@P2 IS NULL OR EXISTS (
        SELECT 1 FROM msdb.dbo.sysjobsteps s
        WHERE s.job_id = j.job_id AND s.database_name = @P2))
ORDER BY h.run_date, h.run_time;
"#;

const BACKUP_HISTORY: &str = r#"
SELECT
    bs.database_name AS databaseName,
    CASE bs.type
        WHEN 'D' THEN 'FULL'
        WHEN 'I' THEN 'DIFF'
        WHEN 'L' THEN 'LOG'
        ELSE bs.type
    END AS backupType,
    CONVERT(varchar(19), bs.backup_start_date, 120) AS backupStart,
    CONVERT(varchar(19), bs.backup_finish_date, 120) AS backupFinish
FROM msdb.dbo.backupset bs
WHERE bs.backup_start_date >= DATEADD(day, -@P1, SYSUTCDATETIME())
  AND (@P2 IS NULL OR bs.database_name = @P2)
ORDER BY bs.backup_start_date;
"#;

pub fn run(args: &CliArgs, cmd: &TimelineArgs) -> Result<()> {
    let resolved = common::load_config(args)?;
    let format = common::output_format(args, &resolved);

    let source = cmd.source.as_deref().ok_or_else(|| {
        AppError::new(ErrorKind::InvalidInput, "--source is required (jobs or backups)")
    })?;
    let since_days = cmd.since.unwrap_or(SINCE_DAYS_DEFAULT);
    let database = cmd.database.clone();

    let result_set = tokio::runtime::Runtime::new()?.block_on(async {
        let mut client = client::connect(&resolved.connection).await?;
        let sql = match source {
            "jobs" => JOB_HISTORY,
            _ => BACKUP_HISTORY,
        };
        let mut query = Query::new(sql);
        // DATEADD rejects bigint for its number argument, so bind an int.
        query.bind(since_days as i32);
        query.bind(database.as_deref());
        let result_sets = executor::run_query(query, &mut client).await?;
        Ok::<_, anyhow::Error>(result_sets.into_iter().next().unwrap_or_default())
    })?;

    let (events, skipped) = match source {
        "jobs" => job_events(&result_set),
        _ => backup_events(&result_set),
    };
    if skipped > 0 {
        warn!("Skipped {} history rows with invalid date or time values", skipped);
    }
    if events.is_empty() {
        info!("No {} events in the last {} days", source, since_days);
    }

    if matches!(format, OutputFormat::Json) {
        if cmd.out.is_some() {
            warn!("Ignoring --out in JSON mode");
        }
        let payload = json!({
            "source": source,
            "database": database,
            "sinceDays": since_days,
            "count": events.len(),
            "skippedRows": skipped,
            "events": events.iter().map(event_to_json).collect::<Vec<_>>(),
        });
        let body = json_out::emit_json_value(&payload, common::json_pretty(&resolved))?;
        if !args.quiet {
            println!("{}", body);
        }
        return Ok(());
    }

    let title = match source {
        "jobs" => format!("Agent job timeline: {}", resolved.connection.server),
        _ => format!("Backup timeline: {}", resolved.connection.server),
    };
    let html = render_timeline(&title, &events);

    if let Some(path) = cmd.out.as_ref() {
        fs::write(path, html)?;
        if !args.quiet {
            println!("HTML written: {}", path.display());
        }
        return Ok(());
    }

    if args.quiet {
        return Ok(());
    }
    println!("{}", html);

    Ok(())
}

fn event_to_json(event: &TimelineEvent) -> serde_json::Value {
    json!({
        "group": event.group,
        "label": event.label,
        "start": event.start.format("%Y-%m-%d %H:%M:%S").to_string(),
        "end": event.end.format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

fn job_events(result: &ResultSet) -> (Vec<TimelineEvent>, usize) {
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for row in &result.rows {
        let name = cell_text(row, 0);
        let start = cell_i64(row, 1)
            .zip(cell_i64(row, 2))
            .and_then(|(date, time)| decode_run_start(date, time));
        let Some(start) = start else {
            skipped += 1;
            continue;
        };
        let duration = duration_seconds(cell_i64(row, 3).unwrap_or(0));
        let status = job_status_label(cell_i64(row, 4).unwrap_or(-1));
        events.push(TimelineEvent {
            group: name,
            label: status.to_string(),
            start,
            end: start + Duration::seconds(duration),
        });
    }

    (events, skipped)
}

fn backup_events(result: &ResultSet) -> (Vec<TimelineEvent>, usize) {
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for row in &result.rows {
        let start = parse_timestamp(&cell_text(row, 2));
        let finish = parse_timestamp(&cell_text(row, 3));
        let (Some(start), Some(end)) = (start, finish) else {
            skipped += 1;
            continue;
        };
        events.push(TimelineEvent {
            group: cell_text(row, 0),
            label: cell_text(row, 1),
            start,
            end,
        });
    }

    (events, skipped)
}

/// Agent history encodes the start as two integers: run_date is yyyymmdd
/// and run_time is hhmmss on a decimal clock.
fn decode_run_start(run_date: i64, run_time: i64) -> Option<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(
        (run_date / 10_000) as i32,
        ((run_date / 100) % 100) as u32,
        (run_date % 100) as u32,
    )?;
    let time = NaiveTime::from_hms_opt(
        (run_time / 10_000) as u32,
        ((run_time / 100) % 100) as u32,
        (run_time % 100) as u32,
    )?;
    Some(date.and_time(time))
}

/// run_duration packs hhmmss into one integer; hours are unbounded.
fn duration_seconds(run_duration: i64) -> i64 {
    let hours = run_duration / 10_000;
    let minutes = (run_duration / 100) % 100;
    let seconds = run_duration % 100;
    hours * 3600 + minutes * 60 + seconds
}

fn job_status_label(run_status: i64) -> &'static str {
    match run_status {
        0 => "Failed",
        1 => "Succeeded",
        2 => "Retry",
        3 => "Canceled",
        4 => "In Progress",
        _ => "Unknown",
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").ok()
}
