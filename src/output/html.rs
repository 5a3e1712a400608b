use chrono::{Datelike, NaiveDateTime, Timelike};

/// One bar on the rendered timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    /// Row the bar belongs to (job name, database name).
    pub group: String,
    /// Bar caption (outcome, backup type).
    pub label: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Render a self-contained HTML document with a timeline chart. The chart
/// library is loaded from the Google charting CDN at view time; the event
/// data itself is embedded in the page.
pub fn render_timeline(title: &str, events: &[TimelineEvent]) -> String {
    if events.is_empty() {
        return format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<p>No events found in the selected window.</p>\n</body>\n</html>\n",
            html_escape(title)
        );
    }

    let rows = events
        .iter()
        .map(|event| {
            format!(
                "      ['{}', '{}', {}, {}]",
                js_escape(&event.group),
                js_escape(&event.label),
                js_date(&event.start),
                js_date(&event.end)
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="https://www.gstatic.com/charts/loader.js"></script>
<script>
  google.charts.load('current', {{packages: ['timeline']}});
  google.charts.setOnLoadCallback(drawChart);
  function drawChart() {{
    var container = document.getElementById('timeline');
    var chart = new google.visualization.Timeline(container);
    var dataTable = new google.visualization.DataTable();
    dataTable.addColumn({{type: 'string', id: 'Group'}});
    dataTable.addColumn({{type: 'string', id: 'Label'}});
    dataTable.addColumn({{type: 'datetime', id: 'Start'}});
    dataTable.addColumn({{type: 'datetime', id: 'End'}});
    dataTable.addRows([
{rows}
    ]);
    chart.draw(dataTable, {{timeline: {{showRowLabels: true}}}});
  }}
</script>
</head>
<body>
<h2>{title}</h2>
<div id="timeline" style="height: 90vh;"></div>
</body>
</html>
"#,
        title = html_escape(title),
        rows = rows
    )
}

/// JavaScript Date constructor call. Months are zero-based there.
fn js_date(at: &NaiveDateTime) -> String {
    format!(
        "new Date({}, {}, {}, {}, {}, {})",
        at.year(),
        at.month0(),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

fn js_escape(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "")
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
