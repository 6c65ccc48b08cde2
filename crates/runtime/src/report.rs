//! Tabular process report.

use std::time::Duration;

use chrono::{DateTime, Local};
use cumulus_execution::ProcessSnapshot;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ABSENT: &str = "N/A";
const HEADERS: [&str; 8] = [
    "Name",
    "Process Id",
    "Status",
    "Execution Time",
    "Work Items",
    "Result Type",
    "Start Time",
    "Completion Time",
];

/// Render `snapshots` as a `|`-separated table, oldest start first.
///
/// Processes that have not started sort before every started one. Work
/// items are shown as `active/faulted/completed/total`.
pub fn format_report(snapshots: &[ProcessSnapshot]) -> String {
    let mut ordered: Vec<&ProcessSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|snapshot| snapshot.start_time);

    let rows: Vec<[String; 8]> = ordered.into_iter().map(row).collect();
    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(str::to_owned), &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn row(snapshot: &ProcessSnapshot) -> [String; 8] {
    let state = &snapshot.state;
    [
        snapshot
            .info
            .name
            .clone()
            .unwrap_or_else(|| ABSENT.to_owned()),
        snapshot.id.to_string(),
        state.status.to_string(),
        snapshot
            .execution_time
            .map_or_else(|| ABSENT.to_owned(), format_duration),
        format!(
            "{}/{}/{}/{}",
            state.active_work_items,
            state.faulted_work_items,
            state.completed_work_items,
            state.total_work_items
        ),
        snapshot.info.return_type_name.clone(),
        format_time(snapshot.start_time),
        format_time(snapshot.completion_time),
    ]
}

fn push_line(out: &mut String, cells: &[String; 8], widths: &[usize; 8]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn format_time(time: Option<DateTime<Local>>) -> String {
    time.map_or_else(
        || ABSENT.to_owned(),
        |t| t.format(TIME_FORMAT).to_string(),
    )
}

/// `HH:MM:SS.mmm`, hours unbounded.
fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total / 3600,
        (total / 60) % 60,
        total % 60,
        duration.subsec_millis()
    )
}
