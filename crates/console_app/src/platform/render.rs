use std::fmt::Write as _;

use console_core::{AppViewModel, CellView, LogRowView, TaskOutcome, TaskRowView};

const MATCH_START: &str = "\x1b[1;33m";
const MATCH_END: &str = "\x1b[0m";

pub fn render(view: &AppViewModel, timestamp: &str) -> String {
    let mut out = String::new();

    let module = view.module.as_deref().unwrap_or("-");
    let mut status = format!(
        "[{timestamp}] module: {module} | rows: {} / {}",
        format_with_commas(view.rows.len() as u64),
        format_with_commas(view.total_count)
    );
    if view.loading {
        status.push_str(" | loading");
    }
    if let Some(ms) = view.auto_refresh_ms {
        let _ = write!(status, " | auto refresh {ms} ms");
    }
    if view.can_load_more {
        status.push_str(" | more available");
    }
    let _ = writeln!(out, "{status}");

    for row in &view.rows {
        let _ = writeln!(out, "{}", format_row(row));
    }
    for task in &view.tasks {
        let _ = writeln!(out, "{}", format_task(task));
    }
    if let Some(error) = &view.last_error {
        let _ = writeln!(out, "error: {error}");
    }
    out
}

fn format_row(row: &LogRowView) -> String {
    let cells: Vec<String> = row.cells.iter().map(format_cell).collect();
    format!("{:>12}  {}", row.key.to_string(), cells.join("  "))
}

fn format_cell(cell: &CellView) -> String {
    let mut text = format!("{}=", cell.field);
    for segment in &cell.segments {
        if segment.matched {
            text.push_str(MATCH_START);
            text.push_str(&segment.text);
            text.push_str(MATCH_END);
        } else {
            text.push_str(&segment.text);
        }
    }
    text
}

fn format_task(task: &TaskRowView) -> String {
    let status = task
        .status
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let state = match &task.outcome {
        None if task.watching => "watching".to_string(),
        None => "idle".to_string(),
        Some(TaskOutcome::Finished(_)) => "done".to_string(),
        Some(TaskOutcome::GaveUp { attempts }) => format!("gave up after {attempts} checks"),
        Some(TaskOutcome::Cancelled) => "cancelled".to_string(),
        Some(TaskOutcome::Failed(message)) => format!("failed: {message}"),
    };
    format!("process #{}: {status} ({state})", task.process_id)
}

fn format_with_commas(value: u64) -> String {
    let mut out = String::new();
    for (i, ch) in value.to_string().chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}
