//! Plain-text rendering of coordinator views for the terminal.
use std::fmt::Write;

use desk_core::{AppViewModel, ComparisonResult, Job, JobState};
use serde_json::Value;

const TEXT_WIDTH: usize = 56;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn render_history(view: &AppViewModel) -> String {
    let mut out = String::new();
    if view.rows.is_empty() {
        if view.search.trim().is_empty() {
            out.push_str("No jobs found.\n");
        } else {
            let _ = writeln!(out, "No jobs match {:?}.", view.search);
        }
        return out;
    }

    let first = view.page_offset + 1;
    let last = view.page_offset + view.job_count as u64;
    let _ = writeln!(
        out,
        "Jobs {first}-{last} of {} (sorted {})",
        view.total, view.sort
    );
    for row in &view.rows {
        let _ = writeln!(
            out,
            "{:>6}  {:<9}  {:<8}  {:<6}  {}  {}",
            row.job_id,
            row.state.as_str(),
            row.kind.as_str(),
            row.ticker.as_deref().unwrap_or("-"),
            row.created_at.format(TIME_FORMAT),
            truncate(&row.request_text, TEXT_WIDTH)
        );
    }
    if last < view.total {
        let next_page = last / view.page_limit.max(1) + 1;
        let _ = writeln!(out, "More available: --page {next_page}");
    }
    out
}

pub fn render_job(job: &Job) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Job #{} [{}]", job.id, job.state.as_str());
    let _ = writeln!(out, "Kind:      {}", job.kind);
    if let Some(ticker) = &job.ticker {
        let _ = writeln!(out, "Ticker:    {ticker}");
    }
    let _ = writeln!(out, "Submitted: {}", job.created_at.format(TIME_FORMAT));
    if let Some(completed_at) = job.completed_at {
        let _ = writeln!(out, "Finished:  {}", completed_at.format(TIME_FORMAT));
    }
    let _ = writeln!(out, "Request:   {}", job.request_text);
    out.push('\n');

    match job.state {
        JobState::Pending => out.push_str("Still being analyzed.\n"),
        JobState::Failed => {
            let _ = writeln!(
                out,
                "Failed: {}",
                job.error_message.as_deref().unwrap_or("unknown error")
            );
        }
        JobState::Completed => {
            out.push_str(&render_result(job.result.as_ref().unwrap_or(&Value::Null)));
            out.push('\n');
        }
    }
    out
}

/// Prefers the agent's prose answer; anything else is shown as JSON.
fn render_result(result: &Value) -> String {
    if let Some(text) = result.as_str() {
        return text.to_string();
    }
    for key in ["response", "answer", "analysis"] {
        if let Some(text) = result.get(key).and_then(Value::as_str) {
            return text.to_string();
        }
    }
    serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string())
}

pub fn render_comparison(comparison: &ComparisonResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Comparison of {} over {}",
        comparison.tickers.join(", "),
        comparison.period
    );

    let Some(entries) = comparison.payload.get("comparison").and_then(Value::as_array) else {
        out.push_str(&render_result(&comparison.payload));
        out.push('\n');
        return out;
    };

    let _ = writeln!(
        out,
        "{:<6}  {:>10}  {:>8}  {:>6}  {}",
        "TICKER", "PRICE", "PERF %", "RSI", "SIGNAL"
    );
    for entry in entries {
        let ticker = entry.get("ticker").and_then(Value::as_str).unwrap_or("?");
        if let Some(error) = entry.get("error").and_then(Value::as_str) {
            let _ = writeln!(out, "{ticker:<6}  error: {error}");
            continue;
        }
        let number = |key: &str| entry.get(key).and_then(Value::as_f64);
        let _ = writeln!(
            out,
            "{:<6}  {:>10}  {:>8}  {:>6}  {}",
            ticker,
            format_number(number("current_price")),
            format_number(number("performance")),
            format_number(number("rsi")),
            entry.get("signal").and_then(Value::as_str).unwrap_or("-")
        );
    }
    out
}

fn format_number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| format!("{value:.2}"))
}

fn truncate(text: &str, width: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= width {
        return single_line;
    }
    let mut cut = single_line
        .chars()
        .take(width.saturating_sub(3))
        .collect::<String>();
    cut.push_str("...");
    cut
}
