//! Output rendering: JSON documents and a GitHub-style markdown table

use std::fmt::Write as _;

use crate::common::errors::Result;
use crate::common::types::{FetchReport, ResultEntry};

const TABLE_HEADERS: [&str; 12] = [
    "Symbol", "Last", "Date", "Time", "Change", "Change%", "High", "Low", "Open", "Prev",
    "Volume", "Turnover",
];

/// Pretty JSON array, one element per symbol. `raw` is dropped unless requested.
pub fn render_json(report: &FetchReport, include_raw: bool) -> Result<String> {
    if include_raw {
        Ok(serde_json::to_string_pretty(report)?)
    } else {
        Ok(serde_json::to_string_pretty(&report.clone().without_raw())?)
    }
}

/// Integral values keep one decimal so `2000` prints as `2000.0`
fn fmt_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e16 => format!("{:.1}", v),
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

fn fmt_text(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

fn fmt_change_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => {
            let sign = if v > 0.0 { "+" } else { "" };
            format!("{}{}%", sign, fmt_number(Some(v)))
        }
        None => "-".to_string(),
    }
}

fn table_row(entry: &ResultEntry) -> Vec<String> {
    let Some(q) = entry.as_quote() else {
        // failed symbols keep their row so the table lines up with the input
        let mut row = vec!["-".to_string(); TABLE_HEADERS.len()];
        row[0] = entry.symbol().to_string();
        return row;
    };

    vec![
        q.symbol.to_string(),
        fmt_number(q.last),
        fmt_text(q.date.as_deref()),
        fmt_text(q.time.as_deref()),
        fmt_number(q.change),
        fmt_change_pct(q.change_pct),
        fmt_number(q.high),
        fmt_number(q.low),
        fmt_number(q.open),
        fmt_number(q.prev),
        fmt_number(q.volume),
        fmt_number(q.turnover),
    ]
}

/// Cells are left-aligned and padded with one space on each side
fn push_row(out: &mut String, cells: impl IntoIterator<Item = String>, widths: &[usize]) {
    let line: Vec<String> = cells
        .into_iter()
        .zip(widths)
        .map(|(cell, width)| format!(" {:<width$} ", cell, width = *width))
        .collect();
    let _ = writeln!(out, "|{}|", line.join("|"));
}

/// Markdown table with one row per symbol in report order
pub fn render_table(report: &FetchReport) -> String {
    let rows: Vec<Vec<String>> = report.entries().iter().map(table_row).collect();

    let widths: Vec<usize> = TABLE_HEADERS
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, TABLE_HEADERS.iter().map(|h| h.to_string()), &widths);
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    let _ = writeln!(out, "|{}|", separator.join("|"));
    for row in rows {
        push_row(&mut out, row, &widths);
    }

    out.trim_end().to_string()
}

/// `Failures (n/total):` followed by one line per failed symbol, or `None`
pub fn render_failures(report: &FetchReport) -> Option<String> {
    let failures: Vec<_> = report.failures().collect();
    if failures.is_empty() {
        return None;
    }

    let mut out = format!("Failures ({}/{}):", failures.len(), report.len());
    for failure in failures {
        let _ = write!(out, "\n- {}: {}", failure.symbol, failure.message);
    }
    Some(out)
}
