use owo_colors::OwoColorize;
use std::collections::HashMap;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::checkin::Patient;
use crate::dashboard::{DashboardSummary, PatientDetail, RosterRow};
use crate::scoring::{ScoreBreakdown, ScoredCheckIn, Status, Tone};

const STATUS_WIDTH: usize = 15; // fits "Needs Follow-up"
const SCORE_WIDTH: usize = 4; // fits "10.0"

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with one decimal ("4.5", "10.0")
pub fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}

fn format_optional_score(score: Option<f64>) -> String {
    score.map(format_score).unwrap_or_else(|| "-".to_string())
}

/// Status label padded to `width`, coloured by tone when enabled
pub fn paint_status(status: Status, width: usize, use_colors: bool) -> String {
    let padded = format!("{:<width$}", status.label(), width = width);
    if !use_colors {
        return padded;
    }
    match status.tone() {
        Tone::Success => padded.green().to_string(),
        Tone::Warning => padded.yellow().to_string(),
        Tone::Danger => padded.red().bold().to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format scored check-ins as a table with columns:
/// Index, Date, Patient, Symptom, Risk, Status, Notes
/// No headers. Notes are truncated to the terminal width.
pub fn format_scored_table(rows: &[&ScoredCheckIn], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No check-ins found.".to_string();
    }

    let term_width = get_terminal_width();
    let patient_width = rows
        .iter()
        .map(|r| r.check_in().patient_id.chars().count())
        .max()
        .unwrap_or(0);
    let separator = "  ";
    // index(3) + space + date(10) + patient + symptom + risk + status, each separated
    let fixed_width =
        3 + 1 + 10 + separator.len() * 5 + patient_width + SCORE_WIDTH * 2 + STATUS_WIDTH;

    rows.iter()
        .enumerate()
        .map(|(idx, scored)| {
            let c = scored.check_in();
            let index_str = format!("{:>2}.", idx + 1);
            let patient = format!("{:<width$}", c.patient_id, width = patient_width);
            let symptom = format!("{:>width$}", format_score(scored.symptom_score()), width = SCORE_WIDTH);
            let risk = format!("{:>width$}", format_score(scored.risk_score()), width = SCORE_WIDTH);
            let status = paint_status(scored.status(), STATUS_WIDTH, use_colors);

            let notes = c.notes.as_deref().map(single_line).unwrap_or_default();
            let notes = match term_width {
                Some(width) if width > fixed_width + 10 => truncate_text(&notes, width - fixed_width),
                // Very narrow terminal, show truncated
                Some(_) => truncate_text(&notes, 20),
                // No terminal (pipe), don't truncate
                None => notes,
            };

            let line = if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    c.date,
                    separator,
                    patient.cyan(),
                    separator,
                    symptom,
                    separator,
                    risk.bold(),
                    separator,
                    status,
                    separator,
                    notes.dimmed()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}{}{}",
                    index_str,
                    c.date,
                    separator,
                    patient,
                    separator,
                    symptom,
                    separator,
                    risk,
                    separator,
                    status,
                    separator,
                    notes
                )
            };
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format check-ins as tab-separated values for scripting
/// Columns: date, patient_id, symptom_score, risk_score, status (no headers, no colors)
pub fn format_tsv(rows: &[&ScoredCheckIn]) -> String {
    rows.iter()
        .map(|scored| {
            format!(
                "{}\t{}\t{}\t{}\t{}",
                scored.check_in().date,
                scored.check_in().patient_id,
                format_score(scored.symptom_score()),
                format_score(scored.risk_score()),
                scored.status()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty JSON array of scored check-ins
pub fn format_json(rows: &[&ScoredCheckIn]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rows)
}

/// Multi-line explanation of a risk score (for verbose mode)
pub fn format_breakdown(breakdown: &ScoreBreakdown) -> String {
    let mut lines = vec![format!(
        "  Symptoms: {} (mean of 8 severities)",
        format_score(breakdown.symptom_score)
    )];
    for factor in &breakdown.factors {
        lines.push(format!(
            "  {}: {} ({} -> {})",
            factor.label,
            factor.description,
            format_score(factor.before),
            format_score(factor.after)
        ));
    }
    let clamp_note = if breakdown.clamped { ", capped at 10" } else { "" };
    lines.push(format!(
        "  Risk: {}{} -> {}",
        format_score(breakdown.risk_score),
        clamp_note,
        breakdown.status
    ));
    lines.join("\n")
}

/// Format the patient roster: name, condition, last check-in, risk, status
pub fn format_roster(rows: &[RosterRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No patients found.".to_string();
    }

    let name_width = rows.iter().map(|r| r.patient.name.chars().count()).max().unwrap_or(0);
    let condition_width = rows
        .iter()
        .map(|r| r.patient.condition.chars().count())
        .max()
        .unwrap_or(0);

    rows.iter()
        .map(|row| {
            let name = format!("{:<width$}", row.patient.name, width = name_width);
            let condition = format!("{:<width$}", row.patient.condition, width = condition_width);
            let (last, risk, status) = match row.latest {
                Some(latest) => (
                    latest.check_in().date.to_string(),
                    format_score(latest.risk_score()),
                    paint_status(latest.status(), STATUS_WIDTH, use_colors),
                ),
                None => ("never".to_string(), "-".to_string(), String::new()),
            };
            let name = if use_colors { name.bold().to_string() } else { name };
            format!(
                "{}  {}  {:<10}  {:>4}  {}",
                name, condition, last, risk, status
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the header shown above a patient's history
pub fn format_patient_detail(
    detail: &PatientDetail,
    patient: Option<&Patient>,
    use_colors: bool,
) -> String {
    let title = match patient {
        Some(p) if !p.condition.is_empty() => format!("{} ({}, {})", p.name, p.id, p.condition),
        Some(p) => format!("{} ({})", p.name, p.id),
        None => detail.patient_id.clone(),
    };
    let title = if use_colors { title.bold().to_string() } else { title };

    let mut lines = vec![title];
    match detail.latest {
        Some(latest) => lines.push(format!(
            "  Current status: {}  Risk score: {}",
            paint_status(latest.status(), 0, use_colors),
            format_score(latest.risk_score())
        )),
        None => lines.push("  No check-ins recorded".to_string()),
    }
    if !detail.symptom_trend.is_empty() {
        let trend = detail
            .symptom_trend
            .iter()
            .map(|p| format_score(p.value))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("  Symptom trend: {}", trend));
    }
    lines.push(format!(
        "  Check-ins: {} ({} without notes)",
        detail.check_ins, detail.missing_notes
    ));
    lines.join("\n")
}

/// Format the admin dashboard: KPI lines, per-day series and the follow-up queue
pub fn format_dashboard(
    summary: &DashboardSummary,
    patients: &[Patient],
    use_colors: bool,
) -> String {
    let window_days = summary.window.len_days();
    let heading = |s: &str| if use_colors { s.bold().to_string() } else { s.to_string() };
    let mut lines = Vec::new();

    lines.push(heading(&format!("Dashboard for {}", summary.today)));
    lines.push(format!("  Check-ins today:            {}", summary.check_ins_today));
    lines.push(format!(
        "  Missing check-ins ({}d):     {:.1}%",
        window_days, summary.missing_rate
    ));
    lines.push(format!(
        "  Flagged check-ins ({}d):     {}",
        window_days, summary.flagged
    ));
    lines.push(format!(
        "  Avg symptom score ({}d):     {}",
        window_days,
        format_optional_score(summary.avg_symptom_score)
    ));

    lines.push(String::new());
    lines.push(heading(&format!(
        "Per day ({} days): check-ins, avg risk",
        summary.trend.len_days()
    )));
    for (count, risk) in summary
        .check_ins_per_day
        .iter()
        .zip(&summary.avg_risk_per_day)
    {
        lines.push(format!(
            "  {}  {:>3}  {:>4}",
            count.date.format("%m-%d"),
            count.value,
            format_optional_score(risk.value)
        ));
    }

    lines.push(String::new());
    lines.push(heading("Needs follow-up"));
    if summary.needs_follow_up.is_empty() {
        lines.push("  Nobody needs follow-up.".to_string());
    } else {
        let by_id: HashMap<&str, &Patient> =
            patients.iter().map(|p| (p.id.as_str(), p)).collect();
        for row in &summary.needs_follow_up {
            let c = row.check_in();
            let (name, condition) = match by_id.get(c.patient_id.as_str()) {
                Some(p) => (p.name.as_str(), p.condition.as_str()),
                None => (c.patient_id.as_str(), "-"),
            };
            lines.push(format!(
                "  {}  {}  {}  {:>4}  {}",
                name,
                condition,
                c.date,
                format_score(row.risk_score()),
                paint_status(row.status(), 0, use_colors)
            ));
        }
    }

    lines.join("\n")
}
