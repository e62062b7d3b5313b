use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::quiz::{AnswerScale, QuestionCatalog, Role};
use crate::scoring::ScoreReport;
use crate::store::{PremiumContent, SessionId, SessionStatus, TestSession};

const BAR_WIDTH: usize = 20;
const NAME_WIDTH: usize = 24;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Whole-percent display of a [0, 100] score, rounding half away from zero
pub fn format_percent(score: f64) -> String {
    format!("{}%", score.round() as i64)
}

/// Fixed-width bar, one cell per 5%
pub fn score_bar(score: f64, width: usize) -> String {
    let filled = ((score.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
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

fn short_id(id: SessionId) -> String {
    id.to_string().chars().take(8).collect()
}

/// Category bars plus the overall percentage.
/// Nothing to compare renders as a valid, empty result.
pub fn format_report(report: &ScoreReport, use_colors: bool) -> String {
    let mut lines: Vec<String> = report
        .categories
        .iter()
        .map(|category| {
            let name = format!("{:<width$}", category.category.display_name(), width = NAME_WIDTH);
            let bar = score_bar(category.score, BAR_WIDTH);
            let percent = format!("{:>4}", format_percent(category.score));
            if use_colors {
                format!("{} {} {}", name, colored_bar(&bar, category.score), percent.bold())
            } else {
                format!("{} {} {}", name, bar, percent)
            }
        })
        .collect();

    if lines.is_empty() {
        lines.push("No comparable answers yet.".to_string());
    }
    lines.push(String::new());
    let overall = format_percent(report.overall);
    let summary = format!(
        "({} answers compared, {})",
        report.pairs, report.policy
    );
    if use_colors {
        lines.push(format!("{} {} {}", "Overall compatibility:".bold(), overall.bold(), summary.dimmed()));
    } else {
        lines.push(format!("Overall compatibility: {} {}", overall, summary));
    }

    lines.join("\n")
}

fn colored_bar(bar: &str, score: f64) -> String {
    if score >= 75.0 {
        bar.green().to_string()
    } else if score >= 50.0 {
        bar.yellow().to_string()
    } else {
        bar.red().to_string()
    }
}

/// Per-question agreement lines, one per compared pair
pub fn format_breakdown(report: &ScoreReport, catalog: &QuestionCatalog, use_colors: bool) -> String {
    if report.breakdown.is_empty() {
        return String::new();
    }

    let term_width = get_terminal_width();
    // id(4) + 2 + answers(6) + 2 + percent(4) + 2
    let fixed_width = 20;

    report
        .breakdown
        .iter()
        .map(|pair| {
            let text = catalog
                .get(&pair.question_id)
                .map(|q| q.text.as_str())
                .unwrap_or_default();
            let text = match term_width {
                Some(width) if width > fixed_width + 10 => truncate_text(text, width - fixed_width),
                Some(_) => truncate_text(text, 20),
                None => text.to_string(),
            };
            let answers = format!("{} vs {}", pair.self_value, pair.partner_value);
            let percent = format!("{:>4}", format_percent(pair.agreement));
            if use_colors {
                format!("{:<4}  {}  {}  {}", pair.question_id.dimmed(), answers, percent.bold(), text)
            } else {
                format!("{:<4}  {}  {}  {}", pair.question_id, answers, percent, text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tab-separated category scores for scripting, overall last.
/// Scores are whole percents, no headers, no colors.
pub fn format_report_tsv(report: &ScoreReport) -> String {
    report
        .categories
        .iter()
        .map(|c| format!("{}\t{}\t{}", c.category.as_str(), c.score.round() as i64, c.pairs))
        .chain(std::iter::once(format!(
            "overall\t{}\t{}",
            report.overall.round() as i64,
            report.pairs
        )))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One dashboard row
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub role: Role,
    pub partner: Option<String>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    /// Overall score; 0 until the session is completed
    pub score: f64,
}

/// Dashboard table: index, id, status, age, other participant, score
pub fn format_session_table(sessions: &[SessionSummary], now: DateTime<Utc>, use_colors: bool) -> String {
    if sessions.is_empty() {
        return "No sessions yet. Run `couplefin start` to begin.".to_string();
    }

    sessions
        .iter()
        .enumerate()
        .map(|(idx, summary)| {
            let index_str = format!("{:>2}.", idx + 1);
            let age = format!("{:>4}", format_age(now - summary.created_at));
            let status = format!("{:<9}", summary.status.to_string());
            let with = match (&summary.partner, summary.role) {
                (Some(other), Role::Owner) => format!("with {}", other),
                (Some(other), Role::Partner) => format!("invited by {}", other),
                (None, _) => "no partner yet".to_string(),
            };
            let score = format!("{:>4}", format_percent(summary.score));

            if use_colors {
                let status = match summary.status {
                    SessionStatus::Completed => status.green().to_string(),
                    SessionStatus::Pending => status.yellow().to_string(),
                };
                format!(
                    "{} {}  {}  {}  {}  {}",
                    index_str.dimmed(),
                    score.bold(),
                    status,
                    age,
                    short_id(summary.id).underline(),
                    with
                )
            } else {
                format!(
                    "{} {}  {}  {}  {}  {}",
                    index_str,
                    score,
                    status,
                    age,
                    short_id(summary.id),
                    with
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Where a session stands and who it is waiting on
pub fn format_session_status(session: &TestSession, total_questions: usize) -> String {
    let mut lines = vec![format!("Session {}: {}", session.id, session.status)];

    let side = |role: Role, who: Option<&str>| -> String {
        let Some(who) = who else {
            return format!("  {:<8} not joined", role.as_str());
        };
        let answered = session.answers_for(role).len();
        let state = if session.is_submitted(role) {
            "submitted".to_string()
        } else {
            format!("answered {}/{}", answered, total_questions)
        };
        format!("  {:<8} {} ({})", role.as_str(), who, state)
    };

    lines.push(side(Role::Owner, Some(&session.owner)));
    lines.push(side(Role::Partner, session.partner.as_deref()));

    if let Some(role) = session.waiting_on() {
        lines.push(format!("Waiting on: {}", role));
    }
    lines.join("\n")
}

/// Print the catalog grouped by category, with the answer scale at the end
pub fn format_catalog(catalog: &QuestionCatalog, scale: AnswerScale, use_colors: bool) -> String {
    let mut lines = Vec::new();
    for category in catalog.categories() {
        let title = category.display_name();
        if use_colors {
            lines.push(title.bold().to_string());
        } else {
            lines.push(title.to_string());
        }
        for question in catalog.by_category(category) {
            lines.push(format!("  {:<4} {}", question.id, question.text));
        }
        lines.push(String::new());
    }

    let choices = scale
        .values()
        .map(|v| match scale.label(v) {
            Some(label) => format!("{} = {}", v, label),
            None => v.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("Answers: {}", choices));
    lines.join("\n")
}

pub fn format_premium_list(items: &[PremiumContent], use_colors: bool) -> String {
    if items.is_empty() {
        return "No premium content yet.".to_string();
    }

    items
        .iter()
        .map(|item| {
            let kind = format!("[{}]", item.kind.label());
            let head = if use_colors {
                format!("{} {}", kind.cyan(), item.title.bold())
            } else {
                format!("{} {}", kind, item.title)
            };
            let mut entry = head;
            if !item.description.is_empty() {
                entry.push_str(&format!("\n  {}", item.description));
            }
            if !item.url.is_empty() {
                if use_colors {
                    entry.push_str(&format!("\n  {}", item.url.underline()));
                } else {
                    entry.push_str(&format!("\n  {}", item.url));
                }
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}
