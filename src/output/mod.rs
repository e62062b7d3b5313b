pub mod formatter;

pub use formatter::{
    format_age, format_breakdown, format_catalog, format_percent, format_premium_list,
    format_report, format_report_tsv, format_session_status, format_session_table, score_bar,
    should_use_colors, SessionSummary,
};
