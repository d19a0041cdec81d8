pub mod formatter;

pub use formatter::{
    format_breakdown, format_dashboard, format_json, format_patient_detail, format_roster,
    format_score, format_scored_table, format_tsv, paint_status, should_use_colors,
};
