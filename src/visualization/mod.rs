mod tables;

pub use tables::{
    format_coefficients_table, print_coefficients_table,
    format_projection_table, print_projection_table,
    format_stand_summary, print_stand_summary,
    format_statistics_table, print_statistics_table,
    format_summary_table, print_summary_table,
    format_thin_outcome, print_stand_report,
};
