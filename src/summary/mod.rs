//! The monthly financial summary: balance and income/expense totals, a
//! percentage-ranked category breakdown and the most recent transactions.

mod endpoint;
mod engine;

pub use endpoint::{SummaryParams, get_summary_endpoint};
pub use engine::{
    CategoryBreakdownEntry, DEFAULT_BREAKDOWN_COLOR, Summary, UNCATEGORIZED_LABEL,
    category_breakdown, compute_summary,
};
