//! Tools the demo agents can call.

mod chart;
mod search;
mod spreadsheet;

pub use chart::ChartTool;
pub use search::SearchTool;
pub use spreadsheet::SpreadsheetTool;
