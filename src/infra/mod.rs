//! File-system edges of the engine: reading sales sheets and writing reports.

pub mod export;
pub mod loader;

pub use export::{export_rows_csv, export_totals_csv, CommissionReport, ExportError};
pub use loader::{load_records, LoadError, SheetFormat};
