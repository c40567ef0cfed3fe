//! # rt-csv-export
//!
//! Backend library for exporting Request Tracker (RT) tickets to flat CSV
//! rows. Each exported ticket is enriched with its creator, queue, custom
//! fields, and a textual digest of its correspondence history, assembled
//! from the ticket's paginated transaction listing and the text/HTML
//! attachments hanging off each transaction.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI; argument parsing, progress display
//!   and file I/O belong to the consuming application
//! - **Configuration over code** - Output column sets, literal defaults and
//!   value translations are data ([`ColumnProfile`]), not code branches
//! - **Partial results over aborts** - A failed transaction, attachment or
//!   ticket is recorded in the [`ExportReport`] and skipped; only an
//!   authentication failure stops the run
//!
//! ## Quick Start
//!
//! ```no_run
//! use rt_csv_export::{ApiConfig, Config, RtExporter, TicketId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         api: ApiConfig {
//!             base_url: "http://rt.example:8080".to_string(),
//!             username: "exporter".to_string(),
//!             password: "secret".to_string(),
//!             ..ApiConfig::default()
//!         },
//!         ..Config::default()
//!     };
//!
//!     let exporter = RtExporter::new(config)?;
//!     let output = exporter.export_range(TicketId(120), 20).await?;
//!
//!     print!("{}", exporter.render_csv(&output.records));
//!     for line in output.report.lines() {
//!         eprintln!("{line}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP client for the RT REST 2.0 API
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Attachment text extraction
pub mod extract;
/// Ticket history aggregation
pub mod history;
/// Record assembly and CSV cell rendering
pub mod record;
/// Per-export error channel
pub mod report;
/// Text sanitizers (balanced block removal, inline tag removal)
pub mod sanitize;
/// Core wire and domain types
pub mod types;

/// Export orchestration and CSV rendering
pub mod exporter;

// Re-export commonly used types
pub use client::RtClient;
pub use config::{
    ApiConfig, ColumnProfile, ColumnSource, ColumnSpec, Config, MappingConfig, MissingFieldPolicy,
};
pub use error::{Error, Result};
pub use exporter::{ExportOutput, RtExporter};
pub use record::convert_date;
pub use report::{ExportReport, Issue};
pub use sanitize::{strip_block, strip_inline_tags};
pub use types::{
    AttachmentContent, CellValue, CustomField, ExtractedFragment, HistoryPage, OutputRecord,
    Queue, Ticket, TicketId, Transaction, TransactionId, TransactionType, User,
};
