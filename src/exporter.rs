//! Export orchestration
//!
//! [`RtExporter`] runs the per-ticket pipeline (ticket, creator, queue,
//! history aggregation, fragment extraction, record assembly) and drives it
//! across a set of tickets. Tickets are processed one at a time; a ticket's
//! internal fetch sequence is strictly ordered, page N+1 never before page
//! N. A ticket that fails is recorded in the report and skipped; an
//! authentication failure aborts the run, since every later ticket would
//! fail identically.

use crate::client::RtClient;
use crate::config::Config;
use crate::error::Result;
use crate::extract::extract_fragments;
use crate::history::fetch_history;
use crate::record::{self, AssembleInput, render_cell};
use crate::report::ExportReport;
use crate::types::{OutputRecord, TicketId, TransactionType};

/// The result of an export run: assembled records plus the error channel
#[derive(Debug)]
pub struct ExportOutput {
    /// One record per successfully exported ticket, in processing order
    pub records: Vec<OutputRecord>,
    /// Recoverable failures encountered along the way
    pub report: ExportReport,
}

/// Ticket export pipeline driver
#[derive(Clone, Debug)]
pub struct RtExporter {
    client: RtClient,
    config: Config,
}

impl RtExporter {
    /// Build an exporter from configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = RtClient::new(&config.api)?;
        Ok(Self { client, config })
    }

    /// The exporter's configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the full assembly pipeline for one ticket
    ///
    /// Recoverable sub-ticket failures land in `report`; an error return
    /// means this ticket produced no record.
    pub async fn export_ticket(
        &self,
        id: TicketId,
        report: &mut ExportReport,
    ) -> Result<OutputRecord> {
        tracing::info!(ticket = %id, "exporting ticket");

        let ticket = self.client.ticket(id).await?;
        let user = self.client.user(&ticket.creator.id).await?;
        let queue = self.client.queue(&ticket.queue.id).await?;

        let transactions = fetch_history(&self.client, id, report).await?;

        let creation =
            extract_fragments(&self.client, id, &transactions, TransactionType::Create, report)
                .await?;
        let correspondence = extract_fragments(
            &self.client,
            id,
            &transactions,
            TransactionType::Correspond,
            report,
        )
        .await?;
        let comments =
            extract_fragments(&self.client, id, &transactions, TransactionType::Comment, report)
                .await?;

        let input = AssembleInput {
            ticket_id: id,
            ticket: &ticket,
            user: &user,
            queue: &queue,
            creation: &creation,
            correspondence: &correspondence,
            comments: &comments,
        };
        record::assemble(&self.config, &input, report)
    }

    /// Export a set of tickets sequentially
    ///
    /// Produces a partial result when individual tickets fail; only an
    /// authentication failure aborts the whole run.
    pub async fn export_tickets(
        &self,
        ids: impl IntoIterator<Item = TicketId>,
    ) -> Result<ExportOutput> {
        let mut report = ExportReport::new();
        let mut records = Vec::new();

        for id in ids {
            match self.export_ticket(id, &mut report).await {
                Ok(rec) => records.push(rec),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => report.ticket_issue(id, format!("ticket skipped: {e}")),
            }
        }

        Ok(ExportOutput { records, report })
    }

    /// Export `how_many` tickets walking downward from `top`
    pub async fn export_range(&self, top: TicketId, how_many: u64) -> Result<ExportOutput> {
        self.export_tickets(range_ids(top, how_many)).await
    }

    /// Render the header row for the configured profile
    pub fn csv_header(&self) -> String {
        self.config
            .profile
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Render records as CSV: one header row, then one line per ticket
    ///
    /// Cell order and quoting follow the configured profile. The returned
    /// string ends with a newline so it can be appended to a sink as-is.
    pub fn render_csv(&self, records: &[OutputRecord]) -> String {
        let mut out = self.csv_header();
        out.push('\n');
        for record in records {
            let row = self
                .config
                .profile
                .columns
                .iter()
                .map(|spec| {
                    record
                        .get(&spec.name)
                        .map(render_cell)
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&row);
            out.push('\n');
        }
        out
    }
}

/// Ticket ids walking downward from `top`, stopping at id 1
fn range_ids(top: TicketId, how_many: u64) -> Vec<TicketId> {
    (0..how_many)
        .map_while(|offset| top.get().checked_sub(offset))
        .take_while(|id| *id > 0)
        .map(TicketId)
        .collect()
}
