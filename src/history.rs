//! Ticket history aggregation
//!
//! Walks a ticket's paginated transaction listing and resolves each listed
//! id to a full transaction record. Pages are fetched strictly in
//! increasing order starting at 1; the first page declares the total page
//! count. The failure asymmetry is deliberate: a single transaction that
//! fails to fetch is recorded in the report and excluded, while a page
//! that fails to fetch aborts the whole ticket's aggregation.

use crate::client::RtClient;
use crate::error::Result;
use crate::report::ExportReport;
use crate::types::{HistoryPage, TicketId, Transaction};

/// Fetch the complete ordered transaction sequence for a ticket
///
/// Server-returned page order is preserved. Recoverable per-transaction
/// failures are recorded in `report`; page failures (and fatal errors such
/// as an authentication rejection) propagate.
pub async fn fetch_history(
    client: &RtClient,
    ticket: TicketId,
    report: &mut ExportReport,
) -> Result<Vec<Transaction>> {
    let first = client.history_page(ticket, 1).await?;
    let pages = first.pages;
    tracing::debug!(
        ticket = %ticket,
        pages,
        total = first.total,
        "walking transaction history"
    );

    let mut transactions = Vec::with_capacity(first.total as usize);
    collect_page(client, ticket, &first, &mut transactions, report).await?;

    for page in 2..=pages {
        let listing = client.history_page(ticket, page).await?;
        collect_page(client, ticket, &listing, &mut transactions, report).await?;
    }

    Ok(transactions)
}

/// Resolve one listing page's items to transaction records
///
/// Only fatal errors propagate from here; an ordinary fetch failure excludes
/// that one transaction and the walk continues.
async fn collect_page(
    client: &RtClient,
    ticket: TicketId,
    listing: &HistoryPage,
    out: &mut Vec<Transaction>,
    report: &mut ExportReport,
) -> Result<()> {
    for item in &listing.items {
        match client.transaction(&item.id).await {
            Ok(tx) => out.push(tx),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                report.transaction_issue(ticket, item.id.clone(), e.to_string());
            }
        }
    }
    Ok(())
}
