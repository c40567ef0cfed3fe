//! Per-export error channel
//!
//! Recoverable failures (a transaction that would not fetch, an attachment
//! that would not decode, a ticket skipped by policy) are collected here,
//! one entry per failure, tagged with the identifiers involved. The report
//! is an explicit context object threaded through the pipeline, not a
//! global accumulator. Rendered lines go to a side log, never into the CSV
//! stream.

use crate::types::{TicketId, TransactionId};

/// One recoverable failure, tagged with the identifiers involved
#[derive(Clone, Debug)]
pub struct Issue {
    /// The ticket being exported when the failure occurred
    pub ticket: TicketId,
    /// The transaction involved, if the failure was below ticket level
    pub transaction: Option<TransactionId>,
    /// The attachment URL involved, if the failure was below transaction level
    pub attachment: Option<String>,
    /// What went wrong
    pub message: String,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ticket {}", self.ticket)?;
        if let Some(tx) = &self.transaction {
            write!(f, " transaction {}", tx)?;
        }
        if let Some(url) = &self.attachment {
            write!(f, " attachment {}", url)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered accumulation of an export run's recoverable failures
#[derive(Debug, Default)]
pub struct ExportReport {
    issues: Vec<Issue>,
}

impl ExportReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue; also emits one structured warning to the tracing log
    pub fn record(&mut self, issue: Issue) {
        tracing::warn!(issue = %issue, "recoverable export failure");
        self.issues.push(issue);
    }

    /// Record a ticket-level failure
    pub fn ticket_issue(&mut self, ticket: TicketId, message: impl Into<String>) {
        self.record(Issue {
            ticket,
            transaction: None,
            attachment: None,
            message: message.into(),
        });
    }

    /// Record a transaction-level failure
    pub fn transaction_issue(
        &mut self,
        ticket: TicketId,
        transaction: TransactionId,
        message: impl Into<String>,
    ) {
        self.record(Issue {
            ticket,
            transaction: Some(transaction),
            attachment: None,
            message: message.into(),
        });
    }

    /// Record an attachment-level failure
    pub fn attachment_issue(
        &mut self,
        ticket: TicketId,
        transaction: TransactionId,
        attachment: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.record(Issue {
            ticket,
            transaction: Some(transaction),
            attachment: Some(attachment.into()),
            message: message.into(),
        });
    }

    /// The recorded issues, in occurrence order
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Whether any issue was recorded
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of recorded issues
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Render the report as one log line per issue
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.issues.iter().map(|i| i.to_string())
    }
}
