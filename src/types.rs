//! Core types for rt-csv-export
//!
//! Wire types mirror the RT REST 2.0 JSON resources consumed by the export
//! pipeline (ticket, user, queue, history page, transaction, attachment).
//! Field renames follow the API's names exactly (`_hyperlinks`, `ref`,
//! `_url`, PascalCase resource fields). Reference ids arrive as strings or
//! numbers depending on the resource, so id fields deserialize both.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Unique identifier for a ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl TicketId {
    /// Create a new TicketId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TicketId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TicketId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a transaction
///
/// The history listing returns transaction ids as strings while the
/// transaction resource itself uses numbers; both deserialize to this type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self(flexible_id(deserializer)?))
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Deserialize an id that may arrive as a JSON string or number
fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Reference to another API resource (creator, owner, queue, effective id)
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecordRef {
    /// The referenced resource's id (username for users, number for queues)
    #[serde(deserialize_with = "flexible_id", default)]
    pub id: String,
}

/// One named custom field on a ticket, with its ordered value sequence
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CustomField {
    /// The field name; looked up by first exact match, not guaranteed unique
    pub name: String,
    /// The ordered values of the field
    #[serde(default)]
    pub values: Vec<String>,
}

/// A helpdesk ticket snapshot, fetched once per export
#[derive(Clone, Debug, Deserialize)]
pub struct Ticket {
    /// The ticket's own id
    #[serde(deserialize_with = "flexible_id", default)]
    pub id: String,
    /// The effective id (differs from `id` for merged tickets)
    #[serde(rename = "EffectiveId", default)]
    pub effective_id: RecordRef,
    /// Reference to the user who created the ticket
    #[serde(rename = "Creator", default)]
    pub creator: RecordRef,
    /// Reference to the queue the ticket lives in
    #[serde(rename = "Queue", default)]
    pub queue: RecordRef,
    /// Reference to the ticket's current owner
    #[serde(rename = "Owner", default)]
    pub owner: RecordRef,
    /// Ticket subject line
    #[serde(rename = "Subject", default)]
    pub subject: String,
    /// Ticket status (new, open, resolved, ...)
    #[serde(rename = "Status", default)]
    pub status: String,
    /// SLA label, input to the severity translation table
    #[serde(rename = "SLA", default)]
    pub sla: Option<String>,
    /// Creation timestamp (ISO-8601)
    #[serde(rename = "Created", default)]
    pub created: Option<String>,
    /// Resolution timestamp, if resolved
    #[serde(rename = "Resolved", default)]
    pub resolved: Option<String>,
    /// First-correspondence timestamp
    #[serde(rename = "Started", default)]
    pub started: Option<String>,
    /// Last-correspondence timestamp
    #[serde(rename = "Told", default)]
    pub told: Option<String>,
    /// The ticket's custom fields, in server order
    #[serde(rename = "CustomFields", default)]
    pub custom_fields: Vec<CustomField>,
}

/// A user record, fetched to enrich the ticket's creator reference
#[derive(Clone, Debug, Default, Deserialize)]
pub struct User {
    /// Login name
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Display name, if set
    #[serde(rename = "RealName", default)]
    pub real_name: Option<String>,
    /// Organization the user belongs to
    #[serde(rename = "Organization", default)]
    pub organization: Option<String>,
}

/// A queue record, fetched to resolve the ticket's queue reference to a name
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Queue {
    /// Queue name
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// One page of a ticket's transaction history listing
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryPage {
    /// Transaction references on this page, in server order
    #[serde(default)]
    pub items: Vec<HistoryItem>,
    /// Total number of pages; declared by page 1, governs the page walk
    #[serde(default = "default_one")]
    pub pages: u32,
    /// Total number of transactions across all pages
    #[serde(default)]
    pub total: u64,
    /// This page's number (1-based)
    #[serde(default = "default_one")]
    pub page: u32,
}

fn default_one() -> u32 {
    1
}

/// One entry in a history listing page
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryItem {
    /// The transaction's id
    pub id: TransactionId,
}

/// Transaction type vocabulary
///
/// Only creation, correspondence and comment transactions contribute text to
/// the export; every other type is carried as [`Other`](Self::Other) and
/// ignored by the extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    /// Ticket creation
    Create,
    /// Outgoing/incoming correspondence
    Correspond,
    /// Internal comment
    Comment,
    /// Any other transaction type (status change, watcher change, ...)
    #[serde(other)]
    Other,
}

/// One recorded event on a ticket
#[derive(Clone, Debug, Deserialize)]
pub struct Transaction {
    /// The transaction's id
    pub id: TransactionId,
    /// The transaction's type tag
    #[serde(rename = "Type", default = "default_other")]
    pub kind: TransactionType,
    /// Hyperlinks to related resources; only `ref == "attachment"` entries
    /// are followed by the extractor
    #[serde(rename = "_hyperlinks", default)]
    pub hyperlinks: Vec<Hyperlink>,
}

fn default_other() -> TransactionType {
    TransactionType::Other
}

/// A hyperlink from a transaction to a related resource
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Hyperlink {
    /// The relation tag (`"attachment"`, `"self"`, ...)
    #[serde(rename = "ref", default)]
    pub relation: Option<String>,
    /// Absolute URL of the referenced resource
    #[serde(rename = "_url", default)]
    pub url: Option<String>,
}

/// An attachment resource body, fetched via a transaction hyperlink
#[derive(Clone, Debug, Deserialize)]
pub struct AttachmentContent {
    /// Raw MIME header block; only used to test the content type
    #[serde(rename = "Headers", default)]
    pub headers: String,
    /// Base64-encoded body, with embedded line breaks
    #[serde(rename = "Content", default)]
    pub content: String,
    /// Reference to the attachment's creator
    #[serde(rename = "Creator", default)]
    pub creator: RecordRef,
    /// Creation timestamp (ISO-8601)
    #[serde(rename = "Created", default)]
    pub created: Option<String>,
}

/// Decoded human-readable text of one qualifying attachment
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtractedFragment {
    /// Attachment creation timestamp, as returned by the server
    pub created: Option<String>,
    /// Id of the user who created the attachment
    pub creator: String,
    /// Decoded text content
    pub content: String,
}

/// One rendered CSV cell value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellValue {
    /// Free text: rendered double-quoted with internal quotes escaped
    Text(String),
    /// Scalar (ids, dates, statuses): rendered verbatim, unquoted
    Raw(String),
    /// No value available: rendered as an empty cell
    Absent,
}

/// The flat record produced once per ticket
///
/// An ordered mapping from configured column name to cell value; ordering is
/// the column profile's ordering and is part of the CSV contract.
#[derive(Clone, Debug, Default)]
pub struct OutputRecord {
    /// Cells keyed by column name, in profile order
    pub cells: IndexMap<String, CellValue>,
}

impl OutputRecord {
    /// Look up a cell by column name
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }
}
