//! Configuration types for rt-csv-export
//!
//! Everything that varies between deployments is data here: the API
//! endpoint and credentials, the output column profile, the value
//! translation tables, and the missing-field policy. The two historical
//! column sets (generic export and CRM import) are both expressed as
//! [`ColumnProfile`] values, not code branches; consumers can load their
//! own profile from JSON/TOML or start from the built-in constructors.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Remote API endpoint and credentials
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base host URL, e.g. `http://localhost:8080`; the REST 2.0 path is
    /// appended by the client
    pub base_url: String,

    /// Basic-auth username
    pub username: String,

    /// Basic-auth password
    pub password: String,

    /// Per-request timeout (default: 30 seconds)
    ///
    /// Without a bound, a hung fetch blocks its ticket's pipeline
    /// indefinitely.
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    pub fetch_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            username: String::new(),
            password: String::new(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

/// What to do when a column's custom field is absent from a ticket
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Emit an empty cell and record the miss in the export report
    #[default]
    EmitEmpty,
    /// Skip the whole ticket (the lookup error propagates)
    SkipTicket,
}

/// Static value translation tables
///
/// An input key absent from a table means "no translation available"; the
/// assembler then falls back to the raw value rather than failing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    /// SLA label -> severity tier
    #[serde(default)]
    pub severity: HashMap<String, String>,

    /// Owner username -> display name
    #[serde(default)]
    pub assignee: HashMap<String, String>,
}

impl MappingConfig {
    /// Translate an SLA label, if a mapping is configured for it
    pub fn severity_for(&self, sla: &str) -> Option<&str> {
        self.severity.get(sla).map(String::as_str)
    }

    /// Translate an owner username, if a mapping is configured for it
    pub fn assignee_for(&self, owner: &str) -> Option<&str> {
        self.assignee.get(owner).map(String::as_str)
    }
}

/// Where a column's value comes from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ColumnSource {
    /// The ticket's own id
    TicketId,
    /// The ticket's effective id (differs for merged tickets)
    EffectiveId,
    /// Ticket subject
    Subject,
    /// Ticket status
    Status,
    /// Resolved queue name
    QueueName,
    /// Owner username
    Owner,
    /// Creator username
    Creator,
    /// Creator's organization, from the user resource
    CreatorOrg,
    /// Creation timestamp, date-formatted
    Created,
    /// Resolution timestamp, date-formatted
    Resolved,
    /// First-correspondence timestamp, date-formatted
    Started,
    /// Last-correspondence timestamp, date-formatted
    Told,
    /// A named custom field's value(s), joined with `", "`
    CustomField {
        /// The custom field name to look up
        field: String,
    },
    /// Creation + correspondence text digest
    Description,
    /// Comment text digest
    Comments,
    /// SLA label run through the severity table
    Severity,
    /// Owner username run through the assignee table
    Assignee,
    /// A fixed literal value (configuration, not derived data)
    Literal {
        /// The literal to emit for every ticket
        value: String,
    },
}

/// One output column: name, value source, and quoting behavior
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name, emitted in the header row
    pub name: String,

    /// Where the column's value comes from
    #[serde(flatten)]
    pub source: ColumnSource,

    /// Render as a quoted free-text cell (internal `"` backslash-escaped)
    #[serde(default)]
    pub quoted: bool,
}

impl ColumnSpec {
    fn new(name: &str, source: ColumnSource) -> Self {
        Self {
            name: name.to_string(),
            source,
            quoted: false,
        }
    }

    fn quoted(name: &str, source: ColumnSource) -> Self {
        Self {
            name: name.to_string(),
            source,
            quoted: true,
        }
    }
}

/// An ordered output column set plus its text-handling switches
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// The columns, in output order
    pub columns: Vec<ColumnSpec>,

    /// Strip inline markup from the description digest (the CRM profile
    /// does, the generic profile preserves it); comments are always stripped
    #[serde(default)]
    pub strip_inline_description: bool,

    /// Balanced block tags removed from digest text before inline handling
    /// (quote markers and document wrappers by default)
    #[serde(default = "default_block_strip_tags")]
    pub block_strip_tags: Vec<String>,
}

impl Default for ColumnProfile {
    fn default() -> Self {
        Self::generic()
    }
}

impl ColumnProfile {
    /// The generic 16-column export profile
    ///
    /// Column names and order match the tool's historical flat export.
    pub fn generic() -> Self {
        use ColumnSource as S;
        Self {
            columns: vec![
                ColumnSpec::new("id", S::EffectiveId),
                ColumnSpec::quoted("all_other_correspondence", S::Description),
                ColumnSpec::quoted("any_comment", S::Comments),
                ColumnSpec::new("closed", S::Resolved),
                ColumnSpec::new("created", S::Created),
                ColumnSpec::new("customer", S::Creator),
                ColumnSpec::new("customer_group", S::CreatorOrg),
                ColumnSpec::new("first_correspondence", S::Started),
                ColumnSpec::new("last_correspondence", S::Told),
                ColumnSpec::quoted(
                    "outcome",
                    S::CustomField {
                        field: "Outcome".to_string(),
                    },
                ),
                ColumnSpec::new("owner", S::Owner),
                ColumnSpec::new("queue", S::QueueName),
                ColumnSpec::quoted(
                    "security_incident",
                    S::CustomField {
                        field: "Security Incident".to_string(),
                    },
                ),
                ColumnSpec::new("status", S::Status),
                ColumnSpec::quoted("subject", S::Subject),
                ColumnSpec::quoted(
                    "tickettype",
                    S::CustomField {
                        field: "TicketType".to_string(),
                    },
                ),
            ],
            strip_inline_description: false,
            block_strip_tags: default_block_strip_tags(),
        }
    }

    /// The CRM-import profile
    ///
    /// Adds translated severity/assignee columns and literal-default columns
    /// the API does not source. The literals here are shipped defaults;
    /// override them by editing the profile data, not the code.
    pub fn crm_import() -> Self {
        use ColumnSource as S;
        Self {
            columns: vec![
                ColumnSpec::new("Ticket Number", S::EffectiveId),
                ColumnSpec::new(
                    "Record Type",
                    S::Literal {
                        value: "Support".to_string(),
                    },
                ),
                ColumnSpec::new(
                    "Related Record",
                    S::Literal {
                        value: "HELPDESK".to_string(),
                    },
                ),
                ColumnSpec::quoted("Summary", S::Subject),
                ColumnSpec::quoted("Description", S::Description),
                ColumnSpec::quoted("Comments", S::Comments),
                ColumnSpec::new("Severity", S::Severity),
                ColumnSpec::new("Assignee", S::Assignee),
                ColumnSpec::new("Status", S::Status),
                ColumnSpec::new("Queue", S::QueueName),
                ColumnSpec::new("Reporter", S::Creator),
                ColumnSpec::quoted("Organisation", S::CreatorOrg),
                ColumnSpec::new("Created", S::Created),
                ColumnSpec::new("Resolved", S::Resolved),
            ],
            strip_inline_description: true,
            block_strip_tags: default_block_strip_tags(),
        }
    }
}

/// Main configuration for the exporter
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API endpoint and credentials
    #[serde(default)]
    pub api: ApiConfig,

    /// Output column profile (default: the generic export profile)
    #[serde(default)]
    pub profile: ColumnProfile,

    /// Value translation tables
    #[serde(default)]
    pub mappings: MappingConfig,

    /// Missing custom field handling (default: emit empty, record the miss)
    #[serde(default)]
    pub missing_fields: MissingFieldPolicy,
}

impl Config {
    /// Check the configuration for problems a consumer would otherwise only
    /// discover mid-export
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| Error::Config {
            message: format!("invalid base_url `{}`: {}", self.api.base_url, e),
            key: Some("api.base_url".to_string()),
        })?;

        if self.profile.columns.is_empty() {
            return Err(Error::Config {
                message: "column profile has no columns".to_string(),
                key: Some("profile.columns".to_string()),
            });
        }

        Ok(())
    }
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_block_strip_tags() -> Vec<String> {
    vec!["blockquote".to_string(), "head".to_string()]
}

// Duration serialization helper (seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
