//! Record assembly
//!
//! Composes one [`OutputRecord`] per ticket from the fetched ticket, user
//! and queue resources plus the extracted text fragments, driven entirely
//! by the configured [`ColumnProfile`](crate::config::ColumnProfile). Also
//! home to the small pure helpers the assembler is built from: date
//! conversion, custom-field lookup, digest rendering and CSV cell quoting.

use crate::config::{ColumnSource, Config, MissingFieldPolicy};
use crate::error::{Error, Result};
use crate::report::ExportReport;
use crate::sanitize::{strip_block, strip_inline_tags};
use crate::types::{
    CellValue, CustomField, ExtractedFragment, OutputRecord, Queue, Ticket, TicketId, User,
};
use indexmap::IndexMap;

/// Render an ISO-8601 timestamp as `DD/MM/YYYY HH:MM:SS` in Europe/London
///
/// An absent (or empty) input yields an absent output rather than an error.
/// An unparsable input also yields an absent output, with a warning logged.
///
/// # Examples
///
/// ```
/// use rt_csv_export::record::convert_date;
///
/// assert_eq!(
///     convert_date(Some("2022-01-01T00:00:00Z")),
///     Some("01/01/2022 00:00:00".to_string())
/// );
/// assert_eq!(convert_date(None), None);
/// ```
pub fn convert_date(date: Option<&str>) -> Option<String> {
    let date = date?;
    if date.is_empty() {
        return None;
    }
    match chrono::DateTime::parse_from_rfc3339(date) {
        Ok(parsed) => Some(
            parsed
                .with_timezone(&chrono_tz::Europe::London)
                .format("%d/%m/%Y %H:%M:%S")
                .to_string(),
        ),
        Err(e) => {
            tracing::warn!(date, error = %e, "unparsable timestamp");
            None
        }
    }
}

/// Look up a named custom field and join its values with `", "`
///
/// Returns the first field whose name matches exactly; a miss is a typed
/// [`Error::FieldNotFound`], never a silent empty value.
pub fn custom_field_value(fields: &[CustomField], name: &str) -> Result<String> {
    fields
        .iter()
        .find(|f| f.name == name)
        .map(|f| f.values.join(", "))
        .ok_or_else(|| Error::FieldNotFound {
            name: name.to_string(),
        })
}

/// Render a free-text value as a quoted CSV cell
///
/// Internal double quotes are backslash-prefixed and the value is wrapped
/// in a literal quote pair. Line breaks are collapsed to spaces so a record
/// always occupies one output line.
pub fn quote_text(text: &str) -> String {
    let flat = flatten_line_breaks(text);
    format!("\"{}\"", flat.replace('"', "\\\""))
}

fn flatten_line_breaks(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Render an assembled cell for the output row
pub fn render_cell(cell: &CellValue) -> String {
    match cell {
        CellValue::Absent => String::new(),
        CellValue::Raw(v) => flatten_line_breaks(v),
        CellValue::Text(v) => quote_text(v),
    }
}

/// Render ordered fragments into one digest string
///
/// Each fragment's content is block-sanitized with the configured tags and
/// optionally stripped of inline markup, then prefixed with its converted
/// timestamp and creator. Fragments are joined with `"; "`.
pub fn render_digest(
    fragments: &[&ExtractedFragment],
    block_tags: &[String],
    strip_inline: bool,
) -> String {
    fragments
        .iter()
        .map(|f| {
            let mut content = f.content.clone();
            for tag in block_tags {
                content = strip_block(&content, tag);
            }
            if strip_inline {
                content = strip_inline_tags(Some(&content)).unwrap_or_default();
            }
            match convert_date(f.created.as_deref()) {
                Some(date) => format!("{} {}: {}", date, f.creator, content),
                None => format!("{}: {}", f.creator, content),
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything the assembler needs for one ticket
pub struct AssembleInput<'a> {
    /// The id the export was driven by (used to tag report entries)
    pub ticket_id: TicketId,
    /// The fetched ticket snapshot
    pub ticket: &'a Ticket,
    /// The ticket creator's user record
    pub user: &'a User,
    /// The ticket's queue record
    pub queue: &'a Queue,
    /// Fragments from creation transactions
    pub creation: &'a [ExtractedFragment],
    /// Fragments from correspondence transactions
    pub correspondence: &'a [ExtractedFragment],
    /// Fragments from comment transactions
    pub comments: &'a [ExtractedFragment],
}

/// Assemble the flat output record for one ticket
///
/// The description digest concatenates creation fragments then
/// correspondence fragments, in that order; inline markup in it is stripped
/// or preserved per the profile. The comment digest always has inline
/// markup stripped. A custom-field lookup miss follows the configured
/// [`MissingFieldPolicy`]: either an empty cell plus a report entry, or a
/// propagated error that skips the ticket.
pub fn assemble(
    config: &Config,
    input: &AssembleInput<'_>,
    report: &mut ExportReport,
) -> Result<OutputRecord> {
    let profile = &config.profile;
    let ticket = input.ticket;

    let description_fragments: Vec<&ExtractedFragment> = input
        .creation
        .iter()
        .chain(input.correspondence.iter())
        .collect();
    let description = render_digest(
        &description_fragments,
        &profile.block_strip_tags,
        profile.strip_inline_description,
    );

    let comment_fragments: Vec<&ExtractedFragment> = input.comments.iter().collect();
    let comments = render_digest(&comment_fragments, &profile.block_strip_tags, true);

    let mut cells = IndexMap::with_capacity(profile.columns.len());
    for spec in &profile.columns {
        let value = match &spec.source {
            ColumnSource::TicketId => Some(ticket.id.clone()),
            ColumnSource::EffectiveId => Some(ticket.effective_id.id.clone()),
            ColumnSource::Subject => Some(ticket.subject.clone()),
            ColumnSource::Status => Some(ticket.status.clone()),
            ColumnSource::QueueName => Some(input.queue.name.clone()),
            ColumnSource::Owner => Some(ticket.owner.id.clone()),
            ColumnSource::Creator => Some(ticket.creator.id.clone()),
            ColumnSource::CreatorOrg => input.user.organization.clone(),
            ColumnSource::Created => convert_date(ticket.created.as_deref()),
            ColumnSource::Resolved => convert_date(ticket.resolved.as_deref()),
            ColumnSource::Started => convert_date(ticket.started.as_deref()),
            ColumnSource::Told => convert_date(ticket.told.as_deref()),
            ColumnSource::CustomField { field } => {
                match custom_field_value(&ticket.custom_fields, field) {
                    Ok(value) => Some(value),
                    Err(e) => match config.missing_fields {
                        MissingFieldPolicy::SkipTicket => return Err(e),
                        MissingFieldPolicy::EmitEmpty => {
                            report.ticket_issue(
                                input.ticket_id,
                                format!("{e}; emitting empty cell `{}`", spec.name),
                            );
                            None
                        }
                    },
                }
            }
            ColumnSource::Description => Some(description.clone()),
            ColumnSource::Comments => Some(comments.clone()),
            ColumnSource::Severity => ticket.sla.as_ref().map(|sla| {
                config
                    .mappings
                    .severity_for(sla)
                    .unwrap_or(sla.as_str())
                    .to_string()
            }),
            ColumnSource::Assignee => Some(
                config
                    .mappings
                    .assignee_for(&ticket.owner.id)
                    .unwrap_or(ticket.owner.id.as_str())
                    .to_string(),
            ),
            ColumnSource::Literal { value } => Some(value.clone()),
        };

        let cell = match value {
            None => CellValue::Absent,
            Some(v) if spec.quoted => CellValue::Text(v),
            Some(v) => CellValue::Raw(v),
        };
        cells.insert(spec.name.clone(), cell);
    }

    Ok(OutputRecord { cells })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnProfile, MappingConfig};
    use crate::types::RecordRef;

    #[test]
    fn converts_a_winter_timestamp_without_offset() {
        assert_eq!(
            convert_date(Some("2022-01-01T00:00:00Z")),
            Some("01/01/2022 00:00:00".to_string())
        );
    }

    #[test]
    fn converts_a_summer_timestamp_one_hour_ahead() {
        // Europe/London is UTC+1 during British Summer Time
        assert_eq!(
            convert_date(Some("2022-06-01T12:00:00Z")),
            Some("01/06/2022 13:00:00".to_string())
        );
    }

    #[test]
    fn absent_and_empty_dates_stay_absent() {
        assert_eq!(convert_date(None), None);
        assert_eq!(convert_date(Some("")), None);
    }

    #[test]
    fn unparsable_dates_yield_absent() {
        assert_eq!(convert_date(Some("not a date")), None);
    }

    fn sample_fields() -> Vec<CustomField> {
        vec![
            CustomField {
                name: "Outcome".to_string(),
                values: vec!["Fixed".to_string()],
            },
            CustomField {
                name: "TicketType".to_string(),
                values: vec!["Incident".to_string(), "Hardware".to_string()],
            },
            CustomField {
                name: "Outcome".to_string(),
                values: vec!["Duplicate entry, ignored".to_string()],
            },
        ]
    }

    #[test]
    fn field_lookup_joins_multiple_values() {
        let value = custom_field_value(&sample_fields(), "TicketType").unwrap();
        assert_eq!(value, "Incident, Hardware");
    }

    #[test]
    fn field_lookup_takes_the_first_match() {
        let value = custom_field_value(&sample_fields(), "Outcome").unwrap();
        assert_eq!(value, "Fixed");
    }

    #[test]
    fn field_lookup_miss_is_a_typed_not_found() {
        let err = custom_field_value(&sample_fields(), "Severity").unwrap_err();
        assert!(matches!(err, Error::FieldNotFound { name } if name == "Severity"));
    }

    #[test]
    fn quoting_escapes_embedded_quotes() {
        assert_eq!(
            quote_text("she said \"hello\""),
            "\"she said \\\"hello\\\"\""
        );
    }

    #[test]
    fn quoting_collapses_line_breaks() {
        assert_eq!(quote_text("one\r\ntwo\nthree"), "\"one two three\"");
    }

    fn fragment(created: Option<&str>, creator: &str, content: &str) -> ExtractedFragment {
        ExtractedFragment {
            created: created.map(str::to_string),
            creator: creator.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn digest_orders_and_labels_fragments() {
        let a = fragment(Some("2022-01-01T00:00:00Z"), "jdoe", "first message");
        let b = fragment(None, "staff", "second message");
        let digest = render_digest(&[&a, &b], &[], false);
        assert_eq!(
            digest,
            "01/01/2022 00:00:00 jdoe: first message; staff: second message"
        );
    }

    #[test]
    fn digest_strips_blocks_and_optionally_inline_markup() {
        let f = fragment(
            None,
            "jdoe",
            "<blockquote>old reply</blockquote><p>the <strong>news</strong></p>",
        );
        let block_tags = vec!["blockquote".to_string()];

        let preserved = render_digest(&[&f], &block_tags, false);
        assert_eq!(preserved, "jdoe: <p>the <strong>news</strong></p>");

        let stripped = render_digest(&[&f], &block_tags, true);
        assert_eq!(stripped, "jdoe: the news");
    }

    fn sample_ticket() -> Ticket {
        Ticket {
            id: "42".to_string(),
            effective_id: RecordRef {
                id: "42".to_string(),
            },
            creator: RecordRef {
                id: "jdoe".to_string(),
            },
            queue: RecordRef {
                id: "1".to_string(),
            },
            owner: RecordRef {
                id: "root".to_string(),
            },
            subject: "Printer \"on fire\"".to_string(),
            status: "resolved".to_string(),
            sla: Some("urgent".to_string()),
            created: Some("2022-01-01T00:00:00Z".to_string()),
            resolved: Some("2022-01-02T10:30:00Z".to_string()),
            started: None,
            told: None,
            custom_fields: vec![CustomField {
                name: "Outcome".to_string(),
                values: vec!["Fixed".to_string()],
            }],
        }
    }

    fn sample_input<'a>(
        ticket: &'a Ticket,
        user: &'a User,
        queue: &'a Queue,
        correspondence: &'a [ExtractedFragment],
    ) -> AssembleInput<'a> {
        AssembleInput {
            ticket_id: TicketId(42),
            ticket,
            user,
            queue,
            creation: &[],
            correspondence,
            comments: &[],
        }
    }

    #[test]
    fn assembles_the_generic_profile_in_column_order() {
        let config = Config::default();
        let ticket = sample_ticket();
        let user = User {
            name: "jdoe".to_string(),
            real_name: None,
            organization: Some("Acme".to_string()),
        };
        let queue = Queue {
            name: "Helpdesk".to_string(),
        };
        let correspondence = vec![fragment(None, "jdoe", "hello there")];

        let mut report = ExportReport::new();
        let record = assemble(
            &config,
            &sample_input(&ticket, &user, &queue, &correspondence),
            &mut report,
        )
        .unwrap();

        let names: Vec<&str> = record.cells.keys().map(String::as_str).collect();
        assert_eq!(names[0], "id");
        assert_eq!(names[1], "all_other_correspondence");
        assert_eq!(names.len(), 16);

        assert_eq!(record.get("id"), Some(&CellValue::Raw("42".to_string())));
        assert_eq!(
            record.get("closed"),
            Some(&CellValue::Raw("02/01/2022 10:30:00".to_string()))
        );
        assert_eq!(
            record.get("customer_group"),
            Some(&CellValue::Raw("Acme".to_string()))
        );
        assert_eq!(
            record.get("all_other_correspondence"),
            Some(&CellValue::Text("jdoe: hello there".to_string()))
        );
        // Started/Told are unset on the ticket
        assert_eq!(record.get("first_correspondence"), Some(&CellValue::Absent));
        assert_eq!(
            record.get("outcome"),
            Some(&CellValue::Text("Fixed".to_string()))
        );
    }

    #[test]
    fn missing_field_emits_empty_and_reports_under_default_policy() {
        let config = Config::default();
        let mut ticket = sample_ticket();
        ticket.custom_fields.clear();
        let user = User::default();
        let queue = Queue::default();

        let mut report = ExportReport::new();
        let record = assemble(
            &config,
            &sample_input(&ticket, &user, &queue, &[]),
            &mut report,
        )
        .unwrap();

        assert_eq!(record.get("outcome"), Some(&CellValue::Absent));
        // outcome, security_incident and tickettype all missed
        assert_eq!(report.len(), 3);
        assert!(report.lines().next().unwrap().contains("Outcome"));
    }

    #[test]
    fn missing_field_skips_the_ticket_when_configured() {
        let config = Config {
            missing_fields: MissingFieldPolicy::SkipTicket,
            ..Config::default()
        };
        let mut ticket = sample_ticket();
        ticket.custom_fields.clear();
        let user = User::default();
        let queue = Queue::default();

        let mut report = ExportReport::new();
        let err = assemble(
            &config,
            &sample_input(&ticket, &user, &queue, &[]),
            &mut report,
        )
        .unwrap_err();

        assert!(matches!(err, Error::FieldNotFound { .. }));
    }

    #[test]
    fn crm_profile_translates_severity_and_assignee() {
        let mut mappings = MappingConfig::default();
        mappings
            .severity
            .insert("urgent".to_string(), "Sev 1".to_string());
        mappings
            .assignee
            .insert("root".to_string(), "Duty Manager".to_string());
        let config = Config {
            profile: ColumnProfile::crm_import(),
            mappings,
            ..Config::default()
        };

        let ticket = sample_ticket();
        let user = User::default();
        let queue = Queue::default();
        let mut report = ExportReport::new();
        let record = assemble(
            &config,
            &sample_input(&ticket, &user, &queue, &[]),
            &mut report,
        )
        .unwrap();

        assert_eq!(
            record.get("Severity"),
            Some(&CellValue::Raw("Sev 1".to_string()))
        );
        assert_eq!(
            record.get("Assignee"),
            Some(&CellValue::Raw("Duty Manager".to_string()))
        );
        assert_eq!(
            record.get("Record Type"),
            Some(&CellValue::Raw("Support".to_string()))
        );
        assert_eq!(
            record.get("Related Record"),
            Some(&CellValue::Raw("HELPDESK".to_string()))
        );
    }

    #[test]
    fn unmapped_translation_keys_fall_back_to_raw_values() {
        let config = Config {
            profile: ColumnProfile::crm_import(),
            ..Config::default()
        };

        let ticket = sample_ticket();
        let user = User::default();
        let queue = Queue::default();
        let mut report = ExportReport::new();
        let record = assemble(
            &config,
            &sample_input(&ticket, &user, &queue, &[]),
            &mut report,
        )
        .unwrap();

        assert_eq!(
            record.get("Severity"),
            Some(&CellValue::Raw("urgent".to_string()))
        );
        assert_eq!(
            record.get("Assignee"),
            Some(&CellValue::Raw("root".to_string()))
        );
    }

    #[test]
    fn rendered_cells_follow_their_kind() {
        assert_eq!(render_cell(&CellValue::Absent), "");
        assert_eq!(render_cell(&CellValue::Raw("42".to_string())), "42");
        assert_eq!(
            render_cell(&CellValue::Text("a \"b\"".to_string())),
            "\"a \\\"b\\\"\""
        );
    }
}
