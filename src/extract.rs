//! Attachment text extraction
//!
//! Turns a ticket's aggregated transactions into ordered text fragments for
//! one transaction type. Only hyperlinks with `ref == "attachment"` are
//! followed, and only bodies whose MIME headers indicate a text or HTML
//! content type are kept; everything else is silently skipped. Bodies are
//! base64 with embedded line breaks, which must be removed from the encoded
//! form before decoding. A fetch or decode failure excludes that one
//! fragment and is recorded in the report; siblings are unaffected.

use crate::client::RtClient;
use crate::error::Result;
use crate::report::ExportReport;
use crate::types::{ExtractedFragment, TicketId, Transaction, TransactionType};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Whether a raw MIME header block indicates text or HTML content
///
/// Case-insensitive substring match on the `Content-Type:` header line.
pub fn is_text_content(headers: &str) -> bool {
    let lower = headers.to_lowercase();
    lower.contains("content-type: text/html") || lower.contains("content-type: text/plain")
}

/// Decode a base64 attachment body into text
///
/// The source payload embeds line breaks in the encoded form; they are
/// removed before decoding, not after. Decoded bytes are interpreted as
/// UTF-8, lossily, since attachment charsets are not reliable.
pub fn decode_attachment_body(encoded: &str) -> Result<String> {
    let stripped: String = encoded.chars().filter(|c| *c != '\n').collect();
    let bytes = BASE64.decode(stripped.as_bytes())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extract text fragments from all transactions of one type, in order
///
/// Transaction order (as aggregated) and attachment order within a
/// transaction are preserved. Only fatal errors propagate.
pub async fn extract_fragments(
    client: &RtClient,
    ticket: TicketId,
    transactions: &[Transaction],
    kind: TransactionType,
    report: &mut ExportReport,
) -> Result<Vec<ExtractedFragment>> {
    let mut fragments = Vec::new();

    for tx in transactions.iter().filter(|t| t.kind == kind) {
        for link in &tx.hyperlinks {
            if link.relation.as_deref() != Some("attachment") {
                continue;
            }
            let Some(url) = link.url.as_deref() else {
                continue;
            };

            match fetch_fragment(client, url).await {
                Ok(Some(fragment)) => fragments.push(fragment),
                Ok(None) => {
                    tracing::debug!(url, "skipping non-text attachment");
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    report.attachment_issue(ticket, tx.id.clone(), url, e.to_string());
                }
            }
        }
    }

    Ok(fragments)
}

/// Fetch one attachment and decode it, if its content type qualifies
async fn fetch_fragment(client: &RtClient, url: &str) -> Result<Option<ExtractedFragment>> {
    let attachment = client.attachment(url).await?;

    if !is_text_content(&attachment.headers) {
        return Ok(None);
    }

    let content = decode_attachment_body(&attachment.content)?;
    Ok(Some(ExtractedFragment {
        created: attachment.created,
        creator: attachment.creator.id,
        content,
    }))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::types::{Hyperlink, TransactionId};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn content_type_match_is_case_insensitive() {
        assert!(is_text_content("Content-Type: text/html; charset=\"utf-8\""));
        assert!(is_text_content("CONTENT-TYPE: TEXT/PLAIN"));
        assert!(!is_text_content("Content-Type: image/png"));
        assert!(!is_text_content("Content-Disposition: attachment"));
    }

    #[test]
    fn decodes_base64_with_embedded_line_breaks() {
        // "Hello, world!" split across encoded lines
        let encoded = "SGVsbG8s\nIHdvcmxk\nIQ==";
        assert_eq!(decode_attachment_body(encoded).unwrap(), "Hello, world!");
    }

    #[test]
    fn invalid_base64_is_an_error() {
        assert!(decode_attachment_body("not base64 at all!!!").is_err());
    }

    fn tx(id: &str, kind: TransactionType, urls: &[String]) -> Transaction {
        Transaction {
            id: TransactionId::from(id),
            kind,
            hyperlinks: urls
                .iter()
                .map(|u| Hyperlink {
                    relation: Some("attachment".to_string()),
                    url: Some(u.clone()),
                })
                .collect(),
        }
    }

    async fn client_for(server: &MockServer) -> RtClient {
        RtClient::new(&ApiConfig {
            base_url: server.uri(),
            username: "u".to_string(),
            password: "p".to_string(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    async fn mount_attachment(server: &MockServer, route: &str, content_type: &str, body: &str) {
        let encoded = BASE64.encode(body.as_bytes());
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Headers": format!("Content-Type: {content_type}\nContent-Length: {}", body.len()),
                "Content": encoded,
                "Creator": {"id": "jdoe"},
                "Created": "2022-03-01T09:00:00Z"
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn keeps_text_attachments_and_skips_binary_ones() {
        let server = MockServer::start().await;
        mount_attachment(&server, "/REST/2.0/attachment/1", "text/plain", "first").await;
        mount_attachment(&server, "/REST/2.0/attachment/2", "image/png", "PNG!").await;
        mount_attachment(&server, "/REST/2.0/attachment/3", "text/html", "<p>second</p>").await;

        let base = server.uri();
        let transactions = vec![tx(
            "100",
            TransactionType::Correspond,
            &[
                format!("{base}/REST/2.0/attachment/1"),
                format!("{base}/REST/2.0/attachment/2"),
                format!("{base}/REST/2.0/attachment/3"),
            ],
        )];

        let client = client_for(&server).await;
        let mut report = ExportReport::new();
        let fragments = extract_fragments(
            &client,
            TicketId(1),
            &transactions,
            TransactionType::Correspond,
            &mut report,
        )
        .await
        .unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].content, "first");
        assert_eq!(fragments[0].creator, "jdoe");
        assert_eq!(fragments[1].content, "<p>second</p>");
        // Non-text attachments are skipped silently, not reported
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn only_the_requested_transaction_type_contributes() {
        let server = MockServer::start().await;
        mount_attachment(&server, "/REST/2.0/attachment/10", "text/plain", "comment text").await;
        mount_attachment(&server, "/REST/2.0/attachment/11", "text/plain", "reply text").await;

        let base = server.uri();
        let transactions = vec![
            tx(
                "200",
                TransactionType::Comment,
                &[format!("{base}/REST/2.0/attachment/10")],
            ),
            tx(
                "201",
                TransactionType::Correspond,
                &[format!("{base}/REST/2.0/attachment/11")],
            ),
        ];

        let client = client_for(&server).await;
        let mut report = ExportReport::new();
        let fragments = extract_fragments(
            &client,
            TicketId(2),
            &transactions,
            TransactionType::Comment,
            &mut report,
        )
        .await
        .unwrap();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].content, "comment text");
    }

    #[tokio::test]
    async fn failing_attachment_is_reported_and_siblings_kept() {
        let server = MockServer::start().await;
        mount_attachment(&server, "/REST/2.0/attachment/20", "text/plain", "kept").await;
        Mock::given(method("GET"))
            .and(path("/REST/2.0/attachment/21"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let base = server.uri();
        let failing_url = format!("{base}/REST/2.0/attachment/21");
        let transactions = vec![tx(
            "300",
            TransactionType::Create,
            &[format!("{base}/REST/2.0/attachment/20"), failing_url.clone()],
        )];

        let client = client_for(&server).await;
        let mut report = ExportReport::new();
        let fragments = extract_fragments(
            &client,
            TicketId(3),
            &transactions,
            TransactionType::Create,
            &mut report,
        )
        .await
        .unwrap();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].content, "kept");
        assert_eq!(report.len(), 1);
        let issue = &report.issues()[0];
        assert_eq!(issue.transaction, Some(TransactionId::from("300")));
        assert_eq!(issue.attachment.as_deref(), Some(failing_url.as_str()));
    }

    #[tokio::test]
    async fn non_attachment_hyperlinks_are_ignored() {
        let server = MockServer::start().await;

        let transactions = vec![Transaction {
            id: TransactionId::from("400"),
            kind: TransactionType::Create,
            hyperlinks: vec![Hyperlink {
                relation: Some("self".to_string()),
                url: Some(format!("{}/REST/2.0/transaction/400", server.uri())),
            }],
        }];

        let client = client_for(&server).await;
        let mut report = ExportReport::new();
        let fragments = extract_fragments(
            &client,
            TicketId(4),
            &transactions,
            TransactionType::Create,
            &mut report,
        )
        .await
        .unwrap();

        assert!(fragments.is_empty());
        assert!(report.is_empty());
    }
}
