//! HTTP client for the RT REST 2.0 API
//!
//! [`RtClient`] is the fetch capability injected into the pipeline: GET
//! with basic-auth credentials, JSON deserialization into the wire types,
//! and a bounded per-request timeout. It owns no retry or backoff policy;
//! failure handling is the caller's concern and follows the error taxonomy
//! in [`crate::error`].

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{
    AttachmentContent, HistoryPage, Queue, Ticket, TicketId, Transaction, TransactionId, User,
};
use serde::de::DeserializeOwned;
use url::Url;

/// Client for the RT REST 2.0 API
#[derive(Clone, Debug)]
pub struct RtClient {
    http: reqwest::Client,
    api_root: Url,
    username: String,
    password: String,
}

impl RtClient {
    /// Build a client from API configuration
    ///
    /// The REST 2.0 path is appended to the configured host, so
    /// `base_url = "http://localhost:8080"` resolves resources under
    /// `http://localhost:8080/REST/2.0/`.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_root = Url::parse(&base)?.join("REST/2.0/")?;

        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            http,
            api_root,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// The resolved API root URL
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.api_root.join(path)?)
    }

    /// GET a resource and deserialize its JSON body
    ///
    /// 401 maps to [`Error::Auth`] (fatal to the run), any other non-success
    /// status to [`Error::Http`].
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(url = %url, "fetching resource");

        let response = self
            .http
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Auth {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch a ticket snapshot
    pub async fn ticket(&self, id: TicketId) -> Result<Ticket> {
        self.get_json(self.endpoint(&format!("ticket/{id}"))?).await
    }

    /// Fetch a user record by id (username)
    pub async fn user(&self, id: &str) -> Result<User> {
        self.get_json(self.endpoint(&format!("user/{id}"))?).await
    }

    /// Fetch a queue record by id
    pub async fn queue(&self, id: &str) -> Result<Queue> {
        self.get_json(self.endpoint(&format!("queue/{id}"))?).await
    }

    /// Fetch one page of a ticket's transaction history listing
    pub async fn history_page(&self, ticket: TicketId, page: u32) -> Result<HistoryPage> {
        self.get_json(self.endpoint(&format!("ticket/{ticket}/history?page={page}"))?)
            .await
    }

    /// Fetch a full transaction record
    pub async fn transaction(&self, id: &TransactionId) -> Result<Transaction> {
        self.get_json(self.endpoint(&format!("transaction/{id}"))?)
            .await
    }

    /// Fetch an attachment body via the absolute URL from a transaction
    /// hyperlink
    pub async fn attachment(&self, url: &str) -> Result<AttachmentContent> {
        self.get_json(Url::parse(url)?).await
    }
}
