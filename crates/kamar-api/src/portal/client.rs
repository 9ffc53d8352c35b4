//! `PortalClient` - KAMAR parent portal API client implementation.

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ORIGIN};
use tokio::sync::OnceCell;
use tracing::instrument;
use url::Url;

use super::api::LocalPortalApi;
use super::error::{PortalError, Resource};
use super::xml::LogonResponse;

/// Default production endpoint of the parent portal API.
const DEFAULT_BASE_URL: &str = "https://parentportal.ormiston.school.nz/api/api.php";

/// Fixed logon key the portal expects before authentication.
const LOGON_KEY: &str = "vtku";

/// `Origin` header the portal expects from its mobile clients.
const ORIGIN_VALUE: &str = "file://";

/// `X-Requested-With` header the portal expects from its mobile clients.
const REQUESTED_WITH_VALUE: &str = "nz.co.KAMAR";

/// Parent portal API client.
///
/// Construct one per process and pass it by reference. The session key from
/// `Logon` is cached in the client, so repeated fetches share one login.
#[derive(Debug)]
pub struct PortalClient {
    /// HTTP client (reqwest, gzip enabled).
    http_client: Client,
    /// Base URL.
    base_url: Url,
    /// Portal username (student ID).
    username: String,
    /// Portal password.
    password: String,
    /// Timetable/calendar year for the `Grid` and `Year` request fields.
    year: i32,
    /// Session key, populated by the first `Logon`.
    session_key: OnceCell<String>,
}

/// Builder for `PortalClient`.
#[derive(Debug)]
pub struct PortalClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
    username: Option<String>,
    password: Option<String>,
    session_key: Option<String>,
    year: Option<i32>,
}

impl PortalClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
            username: None,
            password: None,
            session_key: None,
            year: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the portal username (required).
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the portal password (required).
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Presets a session key, skipping the `Logon` round-trip.
    #[must_use]
    pub fn session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = Some(key.into());
        self
    }

    /// Overrides the timetable year (default: current local year).
    #[must_use]
    pub const fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `user_agent`, `username`, or `password` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<PortalClient> {
        let user_agent = self.user_agent.context("user_agent is required")?;
        let username = self.username.context("username is required")?;
        let password = self.password.context("password is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let year = self.year.unwrap_or_else(|| Local::now().year());

        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static(ORIGIN_VALUE));
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static(REQUESTED_WITH_VALUE),
        );

        let http_client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(PortalClient {
            http_client,
            base_url,
            username,
            password,
            year,
            session_key: OnceCell::new_with(self.session_key),
        })
    }
}

impl PortalClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> PortalClientBuilder {
        PortalClientBuilder::new()
    }

    /// Builds an XML decode error with a preview of the response body.
    fn xml_decode_error(command: &str, xml: &str) -> String {
        let preview_len = xml.len().min(500);
        format!(
            "{} XML decoding failed (len={}): {}",
            command,
            xml.len(),
            xml.get(..preview_len).unwrap_or(xml)
        )
    }

    /// Logs in and returns the session key issued by the portal.
    #[instrument(skip_all)]
    async fn logon(&self) -> Result<String> {
        let response = self
            .http_client
            .post(self.base_url.clone())
            .form(&[
                ("Command", "Logon"),
                ("Key", LOGON_KEY),
                ("Username", self.username.as_str()),
                ("Password", self.password.as_str()),
            ])
            .send()
            .await
            .context("Logon request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read Logon response")?;

        if !status.is_success() {
            return Err(PortalError::Authentication(format!("HTTP {status}")).into());
        }

        let raw_result: std::result::Result<LogonResponse, _> = quick_xml::de::from_str(&body);
        let parsed = raw_result.with_context(|| Self::xml_decode_error("Logon", &body))?;

        match parsed.key {
            Some(key) => {
                tracing::debug!("Logon succeeded");
                Ok(key)
            }
            None => Err(PortalError::Authentication(
                parsed
                    .error
                    .unwrap_or_else(|| String::from("no session key in response")),
            )
            .into()),
        }
    }

    /// Returns the session key, performing `Logon` on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the login round-trip fails.
    pub async fn session_key(&self) -> Result<&str> {
        self.session_key
            .get_or_try_init(|| self.logon())
            .await
            .map(String::as_str)
    }

    /// Form fields for fetching `resource`, with the session key attached.
    fn command_form(&self, resource: Resource, key: &str) -> Vec<(&'static str, String)> {
        match resource {
            Resource::Timetable => vec![
                ("Command", String::from("GetStudentTimetable")),
                ("Key", String::from(key)),
                ("StudentID", self.username.clone()),
                ("Grid", format!("{}TT", self.year)),
            ],
            Resource::Periods => vec![
                ("Command", String::from("GetGlobals")),
                ("Key", String::from(key)),
            ],
            Resource::Calendar => vec![
                ("Command", String::from("GetCalendar")),
                ("Key", String::from(key)),
                ("Year", self.year.to_string()),
            ],
        }
    }

    /// Fetches a raw XML resource.
    ///
    /// The body is returned verbatim on HTTP success so callers can cache
    /// the exact response; a non-success status is a hard failure.
    async fn fetch_resource(&self, resource: Resource) -> Result<String> {
        let key = self.session_key().await?.to_owned();
        let form = self.command_form(resource, &key);

        let response = self
            .http_client
            .post(self.base_url.clone())
            .form(&form)
            .send()
            .await
            .with_context(|| format!("{resource} request failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::Fetch(resource, status.as_u16()).into());
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read {resource} response"))?;
        tracing::debug!(%resource, body_len = body.len(), "response received");
        Ok(body)
    }
}

impl LocalPortalApi for PortalClient {
    #[instrument(skip_all)]
    async fn fetch_timetable(&self) -> Result<String> {
        self.fetch_resource(Resource::Timetable).await
    }

    #[instrument(skip_all)]
    async fn fetch_periods(&self) -> Result<String> {
        self.fetch_resource(Resource::Periods).await
    }

    #[instrument(skip_all)]
    async fn fetch_calendar(&self) -> Result<String> {
        self.fetch_resource(Resource::Calendar).await
    }
}
