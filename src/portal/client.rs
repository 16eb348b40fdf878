//! Authenticated HTTP client for the data portal REST API.
//!
//! Every request carries `Authorization: Bearer PAT:{token}`. Responses are
//! checked for a success status before anything reads their body as JSON;
//! failures become [`PortalError`] values carrying the full response.

use std::path::Path;

use reqwest::header::AUTHORIZATION;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::PortalConfig;
use crate::portal::credential::Credential;
use crate::portal::error::{PortalError, PortalResult, ResponseDiagnostics};
use crate::portal::model::{MacroRecord, PartRecord, PartSummary};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Client for one data portal instance.
///
/// The credential may be swapped between download attempts with
/// [`PortalClient::set_credential`].
#[derive(Debug)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl PortalClient {
    /// Creates a client from validated portal settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &PortalConfig, credential: Credential) -> PortalResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|source| PortalError::ClientBuild { source })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// API root without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replaces the credential used for subsequent requests.
    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = credential;
        info!("Personal access token replaced");
    }

    /// Builds an endpoint URL from path segments, percent-encoding each one.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    /// Looks up a part by its portal ID.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Unauthorized`] on 401, [`PortalError::NotFound`]
    /// on 404, and other variants for any other failure.
    pub async fn resolve_part(&self, part_id: &str) -> PortalResult<PartRecord> {
        let url = self.endpoint(&["parts", part_id]);
        let body = self.get_body(&url).await?;
        PartRecord::from_json(part_id, &body)
            .map_err(|e| PortalError::invalid_response(&url, e.to_string()))
    }

    /// Looks up a graphic macro by its portal ID.
    ///
    /// # Errors
    ///
    /// Same contract as [`PortalClient::resolve_part`].
    pub async fn resolve_macro(&self, macro_id: &str) -> PortalResult<MacroRecord> {
        let url = self.endpoint(&["macros", macro_id]);
        let body = self.get_body(&url).await?;
        MacroRecord::from_json(macro_id, &body)
            .map_err(|e| PortalError::invalid_response(&url, e.to_string()))
    }

    /// Searches for a part by manufacturer part number (exact match).
    ///
    /// Returns the first hit, or `None` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the part number is invalid or the request fails.
    pub async fn search_part(&self, part_number: &str) -> PortalResult<Option<PartSummary>> {
        validate_part_number(part_number)?;

        let url = self.query_url(
            "parts",
            &[("search", part_number.trim()), ("fuzziness", "0")],
        )?;
        let body = self.get_body(&url).await?;
        PartSummary::first_from_json(&body)
            .map_err(|e| PortalError::invalid_response(&url, e.to_string()))
    }

    /// Checks the current credential with a minimal request.
    ///
    /// Returns `false` when the portal answers 401.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than 401.
    pub async fn check_credential(&self) -> PortalResult<bool> {
        let url = self.query_url("parts", &[("limit", "1")])?;
        match self.get(&url).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_unauthorized() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Downloads `url` and writes the body verbatim to `path`.
    ///
    /// An existing file is overwritten. If writing fails, whatever was
    /// written is removed. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// HTTP failures are logged with status, headers and body, then returned.
    pub async fn download_artifact(&self, url: &str, path: &Path) -> PortalResult<u64> {
        let response = match self.get(url).await {
            Ok(response) => response,
            Err(e) => {
                match e.diagnostics() {
                    Some(diagnostics) => {
                        warn!(path = %path.display(), "Download failed\n{diagnostics}");
                    }
                    None => warn!(path = %path.display(), error = %e, "Download failed"),
                }
                return Err(e);
            }
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortalError::network(url, e))?;

        if let Err(e) = tokio::fs::write(path, &bytes).await {
            if tokio::fs::remove_file(path).await.is_ok() {
                debug!(path = %path.display(), "Removed partially written file");
            }
            return Err(PortalError::file_write(path, e));
        }

        info!(path = %path.display(), bytes = bytes.len(), "Saved artifact");
        Ok(bytes.len() as u64)
    }

    fn query_url(&self, path: &str, params: &[(&str, &str)]) -> PortalResult<String> {
        let base = format!("{}/{path}", self.base_url);
        Url::parse_with_params(&base, params)
            .map(String::from)
            .map_err(|e| PortalError::invalid_input(format!("cannot build URL '{base}': {e}")))
    }

    /// Sends an authenticated GET and fails on any non-success status.
    async fn get(&self, url: &str) -> PortalResult<reqwest::Response> {
        debug!(url, "GET");

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, self.credential.authorization_header())
            .send()
            .await
            .map_err(|e| PortalError::network(url, e))?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "Response received");

        if status.is_success() {
            Ok(response)
        } else {
            let diagnostics = ResponseDiagnostics::capture(url, response).await;
            Err(PortalError::from_status(diagnostics))
        }
    }

    async fn get_body(&self, url: &str) -> PortalResult<Vec<u8>> {
        let response = self.get(url).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| PortalError::network(url, e))
    }
}

/// Validates a manufacturer part number before it is sent to the search API.
///
/// # Errors
///
/// Returns [`PortalError::InvalidInput`] if the part number is blank, longer
/// than 100 characters, or contains characters outside `[A-Za-z0-9_.-]`.
pub fn validate_part_number(part_number: &str) -> PortalResult<()> {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let part_number = part_number.trim();
    if part_number.is_empty() {
        return Err(PortalError::invalid_input("part number is required"));
    }
    if part_number.chars().count() > 100 {
        return Err(PortalError::invalid_input(
            "part number is too long (max 100 characters)",
        ));
    }

    let pattern = PATTERN
        .get_or_init(|| regex::Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid part number pattern"));
    if !pattern.is_match(part_number) {
        return Err(PortalError::invalid_input(
            "part number contains invalid characters",
        ));
    }

    Ok(())
}
