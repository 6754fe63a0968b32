//! MediaWiki API client
//!
//! Implements the category membership listing (`list=categorymembers`) and the
//! rendered page fetch (`action=parse`) against a MediaWiki `api.php` endpoint.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, debug_span, instrument, warn, Instrument};
use url::Url;

use super::{Listing, MemberKind, MembershipSource, SourceConfig, SourceError};
use crate::content::{ContentError, ContentSource};

/// One page of a `categorymembers` listing
#[derive(Debug, Deserialize)]
struct MembersResponse {
    query: Option<MembersQuery>,

    #[serde(rename = "continue")]
    continuation: Option<Continuation>,
}

#[derive(Debug, Deserialize)]
struct MembersQuery {
    categorymembers: Vec<Member>,
}

#[derive(Debug, Deserialize)]
struct Member {
    title: String,
}

#[derive(Debug, Deserialize)]
struct Continuation {
    cmcontinue: String,
}

/// Rendered page returned by `action=parse`
#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: ParsedPage,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    text: ParsedText,
}

#[derive(Debug, Deserialize)]
struct ParsedText {
    #[serde(rename = "*")]
    html: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

/// HTTP client for a MediaWiki API endpoint
#[derive(Clone)]
pub struct MediaWikiClient {
    /// The underlying reqwest client
    client: ReqwestClient,

    /// Parsed API endpoint
    endpoint: Url,

    /// Client settings
    config: SourceConfig,

    /// Optional client-side request budget
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl MediaWikiClient {
    /// Create a client from the given configuration
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let endpoint = Url::parse(&config.endpoint)?;

        let mut builder = ReqwestClient::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SourceError::Setup(e.to_string()))?;

        let limiter = config
            .requests_per_minute
            .and_then(NonZeroU32::new)
            .map(|rpm| Arc::new(RateLimiter::direct(Quota::per_minute(rpm))));

        Ok(Self {
            client,
            endpoint,
            config,
            limiter,
        })
    }

    /// Client settings
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Send a GET request with the given query parameters and decode the JSON
    /// body, turning API error envelopes into [`SourceError::Api`]
    async fn get_json<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, SourceError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().instrument(debug_span!("limiter")).await;
        }

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| SourceError::UnexpectedResponse(format!("invalid JSON: {}", e)))?;

        if let Some(error) = value.get("error") {
            let body: ApiErrorBody = serde_json::from_value(error.clone()).map_err(|e| {
                SourceError::UnexpectedResponse(format!("invalid error envelope: {}", e))
            })?;
            return Err(SourceError::Api {
                code: body.code,
                info: body.info,
            });
        }

        serde_json::from_value(value).map_err(|e| SourceError::UnexpectedResponse(e.to_string()))
    }

    /// Convert a member title into a label: subcategories lose their
    /// namespace prefix, page titles are kept verbatim
    fn member_label(&self, title: String, kind: MemberKind) -> String {
        match kind {
            MemberKind::Subcategory => title
                .strip_prefix(self.config.category_prefix.as_str())
                .map(str::to_string)
                .unwrap_or(title),
            MemberKind::Page => title,
        }
    }

    /// Enumerate the members of `category`, following continuation tokens
    /// until the API stops returning one
    #[instrument(skip(self))]
    pub async fn list_members(&self, category: &str, kind: MemberKind) -> Listing {
        let title = format!("{}{}", self.config.category_prefix, category);
        let limit = self.config.effective_page_size().to_string();

        let mut members = Vec::new();
        let mut batches = 0;
        let mut continuation: Option<String> = None;

        loop {
            let mut params = vec![
                ("action", "query"),
                ("format", "json"),
                ("list", "categorymembers"),
                ("cmtitle", title.as_str()),
                ("cmtype", kind.as_param()),
                ("cmlimit", limit.as_str()),
            ];
            if let Some(token) = &continuation {
                params.push(("cmcontinue", token.as_str()));
            }

            match self.get_json::<MembersResponse>(&params).await {
                Ok(response) => {
                    batches += 1;
                    if let Some(query) = response.query {
                        members.extend(
                            query
                                .categorymembers
                                .into_iter()
                                .map(|member| self.member_label(member.title, kind)),
                        );
                    }
                    match response.continuation {
                        Some(next) => continuation = Some(next.cmcontinue),
                        None => break,
                    }
                }
                Err(e) => {
                    warn!(
                        "Listing {} members of '{}' stopped after {} batches: {}",
                        kind, category, batches, e
                    );
                    return Listing::interrupted(members, batches, e);
                }
            }
        }

        debug!("Listed {} {} members of '{}'", members.len(), kind, category);
        Listing::complete(members)
    }

    /// Fetch the rendered HTML of a page
    #[instrument(skip(self))]
    pub async fn parse_page(&self, title: &str) -> Result<String, SourceError> {
        let response: ParseResponse = self
            .get_json(&[
                ("action", "parse"),
                ("page", title),
                ("format", "json"),
                ("prop", "text"),
            ])
            .await?;
        Ok(response.parse.text.html)
    }
}

impl MembershipSource for MediaWikiClient {
    async fn members(&self, category: &str, kind: MemberKind) -> Listing {
        self.list_members(category, kind).await
    }
}

impl ContentSource for MediaWikiClient {
    async fn fetch_html(&self, title: &str) -> Result<String, ContentError> {
        Ok(self.parse_page(title).await?)
    }
}
