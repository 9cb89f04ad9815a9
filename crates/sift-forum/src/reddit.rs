//! Reddit API client
//!
//! Application-only OAuth (client credentials), subreddit search with `after`
//! cursors, comment trees, and `morechildren` expansion of collapsed
//! placeholders. All calls are blocking.

use crate::ForumError;
use serde::Deserialize;
use serde_json::Value;
use sift_domain::{Comment, CommentNode, ForumSource, RawThread, SearchRequest, Thread};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// `morechildren` accepts at most this many ids per request
const MORE_CHILDREN_BATCH: usize = 100;

/// Default HTTP timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application credentials for the Reddit API
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// User agent identifying the application
    pub user_agent: String,
}

impl RedditCredentials {
    /// Read `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET` and `REDDIT_USER_AGENT`
    pub fn from_env() -> Result<Self, ForumError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ForumError::MissingCredentials(name.to_string()))
        };
        Ok(Self {
            client_id: var("REDDIT_CLIENT_ID")?,
            client_secret: var("REDDIT_CLIENT_SECRET")?,
            user_agent: var("REDDIT_USER_AGENT")?,
        })
    }
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Blocking Reddit API client
pub struct RedditClient {
    credentials: RedditCredentials,
    client: reqwest::blocking::Client,
    token: Mutex<Option<AccessToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expiry")]
    expires_in: u64,
}

fn default_expiry() -> u64 {
    3600
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<RawThing>,
}

#[derive(Deserialize)]
struct RawThing {
    kind: String,
    data: Value,
}

#[derive(Deserialize)]
struct LinkData {
    id: String,
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
}

#[derive(Deserialize)]
struct CommentData {
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    score: i64,
    // Either "" or a nested listing
    #[serde(default)]
    replies: Value,
}

#[derive(Deserialize)]
struct MoreData {
    id: String,
    #[serde(default)]
    children: Vec<String>,
}

#[derive(Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<Value>,
    data: Option<MoreChildrenData>,
}

#[derive(Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<RawThing>,
}

impl RedditClient {
    /// Create a client with the given credentials
    pub fn new(credentials: RedditCredentials) -> Result<Self, ForumError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(credentials.user_agent.clone())
            .build()
            .map_err(|e| ForumError::Communication(e.to_string()))?;

        Ok(Self {
            credentials,
            client,
            token: Mutex::new(None),
        })
    }

    /// Create a client from environment credentials
    pub fn from_env() -> Result<Self, ForumError> {
        Self::new(RedditCredentials::from_env()?)
    }

    /// Current bearer token, fetching a new one when missing or expired
    fn access_token(&self) -> Result<String, ForumError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|e| ForumError::Authentication(format!("Token lock poisoned: {}", e)))?;

        if let Some(token) = guard.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("Requesting Reddit access token");
        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .map_err(|e| ForumError::Communication(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ForumError::Authentication(format!("HTTP {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| ForumError::InvalidResponse(format!("Token response: {}", e)))?;

        // Refresh a minute early
        let lifetime = Duration::from_secs(token.expires_in.saturating_sub(60));
        let value = token.access_token.clone();
        *guard = Some(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    fn forget_token(&self) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
    }

    /// GET an API path and decode the JSON body
    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ForumError> {
        let token = self.access_token()?;
        let url = format!("{}{}", API_BASE, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .map_err(|e| ForumError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .map_err(|e| ForumError::InvalidResponse(format!("{}: {}", path, e)));
        }

        match status {
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get("x-ratelimit-reset")
                    .or_else(|| response.headers().get(reqwest::header::RETRY_AFTER))
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .map(|secs| secs.ceil() as u64);
                Err(ForumError::RateLimited { retry_after_secs })
            }
            reqwest::StatusCode::UNAUTHORIZED => {
                self.forget_token();
                Err(ForumError::Authentication(format!("HTTP {} on {}", status, path)))
            }
            reqwest::StatusCode::NOT_FOUND => Err(ForumError::NotFound(path.to_string())),
            _ => {
                let body: String = response.text().unwrap_or_default().chars().take(500).collect();
                Err(ForumError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

impl ForumSource for RedditClient {
    type Error = ForumError;

    fn search(&self, request: &SearchRequest) -> Result<Vec<RawThread>, Self::Error> {
        let mut query = vec![
            ("q", request.query.clone()),
            ("sort", request.sort.clone()),
            ("t", request.time_window.clone()),
            ("limit", request.limit.to_string()),
            ("restrict_sr", "1".to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(after) = &request.after {
            query.push(("after", after.clone()));
        }

        tracing::debug!(
            "Searching r/{} for {:?} (after {:?})",
            request.forum,
            request.query,
            request.after
        );
        let body = self.get_json(&format!("/r/{}/search", request.forum), &query)?;
        parse_search_listing(body)
    }

    fn comment_forest(&self, thread_id: &str) -> Result<Vec<CommentNode>, Self::Error> {
        let query = [("raw_json", "1".to_string()), ("limit", "500".to_string())];
        let body = self.get_json(&format!("/comments/{}", thread_id), &query)?;
        parse_comment_page(body, thread_id)
    }

    fn expand_more(
        &self,
        thread_id: &str,
        children: &[String],
    ) -> Result<Vec<CommentNode>, Self::Error> {
        let mut nodes = Vec::new();
        for batch in children.chunks(MORE_CHILDREN_BATCH) {
            let query = [
                ("api_type", "json".to_string()),
                ("link_id", format!("t3_{}", thread_id)),
                ("children", batch.join(",")),
                ("raw_json", "1".to_string()),
            ];
            let body = self.get_json("/api/morechildren", &query)?;
            nodes.extend(parse_more_children(body, thread_id)?);
        }
        Ok(nodes)
    }
}

/// Decode a search listing into raw threads, keeping source order
pub(crate) fn parse_search_listing(body: Value) -> Result<Vec<RawThread>, ForumError> {
    let listing: Listing = serde_json::from_value(body)
        .map_err(|e| ForumError::InvalidResponse(format!("Search listing: {}", e)))?;

    listing
        .data
        .children
        .into_iter()
        .filter(|thing| thing.kind == "t3")
        .map(|thing| {
            let link: LinkData = serde_json::from_value(thing.data)
                .map_err(|e| ForumError::InvalidResponse(format!("Link: {}", e)))?;
            let thread = Thread {
                id: link.id,
                title: link.title,
                body: link.selftext,
                url: link.url,
                created_at: link.created_utc,
                score: link.score,
                comment_count: link.num_comments,
            };
            Ok(RawThread::new(thread, link.name))
        })
        .collect()
}

/// Decode the `[thread listing, comment listing]` pair returned for a thread
pub(crate) fn parse_comment_page(
    body: Value,
    thread_id: &str,
) -> Result<Vec<CommentNode>, ForumError> {
    let mut pages = match body {
        Value::Array(pages) => pages,
        _ => return Err(ForumError::InvalidResponse("Expected [thread, comments] array".into())),
    };
    if pages.len() < 2 {
        return Err(ForumError::InvalidResponse("Missing comment listing".into()));
    }
    parse_comment_listing(pages.swap_remove(1), thread_id)
}

fn parse_comment_listing(value: Value, thread_id: &str) -> Result<Vec<CommentNode>, ForumError> {
    let listing: Listing = serde_json::from_value(value)
        .map_err(|e| ForumError::InvalidResponse(format!("Comment listing: {}", e)))?;
    parse_things(listing.data.children, thread_id)
}

fn parse_things(things: Vec<RawThing>, thread_id: &str) -> Result<Vec<CommentNode>, ForumError> {
    let mut nodes = Vec::with_capacity(things.len());
    for thing in things {
        match thing.kind.as_str() {
            "t1" => {
                let data: CommentData = serde_json::from_value(thing.data)
                    .map_err(|e| ForumError::InvalidResponse(format!("Comment: {}", e)))?;
                let replies = match data.replies {
                    Value::Object(_) => parse_comment_listing(data.replies, thread_id)?,
                    _ => Vec::new(),
                };
                nodes.push(CommentNode::Comment {
                    comment: Comment {
                        id: data.id,
                        thread_id: thread_id.to_string(),
                        body: data.body,
                        created_at: data.created_utc,
                        score: data.score,
                    },
                    replies,
                });
            }
            "more" => {
                let data: MoreData = serde_json::from_value(thing.data)
                    .map_err(|e| ForumError::InvalidResponse(format!("More: {}", e)))?;
                nodes.push(CommentNode::More {
                    id: data.id,
                    children: data.children,
                });
            }
            other => tracing::debug!("Skipping unexpected thing kind {}", other),
        }
    }
    Ok(nodes)
}

/// Decode a `morechildren` response into a flat list of nodes
pub(crate) fn parse_more_children(
    body: Value,
    thread_id: &str,
) -> Result<Vec<CommentNode>, ForumError> {
    let response: MoreChildrenResponse = serde_json::from_value(body)
        .map_err(|e| ForumError::InvalidResponse(format!("morechildren: {}", e)))?;

    if !response.json.errors.is_empty() {
        return Err(ForumError::InvalidResponse(format!(
            "morechildren errors: {:?}",
            response.json.errors
        )));
    }

    let things = response.json.data.map(|d| d.things).unwrap_or_default();
    parse_things(things, thread_id)
}
