use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const DRAFT_ID_PREFIX: &str = "temp-";
pub const SAVED_ID_PREFIX: &str = "req-";

pub fn new_id(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub const fn all() -> &'static [Self] {
        &[
            Self::Get,
            Self::Post,
            Self::Put,
            Self::Delete,
            Self::Patch,
            Self::Options,
            Self::Head,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }

    /// GET and HEAD never carry a body.
    pub const fn allows_body(self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedMethod(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
    pub enabled: bool,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Disabled rows and rows without a key are skipped when sending.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.key.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyType {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "form-data")]
    FormData,
    #[serde(rename = "x-www-form-urlencoded")]
    UrlEncoded,
    #[serde(rename = "raw")]
    Raw,
    #[default]
    #[serde(rename = "none")]
    None,
}

impl BodyType {
    pub const fn content_type(self) -> Option<&'static str> {
        match self {
            Self::Json => Some("application/json"),
            Self::UrlEncoded => Some("application/x-www-form-urlencoded"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub id: String,
    pub name: String,
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Vec<KeyValue>,
    #[serde(default)]
    pub params: Vec<KeyValue>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub body_type: BodyType,
}

impl Default for RequestData {
    fn default() -> Self {
        Self::draft()
    }
}

/// What actually goes over the wire once the composer's rows are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestData {
    pub fn draft() -> Self {
        Self {
            id: new_id(DRAFT_ID_PREFIX),
            name: "New Request".to_string(),
            url: String::new(),
            method: HttpMethod::Get,
            headers: Vec::new(),
            params: Vec::new(),
            body: String::new(),
            body_type: BodyType::None,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.id.starts_with(DRAFT_ID_PREFIX)
    }

    pub fn active_headers(&self) -> impl Iterator<Item = &KeyValue> {
        self.headers.iter().filter(|h| h.is_active())
    }

    pub fn active_params(&self) -> impl Iterator<Item = &KeyValue> {
        self.params.iter().filter(|p| p.is_active())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.active_headers().any(|h| h.key.eq_ignore_ascii_case(name))
    }

    /// The URL with every active param appended to its query string.
    pub fn resolved_url(&self) -> Result<Url> {
        let mut url = Url::parse(self.url.trim())
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.url)))?;
        let mut params = self.active_params().peekable();
        if params.peek().is_some() {
            let mut query = url.query_pairs_mut();
            for p in params {
                query.append_pair(&p.key, &p.value);
            }
        }
        Ok(url)
    }

    pub fn sends_body(&self) -> bool {
        self.method.allows_body() && self.body_type != BodyType::None
    }

    /// Active headers plus the content type implied by a JSON body.
    pub fn effective_headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .active_headers()
            .map(|h| (h.key.clone(), h.value.clone()))
            .collect();
        if self.sends_body() && self.body_type == BodyType::Json {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case("content-type"));
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        headers
    }

    pub fn prepare(&self) -> Result<PreparedRequest> {
        Ok(PreparedRequest {
            method: self.method,
            url: self.resolved_url()?,
            headers: self.effective_headers(),
            body: self.sends_body().then(|| self.body.clone()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    pub status: u16,
    pub status_text: String,
    pub time: u64,
    pub size: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub content_type: String,
}

impl ResponseData {
    /// The response shown when the send itself failed.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            status_text: "Error".to_string(),
            time: 0,
            size: format_size(0),
            headers: BTreeMap::new(),
            body: message.into(),
            content_type: "text/plain".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("json")
    }
}

pub fn format_size(bytes: usize) -> String {
    format!("{bytes} B")
}
