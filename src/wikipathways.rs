use std::thread;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::domain::{GeneSymbol, PathwayCandidate};
use crate::error::DiscoError;

pub const DEFAULT_BASE_URL: &str = "https://webservice.wikipathways.org";
pub const RESULT_NAMESPACE: &str = "http://www.wso2.org/php/xsd";
pub const WEBSERVICE_NAMESPACE: &str = "http://www.wikipathways.org/webservice";

pub trait PathwayClient: Send + Sync {
    fn find_pathways_by_text(
        &self,
        gene: &GeneSymbol,
        organism: &str,
    ) -> Result<String, DiscoError>;

    fn get_pathway(&self, pathway_id: &str) -> Result<String, DiscoError>;
}

#[derive(Clone)]
pub struct WikiPathwaysHttpClient {
    client: Client,
    base_url: String,
}

impl WikiPathwaysHttpClient {
    pub fn new() -> Result<Self, DiscoError> {
        let base_url = std::env::var("WIKIPATHWAYS_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DiscoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("discopath/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DiscoError::WikiPathwaysHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| DiscoError::WikiPathwaysHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, DiscoError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "WikiPathways request failed".to_string());
        Err(DiscoError::WikiPathwaysStatus { status, message })
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, DiscoError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        debug!(status, attempt, "wikipathways.retry");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        debug!(error = %err, attempt, "wikipathways.retry");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(DiscoError::WikiPathwaysHttp(err.to_string()));
                }
            }
        }
    }
}

impl PathwayClient for WikiPathwaysHttpClient {
    fn find_pathways_by_text(
        &self,
        gene: &GeneSymbol,
        organism: &str,
    ) -> Result<String, DiscoError> {
        let url = format!("{}/findPathwaysByText", self.base_url);
        let response = self.send_with_retries(|| {
            self.client.get(&url).query(&[
                ("query", gene.as_str()),
                ("species", organism),
                ("format", "xml"),
            ])
        })?;
        let response = Self::handle_status(response)?;
        response
            .text()
            .map_err(|err| DiscoError::WikiPathwaysHttp(err.to_string()))
    }

    fn get_pathway(&self, pathway_id: &str) -> Result<String, DiscoError> {
        let url = format!("{}/getPathway", self.base_url);
        let response = self.send_with_retries(|| {
            self.client
                .get(&url)
                .query(&[("pwId", pathway_id), ("format", "json")])
        })?;
        let response = Self::handle_status(response)?;
        let raw_json: Value = response
            .json()
            .map_err(|err| DiscoError::WikiPathwaysParse(err.to_string()))?;
        extract_gpml(&raw_json)
    }
}

pub fn extract_gpml(raw: &Value) -> Result<String, DiscoError> {
    raw.get("pathway")
        .and_then(|value| value.get("gpml"))
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
        .ok_or_else(|| DiscoError::WikiPathwaysParse("response has no pathway.gpml".to_string()))
}

pub fn parse_pathways(xml: &str) -> Result<Vec<PathwayCandidate>, DiscoError> {
    let body = xml.trim();
    if body.is_empty() {
        return Err(DiscoError::WikiPathwaysParse(
            "empty response body".to_string(),
        ));
    }
    if !body.starts_with('<') || !body.ends_with('>') {
        return Err(DiscoError::WikiPathwaysParse(
            "response is not XML".to_string(),
        ));
    }

    let result_prefix = namespace_prefix(body, RESULT_NAMESPACE).ok_or_else(|| {
        DiscoError::WikiPathwaysParse(format!("namespace {RESULT_NAMESPACE} not declared"))
    })?;
    let Some(field_prefix) = namespace_prefix(body, WEBSERVICE_NAMESPACE) else {
        // Without the webservice namespace no result can carry an id or a name.
        return Ok(Vec::new());
    };

    let opening = Regex::new(&format!(r"<{}:result[\s>]", regex::escape(&result_prefix)))
        .map_err(|err| DiscoError::WikiPathwaysParse(err.to_string()))?;
    let closing = format!("</{result_prefix}:result>");
    if opening.find_iter(body).count() != body.matches(&closing).count() {
        return Err(DiscoError::WikiPathwaysParse(
            "unbalanced result elements".to_string(),
        ));
    }

    let result_re = element_regex(&result_prefix, "result")?;
    let id_re = element_regex(&field_prefix, "id")?;
    let name_re = element_regex(&field_prefix, "name")?;

    let mut pathways = Vec::new();
    for result in result_re.captures_iter(body) {
        let inner = &result[1];
        let id = first_text(&id_re, inner);
        let name = first_text(&name_re, inner);
        if let (Some(id), Some(name)) = (id, name) {
            pathways.push(PathwayCandidate { id, name });
        }
    }
    Ok(pathways)
}

fn namespace_prefix(xml: &str, uri: &str) -> Option<String> {
    let declaration = Regex::new(r#"xmlns:([A-Za-z_][\w.\-]*)\s*=\s*["']([^"']*)["']"#).ok()?;
    declaration
        .captures_iter(xml)
        .find(|caps| &caps[2] == uri)
        .map(|caps| caps[1].to_string())
}

fn element_regex(prefix: &str, local: &str) -> Result<Regex, DiscoError> {
    let prefix = regex::escape(prefix);
    Regex::new(&format!(
        r"(?s)<{prefix}:{local}(?:\s[^>]*)?>(.*?)</{prefix}:{local}>"
    ))
    .map_err(|err| DiscoError::WikiPathwaysParse(err.to_string()))
}

fn first_text(re: &Regex, xml: &str) -> Option<String> {
    let caps = re.captures(xml)?;
    let text = decode_entities(caps[1].trim());
    if text.is_empty() { None } else { Some(text) }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_handles_escaped_ampersand() {
        assert_eq!(decode_entities("A &amp;lt; B"), "A &lt; B");
        assert_eq!(decode_entities("Wnt &amp; Notch"), "Wnt & Notch");
    }

    #[test]
    fn extract_gpml_requires_field() {
        let raw = serde_json::json!({ "pathway": { "id": "WP1" } });
        assert!(extract_gpml(&raw).is_err());
        let raw = serde_json::json!({ "pathway": { "gpml": "<Pathway/>" } });
        assert_eq!(extract_gpml(&raw).unwrap(), "<Pathway/>");
    }
}
