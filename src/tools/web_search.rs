//! Web search tool backed by the DuckDuckGo HTML endpoint.
//!
//! No API key needed: fetch the HTML results page and extract results with
//! CSS selectors. `scraper::Html` is not `Send`, so all parsing happens in a
//! sync helper that finishes before the next await point.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{Tool, ToolContext};
use crate::error::{AgentError, Result};

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; DeepAgent/1.0)";
const TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug)]
pub struct WebSearchTool {
    client: reqwest::Client,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns titles, snippets and URLs."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return"
                },
                "region": {
                    "type": "string",
                    "description": "DuckDuckGo region code, e.g. 'us-en' or 'de-de'"
                },
                "safesearch": {
                    "type": "string",
                    "description": "Safe search level: 'strict', 'moderate' or 'off'"
                },
                "time": {
                    "type": "string",
                    "description": "Restrict results by age: 'd' (day), 'w' (week), 'm' (month), 'y' (year)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Tool("web_search requires a 'query' string".to_string()))?;
        let max_results = args
            .get("max_results")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(ctx.search.max_results);
        let region = args
            .get("region")
            .and_then(Value::as_str)
            .unwrap_or(&ctx.search.region);
        let safesearch = args
            .get("safesearch")
            .and_then(Value::as_str)
            .unwrap_or(&ctx.search.safesearch);
        let time = args.get("time").and_then(Value::as_str);

        let mut url = format!(
            "{SEARCH_ENDPOINT}?q={}&kl={}&kp={}",
            urlencoding::encode(query),
            urlencoding::encode(region),
            safesearch_param(safesearch)
        );
        if let Some(df) = time {
            url.push_str(&format!("&df={}", urlencoding::encode(df)));
        }

        debug!(query, max_results, "running web search");
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(TIMEOUT)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AgentError::Tool(format!(
                "search request failed with HTTP {status}"
            )));
        }

        let html = resp.text().await?;
        let results = extract_results(&html, max_results)?;
        if results.is_empty() {
            warn!(query, "search returned no results");
            return Ok(format!("No results found for: {query}"));
        }
        Ok(serde_json::to_string_pretty(&results)?)
    }
}

/// Map a safesearch level to DuckDuckGo's `kp` parameter.
fn safesearch_param(level: &str) -> &'static str {
    match level {
        "strict" => "1",
        "off" => "-2",
        _ => "-1",
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub body: String,
    pub href: String,
    pub hostname: String,
}

/// Pull results out of a DuckDuckGo HTML results page.
fn extract_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = scraper::Html::parse_document(html);
    let result_sel = selector("div.result__body")?;
    let title_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut results = Vec::new();
    for element in document.select(&result_sel).take(max_results) {
        let Some(link) = element.select(&title_sel).next() else {
            continue;
        };
        let title = collapse_whitespace(&link.text().collect::<String>());
        let href = link
            .value()
            .attr("href")
            .map(resolve_redirect)
            .unwrap_or_default();
        let body = element
            .select(&snippet_sel)
            .next()
            .map(|s| collapse_whitespace(&s.text().collect::<String>()))
            .unwrap_or_default();

        if title.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title,
            body,
            hostname: hostname_of(&href),
            href,
        });
    }
    Ok(results)
}

fn hostname_of(href: &str) -> String {
    let rest = href
        .strip_prefix("https://")
        .or_else(|| href.strip_prefix("http://"))
        .or_else(|| href.strip_prefix("//"))
        .unwrap_or(href);
    rest.split('/').next().unwrap_or_default().to_string()
}

fn selector(css: &str) -> Result<scraper::Selector> {
    scraper::Selector::parse(css)
        .map_err(|err| AgentError::Tool(format!("bad selector '{css}': {err}")))
}

/// Result links point at DuckDuckGo's redirect endpoint with the real
/// destination percent-encoded in the `uddg` parameter.
fn resolve_redirect(href: &str) -> String {
    if let Some(start) = href.find("uddg=") {
        let encoded = &href[start + 5..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        if let Ok(decoded) = urlencoding::decode(encoded) {
            return decoded.into_owned();
        }
    }
    href.to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
        <div class="result__body">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&rut=abc">
                Rust Programming   Language
            </a>
            <a class="result__snippet">A language empowering everyone
               to build reliable software.</a>
        </div>
        <div class="result__body">
            <a class="result__a" href="https://doc.rust-lang.org/book/">The Rust Book</a>
            <a class="result__snippet">Learn Rust.</a>
        </div>
        <div class="result__body">
            <a class="result__a" href="https://crates.io/">crates.io</a>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_extracts_title_body_and_href() {
        let results = extract_results(FIXTURE, 10).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].href, "https://www.rust-lang.org/");
        assert_eq!(results[0].hostname, "www.rust-lang.org");
        assert_eq!(
            results[0].body,
            "A language empowering everyone to build reliable software."
        );
    }

    #[test]
    fn test_direct_links_pass_through() {
        let results = extract_results(FIXTURE, 10).unwrap();
        assert_eq!(results[1].href, "https://doc.rust-lang.org/book/");
        assert_eq!(results[1].hostname, "doc.rust-lang.org");
    }

    #[test]
    fn test_missing_snippet_is_empty() {
        let results = extract_results(FIXTURE, 10).unwrap();
        assert_eq!(results[2].body, "");
    }

    #[test]
    fn test_max_results_caps_output() {
        let results = extract_results(FIXTURE, 1).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_empty_page_yields_no_results() {
        assert!(extract_results("<html></html>", 5).unwrap().is_empty());
    }

    #[test]
    fn test_safesearch_mapping() {
        assert_eq!(safesearch_param("strict"), "1");
        assert_eq!(safesearch_param("moderate"), "-1");
        assert_eq!(safesearch_param("off"), "-2");
        assert_eq!(safesearch_param("bogus"), "-1");
    }

    #[test]
    fn test_resolve_redirect() {
        assert_eq!(
            resolve_redirect("//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fa%20b&rut=x"),
            "https://example.com/a b"
        );
        assert_eq!(resolve_redirect("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_hostname_of() {
        assert_eq!(hostname_of("https://www.rust-lang.org/learn"), "www.rust-lang.org");
        assert_eq!(hostname_of("http://example.com"), "example.com");
        assert_eq!(hostname_of("//example.com/x"), "example.com");
        assert_eq!(hostname_of(""), "");
    }

    #[test]
    fn test_schema_requires_query() {
        let schema = WebSearchTool::new().parameters();
        assert_eq!(schema["required"][0], "query");
    }
}
