use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

static SCRIPT_SELECTOR: Lazy<Selector> =
	Lazy::new(|| Selector::parse("script").expect("static selector"));

const USER_AGENT: &str = concat!("codetheft/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ScrapeError {
	#[error("invalid target: {0}")]
	InvalidTarget(String),

	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("scrape service returned {status}: {body}")]
	Service { status: u16, body: String },

	#[error("scrape service returned no html")]
	EmptyResponse,
}

/// Produces the HTML of a page.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Scraper: Send + Sync {
	async fn fetch(&self, target: &Url) -> Result<String, ScrapeError>;
}

/// Turn the user's input into the page to scrape. Accepts a bare domain
/// (`example.com`), optionally with scheme, `www.` or a path, and always
/// targets `https://www.<domain>`.
pub fn target_url(input: &str) -> Result<Url, ScrapeError> {
	let trimmed = input.trim();
	let without_scheme = trimmed
		.strip_prefix("https://")
		.or_else(|| trimmed.strip_prefix("http://"))
		.unwrap_or(trimmed);
	let bare = without_scheme.strip_prefix("www.").unwrap_or(without_scheme).trim_end_matches('/');
	if bare.is_empty() {
		return Err(ScrapeError::InvalidTarget(input.to_string()));
	}

	let url = Url::parse(&format!("https://www.{}", bare))
		.map_err(|_| ScrapeError::InvalidTarget(input.to_string()))?;
	match url.host_str() {
		Some(host)
			if host.strip_prefix("www.").is_some_and(|h| h.contains('.')) &&
				url.username().is_empty() =>
			Ok(url),
		_ => Err(ScrapeError::InvalidTarget(input.to_string())),
	}
}

/// Remove every `<script>` element, keeping the rest of the document.
pub fn sanitize_html(raw: &str) -> String {
	let mut document = Html::parse_document(raw);
	let scripts: Vec<_> = document.select(&SCRIPT_SELECTOR).map(|el| el.id()).collect();
	for id in scripts {
		if let Some(mut node) = document.tree.get_mut(id) {
			node.detach();
		}
	}
	document.html()
}

/// Fetches the served HTML straight from the target site. Scripts are not
/// executed, so pages built client-side come back unrendered; use
/// [`RemoteScraper`] for those.
pub struct DirectScraper {
	client: reqwest::Client,
}

impl DirectScraper {
	pub fn new(nav_timeout: Duration) -> Result<Self, ScrapeError> {
		let client = reqwest::Client::builder()
			.timeout(nav_timeout)
			.user_agent(USER_AGENT)
			.build()?;
		Ok(Self { client })
	}
}

#[async_trait]
impl Scraper for DirectScraper {
	async fn fetch(&self, target: &Url) -> Result<String, ScrapeError> {
		log::info!("Fetching {}", target);
		let html = self.client.get(target.clone()).send().await?.error_for_status()?.text().await?;
		log::debug!("Fetched {} bytes from {}", html.len(), target);
		Ok(html)
	}
}

#[derive(Serialize)]
struct ScrapeServiceRequest<'a> {
	url: &'a str,
}

#[derive(Deserialize)]
struct ScrapeServiceResponse {
	#[serde(alias = "code")]
	html: Option<String>,
}

/// Delegates rendering to an external scraping service which answers
/// `POST {url}` with `{"html": ...}` (or `{"code": ...}`).
pub struct RemoteScraper {
	client: reqwest::Client,
	endpoint: Url,
}

impl RemoteScraper {
	pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ScrapeError> {
		let endpoint =
			Url::parse(endpoint).map_err(|e| ScrapeError::InvalidTarget(e.to_string()))?;
		let client = reqwest::Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
		Ok(Self { client, endpoint })
	}
}

#[async_trait]
impl Scraper for RemoteScraper {
	async fn fetch(&self, target: &Url) -> Result<String, ScrapeError> {
		log::info!("Delegating scrape of {} to {}", target, self.endpoint);
		let resp = self
			.client
			.post(self.endpoint.clone())
			.json(&ScrapeServiceRequest { url: target.as_str() })
			.send()
			.await?;

		let status = resp.status();
		if !status.is_success() {
			let body = resp.text().await.unwrap_or_default();
			return Err(ScrapeError::Service { status: status.as_u16(), body });
		}

		resp.json::<ScrapeServiceResponse>()
			.await?
			.html
			.filter(|h| !h.trim().is_empty())
			.ok_or(ScrapeError::EmptyResponse)
	}
}
