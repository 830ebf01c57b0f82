pub mod member;
pub mod search;

mod error;

pub use error::{Error, Result};
pub use search::{Entity, SearchItem, SearchPage};

use std::time::Duration;

use reqwest::{
	Client, Response,
	header::{HeaderMap, HeaderName, HeaderValue},
};
use serde_json::{Map, Value};

use shortcut_config::Shortcut;

pub const HEADER_SHORTCUT_TOKEN: &str = "shortcut-token";

pub fn auth_headers(api_token: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	let mut token = HeaderValue::from_str(api_token)?;

	token.set_sensitive(true);
	headers.insert(HeaderName::from_static(HEADER_SHORTCUT_TOKEN), token);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Thin client over the Shortcut REST API. Cloning shares the connection pool.
#[derive(Clone, Debug)]
pub struct ShortcutClient {
	client: Client,
	api_base: String,
}
impl ShortcutClient {
	pub fn new(cfg: &Shortcut) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(auth_headers(&cfg.api_token, &cfg.default_headers)?)
			.build()?;

		Ok(Self { client, api_base: cfg.api_base.trim_end_matches('/').to_string() })
	}

	pub(crate) fn url(&self, path: &str) -> String {
		format!("{}{}", self.api_base, path)
	}

	pub(crate) fn http(&self) -> &Client {
		&self.client
	}
}

pub(crate) async fn read_json(response: Response) -> Result<Value> {
	let status = response.status();

	if !status.is_success() {
		let body = response.text().await.unwrap_or_default();

		return Err(Error::Status { status: status.as_u16(), body });
	}

	Ok(response.json().await?)
}
