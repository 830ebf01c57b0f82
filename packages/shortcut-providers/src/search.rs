use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result, ShortcutClient};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
	Stories,
	Epics,
}
impl Entity {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Stories => "stories",
			Self::Epics => "epics",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchItem {
	pub id: i64,
	pub name: String,
	pub app_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchPage {
	pub total: u64,
	pub items: Vec<SearchItem>,
	/// Opaque continuation path returned by the API, if more results exist.
	pub next: Option<String>,
}

impl ShortcutClient {
	/// Runs one search request. `query` is forwarded verbatim.
	pub async fn search(
		&self,
		entity: Entity,
		query: &str,
		page_size: u32,
		detail: &str,
	) -> Result<SearchPage> {
		let url = self.url(&format!("/api/v3/search/{}", entity.as_str()));
		let page_size = page_size.to_string();
		let response = self
			.http()
			.get(url)
			.query(&[("query", query), ("page_size", page_size.as_str()), ("detail", detail)])
			.send()
			.await?;
		let json = crate::read_json(response).await?;

		tracing::debug!(entity = entity.as_str(), query, "Shortcut search completed.");

		parse_search_response(&json)
	}
}

fn parse_search_response(json: &Value) -> Result<SearchPage> {
	let data = json.get("data").and_then(Value::as_array).ok_or_else(|| {
		Error::InvalidResponse { message: "Search response is missing data array.".to_string() }
	})?;
	let mut items = Vec::with_capacity(data.len());

	for item in data {
		let id = item.get("id").and_then(Value::as_i64).ok_or_else(|| Error::InvalidResponse {
			message: "Search result is missing a numeric id.".to_string(),
		})?;
		let name = item.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
		let app_url = item.get("app_url").and_then(Value::as_str).map(str::to_string);

		items.push(SearchItem { id, name, app_url });
	}

	let total = json.get("total").and_then(Value::as_u64).unwrap_or(items.len() as u64);
	let next = json.get("next").and_then(Value::as_str).map(str::to_string);

	Ok(SearchPage { total, items, next })
}
