use serde_json::Value;

use shortcut_query::{BoxFuture, Identity, ResolveError, UserResolver};

use crate::{Error, Result, ShortcutClient};

const MEMBER_PATH: &str = "/api/v3/member";

impl ShortcutClient {
	/// Fetches the member that owns the configured API token.
	pub async fn current_member(&self) -> Result<Identity> {
		let response = self.http().get(self.url(MEMBER_PATH)).send().await?;
		let json = crate::read_json(response).await?;

		parse_member_response(&json)
	}
}

/// Every call performs a fresh lookup; memoization is the compiler's job and lasts one
/// compile call.
impl UserResolver for ShortcutClient {
	fn resolve_current_user(&self) -> BoxFuture<'_, Result<Identity, ResolveError>> {
		Box::pin(async move {
			self.current_member().await.map_err(|err| {
				tracing::warn!(error = %err, "Failed to resolve current Shortcut member.");

				ResolveError::new(err.to_string())
			})
		})
	}
}

fn parse_member_response(json: &Value) -> Result<Identity> {
	let id = json
		.get("id")
		.and_then(Value::as_str)
		.ok_or_else(|| Error::InvalidResponse { message: "Member response is missing id.".into() })?;
	let mention_name = json
		.get("mention_name")
		.and_then(Value::as_str)
		.filter(|name| !name.trim().is_empty())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Member response is missing mention_name.".into(),
		})?;

	Ok(Identity { id: id.to_string(), mention_name: mention_name.to_string() })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_member_identity() {
		let json = serde_json::json!({
			"id": "6410fa00-0000-4000-8000-000000000001",
			"mention_name": "amcd",
			"name": "Alex McDonald",
			"workspace2": { "url_slug": "acme" }
		});
		let identity = parse_member_response(&json).expect("parse failed");

		assert_eq!(identity.mention_name, "amcd");
		assert_eq!(identity.id, "6410fa00-0000-4000-8000-000000000001");
	}

	#[test]
	fn rejects_member_without_mention_name() {
		let json = serde_json::json!({ "id": "m-1", "mention_name": "" });
		let err = parse_member_response(&json).expect_err("expected parse error");

		assert!(err.to_string().contains("mention_name"), "unexpected error: {err}");
	}
}
