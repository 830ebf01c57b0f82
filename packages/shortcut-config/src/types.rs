use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub shortcut: Shortcut,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub mcp_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Shortcut {
	#[serde(default = "default_api_base")]
	pub api_base: String,
	/// Optional in the file. Falls back to the `SHORTCUT_API_TOKEN` environment variable.
	#[serde(default)]
	pub api_token: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_page_size")]
	pub page_size: u32,
	/// Either "slim" or "full".
	#[serde(default = "default_detail")]
	pub detail: String,
}
impl Default for Search {
	fn default() -> Self {
		Self { page_size: default_page_size(), detail: default_detail() }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	/// Either "off" or "static_token".
	#[serde(default = "default_auth_mode")]
	pub auth_mode: String,
	pub bearer_token: Option<String>,
}
impl Default for Security {
	fn default() -> Self {
		Self { auth_mode: default_auth_mode(), bearer_token: None }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_api_base() -> String {
	"https://api.app.shortcut.com".to_string()
}

fn default_timeout_ms() -> u64 {
	10_000
}

fn default_page_size() -> u32 {
	25
}

fn default_detail() -> String {
	"slim".to_string()
}

fn default_auth_mode() -> String {
	"off".to_string()
}
