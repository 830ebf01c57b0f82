mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Search, Security, Service, Shortcut};

use std::{env, fs, path::Path};

pub const API_TOKEN_ENV: &str = "SHORTCUT_API_TOKEN";
pub const MAX_PAGE_SIZE: u32 = 250;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg, env::var(API_TOKEN_ENV).ok());

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.mcp_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.mcp_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if !(cfg.shortcut.api_base.starts_with("http://") || cfg.shortcut.api_base.starts_with("https://"))
	{
		return Err(Error::Validation {
			message: "shortcut.api_base must start with http:// or https://.".to_string(),
		});
	}
	if cfg.shortcut.api_token.trim().is_empty() {
		return Err(Error::Validation {
			message: format!("shortcut.api_token must be non-empty or {API_TOKEN_ENV} must be set."),
		});
	}
	if cfg.shortcut.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "shortcut.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (key, value) in &cfg.shortcut.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("shortcut.default_headers.{key} must be a string."),
			});
		}
	}

	if !(1..=MAX_PAGE_SIZE).contains(&cfg.search.page_size) {
		return Err(Error::Validation {
			message: format!("search.page_size must be in the range 1-{MAX_PAGE_SIZE}."),
		});
	}
	if !matches!(cfg.search.detail.as_str(), "slim" | "full") {
		return Err(Error::Validation {
			message: "search.detail must be one of slim or full.".to_string(),
		});
	}

	match cfg.security.auth_mode.as_str() {
		"off" => {},
		"static_token" =>
			if cfg.security.bearer_token.is_none() {
				return Err(Error::Validation {
					message: "security.bearer_token is required when security.auth_mode=static_token."
						.to_string(),
				});
			},
		_ => {
			return Err(Error::Validation {
				message: "security.auth_mode must be one of off or static_token.".to_string(),
			});
		},
	}

	Ok(())
}

/// `env_token` is only consulted when the file leaves `shortcut.api_token` blank.
pub fn normalize(cfg: &mut Config, env_token: Option<String>) {
	cfg.shortcut.api_base = cfg.shortcut.api_base.trim().trim_end_matches('/').to_string();
	cfg.search.detail = cfg.search.detail.trim().to_ascii_lowercase();
	cfg.security.auth_mode = cfg.security.auth_mode.trim().to_ascii_lowercase();

	if cfg.shortcut.api_token.trim().is_empty()
		&& let Some(token) = env_token
	{
		cfg.shortcut.api_token = token.trim().to_string();
	}
	if cfg.security.bearer_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false) {
		cfg.security.bearer_token = None;
	}
}
