pub mod server;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use shortcut_config::Security;
use shortcut_providers::ShortcutClient;

#[derive(Debug, Parser)]
#[command(
	version = shortcut_cli::VERSION,
	rename_all = "kebab",
	styles = shortcut_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum McpAuthState {
	Off,
	StaticToken { bearer_token: String },
}

pub async fn run(args: Args) -> Result<()> {
	let config = shortcut_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let auth_state = build_auth_state(&config.security, &config.service.mcp_bind)?;
	let client = ShortcutClient::new(&config.shortcut)?;
	let search = server::SearchSettings {
		page_size: config.search.page_size,
		detail: config.search.detail.clone(),
	};

	tracing::info!(bind = %config.service.mcp_bind, api_base = %config.shortcut.api_base, "Starting Shortcut MCP server.");

	server::serve_mcp(&config.service.mcp_bind, client, search, auth_state).await
}

fn build_auth_state(security: &Security, mcp_bind: &str) -> Result<McpAuthState> {
	match security.auth_mode.as_str() {
		"off" => {
			enforce_loopback_for_off_mode(mcp_bind)?;

			Ok(McpAuthState::Off)
		},
		"static_token" => {
			let bearer_token = security.bearer_token.clone().ok_or_else(|| {
				eyre::eyre!("security.bearer_token is required when security.auth_mode=static_token.")
			})?;

			Ok(McpAuthState::StaticToken { bearer_token })
		},
		other => Err(eyre::eyre!(
			"security.auth_mode must be one of off or static_token, got {other}."
		)),
	}
}

fn enforce_loopback_for_off_mode(mcp_bind: &str) -> Result<()> {
	let bind_addr: SocketAddr = mcp_bind.parse().map_err(|err| {
		eyre::eyre!(
			"service.mcp_bind must be a valid socket address when security.auth_mode=off: {err}"
		)
	})?;

	if !bind_addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"service.mcp_bind must be a loopback address when security.auth_mode=off."
		));
	}

	Ok(())
}
