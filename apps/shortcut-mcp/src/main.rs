use clap::Parser;

use shortcut_mcp::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	shortcut_mcp::run(args).await
}
