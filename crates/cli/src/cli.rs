use std::time::Duration;

use bidi_mapper::MapperConfig;
use clap::{ArgGroup, Parser};

use crate::styles::cli_styles;

#[derive(Parser, Debug)]
#[command(name = "bidi-mapper")]
#[command(about = "WebDriver BiDi over stdio, backed by a Chromium DevTools endpoint")]
#[command(version)]
#[command(styles = cli_styles())]
#[command(group(ArgGroup::new("endpoint").required(true).args(["cdp_url", "port"])))]
pub struct Cli {
	/// DevTools WebSocket URL (ws://host:port/devtools/browser/<id>)
	#[arg(long, env = "BIDI_MAPPER_CDP_URL", value_name = "URL")]
	pub cdp_url: Option<String>,

	/// Discover the WebSocket URL from a local browser's remote debugging port
	#[arg(short, long, value_name = "PORT")]
	pub port: Option<u16>,

	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// How long to wait for new tabs and sandboxes to be reported
	#[arg(long, value_name = "MS", default_value_t = 10_000)]
	pub context_timeout_ms: u64,
}

impl Cli {
	pub fn mapper_config(&self) -> MapperConfig {
		MapperConfig::default().with_context_timeout(Duration::from_millis(self.context_timeout_ms))
	}
}
