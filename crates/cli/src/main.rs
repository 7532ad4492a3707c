use anyhow::Context;
use bidi_mapper_cli::{cli::Cli, logging, serve};
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = serve(cli).await.context("bidi-mapper failed") {
		tracing::error!(error = %err, "Exiting");
		eprintln!("error: {err:#}");
		std::process::exit(1);
	}
}
