use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Logs go to stderr; stdout carries the protocol.
pub fn init_logging(verbosity: u8) {
	// 0 = warnings only, CDP plumbing kept to errors
	// 1 (-v) = mapper info, CDP warnings
	// 2 (-vv) = debug everywhere
	// 3+ (-vvv) = trace, including every CDP frame
	let filter = match verbosity {
		0 => "warn,bidi_runtime=error",
		1 => "info,bidi_runtime=warn",
		2 => "debug",
		_ => "trace",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_ansi(false)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
