use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("no browser with remote debugging found on port {port}: {reason}")]
	Discovery { port: u16, reason: String },

	#[error("either --cdp-url or --port is required")]
	MissingEndpoint,

	#[error(transparent)]
	Runtime(#[from] bidi_runtime::Error),

	#[error(transparent)]
	Mapper(#[from] bidi_mapper::Error),
}
