use ortvalue::output::OrtValueError;
use ortvalue_testkit::FixtureError;
use thiserror::Error;

/// CLI result type.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
	/// Decoding or reading a value failed.
	#[error(transparent)]
	Decode(#[from] OrtValueError),
	/// Fixture could not be loaded.
	#[error("fixture {path}: {source}")]
	Fixture {
		/// Fixture path as given.
		path: String,
		/// Underlying fixture error.
		source: FixtureError,
	},
	/// Output could not be encoded as JSON.
	#[error("failed to encode json: {0}")]
	Json(#[from] serde_json::Error),
	/// Native handles outlived disposal of the decoded outputs.
	#[error("{live} native handle(s) still live and {failed} failed release(s) after dispose")]
	Leak {
		/// Value handles never released.
		live: usize,
		/// Releases the engine rejected.
		failed: usize,
	},
}
