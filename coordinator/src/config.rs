use std::{env, error::Error, fmt, fs, io, num::NonZeroUsize};

use comms::specs::CoordinatorSpec;

/// Path to a json file holding a `CoordinatorSpec`.
pub const SPEC_VAR: &str = "COORDINATOR_SPEC";
/// Overrides the quorum of the loaded spec.
pub const QUORUM_VAR: &str = "QUORUM";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "8080";

/// The config module's result type.
pub type Result<T> = std::result::Result<T, ConfigErr>;

/// Failures while loading the coordinator's configuration.
#[derive(Debug)]
pub enum ConfigErr {
    Io { path: String, source: io::Error },
    Json(serde_json::Error),
    InvalidQuorum(String),
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErr::Io { path, source } => write!(f, "failed to read {path}: {source}"),
            ConfigErr::Json(e) => write!(f, "invalid coordinator spec: {e}"),
            ConfigErr::InvalidQuorum(raw) => {
                write!(f, "quorum must be a positive integer, got {raw:?}")
            }
        }
    }
}

impl Error for ConfigErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigErr::Io { source, .. } => Some(source),
            ConfigErr::Json(e) => Some(e),
            ConfigErr::InvalidQuorum(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Parses a json encoded `CoordinatorSpec`.
///
/// # Arguments
/// * `raw` - The json document.
///
/// # Returns
/// The parsed spec or an error if it's malformed.
pub fn parse_spec(raw: &str) -> Result<CoordinatorSpec> {
    Ok(serde_json::from_str(raw)?)
}

/// Parses a quorum override.
///
/// # Arguments
/// * `raw` - The textual quorum, surrounding whitespace is ignored.
///
/// # Returns
/// The quorum or an error if it isn't a positive integer.
pub fn parse_quorum(raw: &str) -> Result<NonZeroUsize> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigErr::InvalidQuorum(raw.to_string()))
}

/// Loads the coordinator spec from the environment.
///
/// Reads the file named by `COORDINATOR_SPEC` if set, falling back to the
/// default spec otherwise, then applies the `QUORUM` override if present.
///
/// # Returns
/// The resolved spec or an error if any source is invalid.
pub fn load_spec() -> Result<CoordinatorSpec> {
    let mut spec = match env::var(SPEC_VAR) {
        Ok(path) => {
            let raw = fs::read_to_string(&path).map_err(|source| ConfigErr::Io { path, source })?;
            parse_spec(&raw)?
        }
        Err(_) => CoordinatorSpec::default(),
    };

    if let Ok(raw) = env::var(QUORUM_VAR) {
        spec.quorum = parse_quorum(&raw)?;
    }

    Ok(spec)
}

/// The address the coordinator listens at, from `HOST` and `PORT`.
pub fn listen_addr() -> String {
    format!(
        "{}:{}",
        env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
        env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string()),
    )
}
