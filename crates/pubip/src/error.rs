use std::error::Error as StdError;

/// Why a single provider could not report an address.
///
/// Never escapes the provider it belongs to: the resolver turns it
/// into an [`Outcome::Error`](crate::Outcome::Error).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The connection could not be established, timed out or broke
    /// before the body was read.
    #[error("{0}")]
    Transport(String),

    /// Any other failure while performing the request.
    #[error("Unknown request error: {0}")]
    Request(String),

    /// The body was expected to be JSON but is not.
    #[error("Unable to parse result as JSON: {body} ({source})")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The body was decoded but holds no usable address.
    #[error("Unknown error: {0}")]
    Extract(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let msg = describe(&err);
        if err.is_connect() || err.is_timeout() || err.is_body() {
            Self::Transport(msg)
        } else {
            Self::Request(msg)
        }
    }
}

// Renders the error along with its root cause, if it has one.
// reqwest hides the interesting part ("connection refused", "dns error")
// deep in the source chain.
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut root = None;
    let mut next = err.source();
    while let Some(source) = next {
        root = Some(source);
        next = source.source();
    }

    match root {
        Some(root) => format!("{}, because {}", err, root),
        None => err.to_string(),
    }
}
