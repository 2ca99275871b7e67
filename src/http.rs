use std::time::Duration;

use thiserror::Error;

/// Text fetch over HTTP(S). Implementations must be shareable across the
/// extraction fan-out threads.
pub(crate) trait Fetch: Sync {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("request to {url} failed: HTTP status {status}{detail}")]
    Status {
        url: String,
        status: u16,
        detail: String,
    },
    #[error("request to {url} failed: transport error: {detail}")]
    Transport { url: String, detail: String },
    #[error("request to {url} failed: response decode failed: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Without a timeout a stalled server holds its request open indefinitely.
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder
                .timeout_connect(timeout)
                .timeout_read(timeout)
                .timeout_write(timeout);
        }
        Self {
            agent: builder.build(),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        match self.agent.get(url).call() {
            // ureq only errors on 4xx/5xx; redirects it could not follow land here.
            Ok(response) if !(200..300).contains(&response.status()) => {
                Err(status_error(url, response.status(), response))
            }
            Ok(response) => response.into_string().map_err(|source| FetchError::Decode {
                url: url.to_string(),
                source,
            }),
            Err(ureq::Error::Status(status, response)) => Err(status_error(url, status, response)),
            Err(ureq::Error::Transport(err)) => Err(FetchError::Transport {
                url: url.to_string(),
                detail: err.to_string(),
            }),
        }
    }
}

fn status_error(url: &str, status: u16, response: ureq::Response) -> FetchError {
    let response_body = response.into_string().ok().unwrap_or_default();
    let body = response_body.trim();
    let detail = if body.is_empty() {
        String::new()
    } else {
        let truncated = body.chars().take(240).collect::<String>();
        format!(" ({truncated})")
    };
    FetchError::Status {
        url: url.to_string(),
        status,
        detail,
    }
}
