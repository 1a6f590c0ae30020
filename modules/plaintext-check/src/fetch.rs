use anyhow::Result;
use async_trait::async_trait;
use httpget_core::ErrorKind;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_MAX_REDIRECTS: usize = 30;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout_ms: u64,
    /// Redirect cap for the HSTS hop.
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: format!("httpget/{}", httpget_core::version()),
        }
    }
}

/// The parts of a response the classifier looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub location: Option<String>,
    pub hsts: Option<String>,
}

#[async_trait]
pub trait Fetch: Send + Sync {
    /// Single GET that never follows redirects.
    async fn probe(&self, url: &Url) -> Result<Reply, ErrorKind>;
    /// GET that follows redirects and skips certificate checks.
    async fn follow(&self, url: &Url) -> Result<Reply, ErrorKind>;
}

pub struct HttpFetcher {
    direct: Client,
    following: Client,
}

impl HttpFetcher {
    pub fn new(opts: &FetchOptions) -> Result<Self> {
        let timeout = Duration::from_millis(opts.timeout_ms);
        let direct = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .user_agent(opts.user_agent.clone())
            .danger_accept_invalid_certs(true)
            .build()?;
        let following = Client::builder()
            .redirect(Policy::limited(opts.max_redirects))
            .timeout(timeout)
            .user_agent(opts.user_agent.clone())
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(HttpFetcher { direct, following })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn probe(&self, url: &Url) -> Result<Reply, ErrorKind> {
        get(&self.direct, url).await
    }

    async fn follow(&self, url: &Url) -> Result<Reply, ErrorKind> {
        get(&self.following, url).await
    }
}

async fn get(client: &Client, url: &Url) -> Result<Reply, ErrorKind> {
    let resp = client.get(url.clone()).send().await.map_err(|e| {
        tracing::debug!(url = %url, error = %e, "request failed");
        error_kind(&e)
    })?;
    let headers = resp.headers();
    // Non-ASCII bytes are kept as replacement characters so the header still counts.
    let text = |name: header::HeaderName| {
        headers.get(name).map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_string())
    };
    Ok(Reply {
        status: resp.status().as_u16(),
        location: text(header::LOCATION),
        hsts: text(header::STRICT_TRANSPORT_SECURITY),
    })
}

fn error_kind(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_redirect() {
        ErrorKind::TooManyRedirects
    } else if err.is_builder() {
        ErrorKind::Other
    } else if tls_in_chain(err) {
        ErrorKind::Tls
    } else if err.is_connect() {
        ErrorKind::ConnectionFailed
    } else {
        ErrorKind::Other
    }
}

// A TLS listener answers a plaintext request with alert records, which the
// HTTP parser reports as a bad version line.
fn tls_in_chain(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        let msg = e.to_string().to_ascii_lowercase();
        if msg.contains("tls")
            || msg.contains("certificate")
            || msg.contains("handshake")
            || msg.contains("invalid http version")
        {
            return true;
        }
        source = e.source();
    }
    false
}
