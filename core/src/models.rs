use std::fmt;
use thiserror::Error;

/// One `host:port` pair taken from the input list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Target { host: host.into(), port }
    }

    /// URL of the initial plaintext probe.
    pub fn url(&self) -> String {
        format!("http://{}/", self)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Transport failure of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Timed Out")]
    Timeout,
    #[error("Max Retries Exceeded")]
    ConnectionFailed,
    #[error("SSL Error")]
    Tls,
    #[error("Too Many Redirects")]
    TooManyRedirects,
    #[error("Unhandled Error (possible causes invalid host or port, or ssl/tls enabled service)")]
    Other,
}

/// Which of the two requests a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop {
    Initial,
    HstsCheck,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HstsHeader {
    pub raw: String,
    /// `None` when the header did not match `max-age=<digits>`.
    pub max_age: Option<u64>,
}

/// Everything observed while classifying one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResult {
    pub status_code: Option<u16>,
    pub redirect_location: Option<String>,
    pub hsts: Option<HstsHeader>,
    pub error: Option<ErrorKind>,
}

impl ProbeResult {
    pub fn failed(error: ErrorKind) -> Self {
        ProbeResult { error: Some(error), ..Default::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaintextVia {
    /// Served content directly with a 200.
    Direct,
    /// Redirected somewhere that is still not https.
    Redirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeakReason {
    MaxAgeTooLow(u64),
    UnparseableHsts,
}

impl fmt::Display for WeakReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeakReason::MaxAgeTooLow(_) => write!(f, "max-age too low"),
            WeakReason::UnparseableHsts => write!(f, "unparseable HSTS header"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInfo {
    /// Redirect status without a `Location` header.
    NoLocation,
    /// The https endpoint did not send `Strict-Transport-Security`.
    NoHsts,
}

/// Final verdict for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Plaintext(PlaintextVia),
    RedirectsSecurely,
    RedirectsWeakly(WeakReason),
    RedirectsWithoutInfo(MissingInfo),
    Unreachable(Hop, ErrorKind),
    /// Answered, but neither 200 nor a redirect code.
    Unclassified(u16),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Plaintext(_) => "plaintext",
            Outcome::RedirectsSecurely => "redirects-securely",
            Outcome::RedirectsWeakly(_) => "redirects-weakly",
            Outcome::RedirectsWithoutInfo(_) => "redirects-without-info",
            Outcome::Unreachable(..) => "unreachable",
            Outcome::Unclassified(_) => "unclassified",
        }
    }
}
