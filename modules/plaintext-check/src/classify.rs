use crate::fetch::{Fetch, Reply};
use crate::hsts::{parse_max_age, MIN_SECURE_MAX_AGE};
use httpget_core::{
    ErrorKind, HstsHeader, Hop, MissingInfo, Outcome, PlaintextVia, ProbeResult, Target, WeakReason,
};
use tracing::{debug, info};
use url::Url;

const REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];

/// What the initial response says about where to go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Triage {
    Done(Outcome),
    /// Redirected to https; the target URL still needs its HSTS checked.
    CheckHsts(Url),
}

/// Decide from the unredirected response alone. `base` is the probed URL,
/// used to resolve relative `Location` values.
pub fn triage(base: &Url, status: u16, location: Option<&str>) -> Triage {
    if status == 200 {
        return Triage::Done(Outcome::Plaintext(PlaintextVia::Direct));
    }
    if !REDIRECT_CODES.contains(&status) {
        return Triage::Done(Outcome::Unclassified(status));
    }
    let Some(location) = location else {
        return Triage::Done(Outcome::RedirectsWithoutInfo(MissingInfo::NoLocation));
    };
    match base.join(location) {
        Ok(next) if next.scheme() == "https" => Triage::CheckHsts(next),
        _ => Triage::Done(Outcome::Plaintext(PlaintextVia::Redirect)),
    }
}

/// Judge the `Strict-Transport-Security` value seen after following the
/// https redirect.
pub fn judge_hsts(header: Option<&str>, min_max_age: u64) -> Outcome {
    let Some(raw) = header else {
        return Outcome::RedirectsWithoutInfo(MissingInfo::NoHsts);
    };
    match parse_max_age(raw) {
        Ok(age) if age >= min_max_age => Outcome::RedirectsSecurely,
        Ok(age) => Outcome::RedirectsWeakly(WeakReason::MaxAgeTooLow(age)),
        Err(e) => {
            debug!(header = %raw, error = %e, "unparseable HSTS header");
            Outcome::RedirectsWeakly(WeakReason::UnparseableHsts)
        }
    }
}

pub struct Classifier<F> {
    fetch: F,
    min_max_age: u64,
}

impl<F: Fetch> Classifier<F> {
    pub fn new(fetch: F) -> Self {
        Classifier { fetch, min_max_age: MIN_SECURE_MAX_AGE }
    }

    pub fn with_min_max_age(mut self, secs: u64) -> Self {
        self.min_max_age = secs;
        self
    }

    /// Probe one target, following at most one https redirect.
    pub async fn classify(&self, target: &Target) -> (Outcome, ProbeResult) {
        info!("Testing host: {}  on port: {}", target.host, target.port);
        let base = match Url::parse(&target.url()) {
            Ok(u) => u,
            Err(e) => {
                debug!(service = %target, error = %e, "cannot build probe url");
                return unreachable(Hop::Initial, ProbeResult::failed(ErrorKind::Other));
            }
        };
        let first: Reply = match self.fetch.probe(&base).await {
            Ok(r) => r,
            Err(kind) => return unreachable(Hop::Initial, ProbeResult::failed(kind)),
        };
        info!("Webserver returned a {} status code", first.status);

        let mut result = ProbeResult {
            status_code: Some(first.status),
            redirect_location: first.location.clone(),
            ..Default::default()
        };
        let next = match triage(&base, first.status, first.location.as_deref()) {
            Triage::Done(outcome) => return (outcome, result),
            Triage::CheckHsts(next) => next,
        };

        info!("Following redirect to {} for HSTS validation.", next);
        match self.fetch.follow(&next).await {
            Ok(reply) => {
                let outcome = judge_hsts(reply.hsts.as_deref(), self.min_max_age);
                result.hsts = reply.hsts.map(|raw| HstsHeader {
                    max_age: parse_max_age(&raw).ok(),
                    raw,
                });
                (outcome, result)
            }
            Err(kind) => {
                result.error = Some(kind);
                unreachable(Hop::HstsCheck, result)
            }
        }
    }
}

fn unreachable(hop: Hop, result: ProbeResult) -> (Outcome, ProbeResult) {
    let kind = result.error.unwrap_or(ErrorKind::Other);
    (Outcome::Unreachable(hop, kind), result)
}
