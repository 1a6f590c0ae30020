use httpget_core::{Hop, MissingInfo, Outcome, ProbeResult, Target};
use serde::Serialize;
use std::fmt;

/// One row of `http-get-log.csv`. Written without a header; `None` fields
/// come out as empty cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRow {
    pub target: String,
    pub status: Option<u16>,
    pub secure_redirect: &'static str,
    pub location: Option<String>,
    pub hsts: Option<String>,
}

impl LogRow {
    pub fn new(target: &Target, outcome: &Outcome, result: &ProbeResult) -> Self {
        let to_https = matches!(
            outcome,
            Outcome::RedirectsSecurely
                | Outcome::RedirectsWeakly(_)
                | Outcome::RedirectsWithoutInfo(MissingInfo::NoHsts)
                | Outcome::Unreachable(Hop::HstsCheck, _)
        );
        let hsts = match (outcome, &result.hsts) {
            (_, Some(h)) => Some(h.raw.clone()),
            (Outcome::RedirectsWithoutInfo(MissingInfo::NoHsts), None) => Some("not set".to_string()),
            _ => None,
        };
        LogRow {
            target: target.to_string(),
            status: result.status_code,
            secure_redirect: if to_https { "y" } else { "n" },
            location: result.redirect_location.clone(),
            hsts,
        }
    }
}

/// Per-category counts for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub plaintext: usize,
    pub secure: usize,
    pub weak: usize,
    pub without_info: usize,
    pub unreachable: usize,
    pub unclassified: usize,
    pub malformed: usize,
}

impl Tally {
    pub fn count(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Plaintext(_) => self.plaintext += 1,
            Outcome::RedirectsSecurely => self.secure += 1,
            Outcome::RedirectsWeakly(_) => self.weak += 1,
            Outcome::RedirectsWithoutInfo(_) => self.without_info += 1,
            Outcome::Unreachable(..) => self.unreachable += 1,
            Outcome::Unclassified(_) => self.unclassified += 1,
        }
    }

    /// Targets that produced a CSV row.
    pub fn targets(&self) -> usize {
        self.plaintext + self.secure + self.weak + self.without_info + self.unreachable + self.unclassified
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hosts tested: {} plaintext, {} redirecting securely, {} redirecting weakly, {} redirecting without info, {} unexpected status, {} unreachable; {} malformed lines skipped",
            self.targets(),
            self.plaintext,
            self.secure,
            self.weak,
            self.without_info,
            self.unclassified,
            self.unreachable,
            self.malformed,
        )
    }
}
