//! Decide whether an HTTP service is really plaintext or upgrades to https
//! with adequate HSTS.

mod classify;
mod fetch;
pub mod hsts;

pub use classify::{judge_hsts, triage, Classifier, Triage};
pub use fetch::{Fetch, FetchOptions, HttpFetcher, Reply, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_MS};
pub use hsts::{parse_max_age, HstsError, MIN_SECURE_MAX_AGE};
