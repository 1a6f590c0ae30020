use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use httpget_core::{Hop, InputError, MissingInfo, Outcome, PlaintextVia, ProbeResult, Target, TargetReader, WeakReason};
use plaintext_check::{Classifier, Fetch};
use results_files::{ReportFiles, Tally};
use std::future::Future;
use std::io::BufRead;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    Completed(Tally),
    /// `shutdown` fired before the input was exhausted.
    Interrupted(Tally),
}

/// Classify every target from `reader` and record it in `report`, in input
/// order. Up to `concurrency` targets are in flight at once. Once `shutdown`
/// resolves no further results are recorded; the sinks are flushed either way.
pub async fn run_audit<R, F, S>(
    reader: TargetReader<R>,
    classifier: &Classifier<F>,
    mut report: ReportFiles,
    concurrency: usize,
    shutdown: S,
) -> Result<Finish>
where
    R: BufRead,
    F: Fetch,
    S: Future<Output = ()>,
{
    let work = stream::iter(reader)
        .map(|item| async move {
            let target = item?;
            let (outcome, result) = classifier.classify(&target).await;
            Ok::<_, InputError>((target, outcome, result))
        })
        .buffered(concurrency.max(1));
    let mut work = std::pin::pin!(work);
    let mut shutdown = std::pin::pin!(shutdown);

    let mut read_error = None;
    let interrupted = loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break true,
            next = work.next() => match next {
                None => break false,
                Some(Ok((target, outcome, result))) => {
                    announce(&target, &outcome, &result);
                    report.record(&target, &outcome, &result)?;
                }
                Some(Err(InputError::Io(e))) => {
                    read_error = Some(e);
                    break false;
                }
                Some(Err(malformed)) => {
                    warn!("{}", malformed);
                    report.record_malformed(&malformed)?;
                }
            },
        }
    };

    let tally = report.finish()?;
    if let Some(e) = read_error {
        return Err(e).context("failed reading input");
    }
    Ok(if interrupted { Finish::Interrupted(tally) } else { Finish::Completed(tally) })
}

fn announce(target: &Target, outcome: &Outcome, result: &ProbeResult) {
    let status = result.status_code.unwrap_or_default();
    let location = result.redirect_location.as_deref().unwrap_or_default();
    debug!(service = %target, outcome = outcome.label(), "classified");
    match outcome {
        Outcome::Plaintext(PlaintextVia::Direct) => info!(service = %target, "Web Server is plaintext"),
        Outcome::Plaintext(PlaintextVia::Redirect) => {
            info!(service = %target, "Webserver redirects to: {} - redirect is plaintext", location)
        }
        Outcome::RedirectsSecurely => {
            info!(service = %target, "Webserver is Redirecting to https and includes HSTS declaration")
        }
        Outcome::RedirectsWeakly(WeakReason::MaxAgeTooLow(age)) => warn!(
            service = %target,
            "Webserver is Redirecting to https and includes HSTS declaration but max-age value {} is too low", age
        ),
        Outcome::RedirectsWeakly(WeakReason::UnparseableHsts) => {
            warn!(service = %target, "Webserver is Redirecting to https but its HSTS declaration cannot be parsed")
        }
        Outcome::RedirectsWithoutInfo(MissingInfo::NoHsts) => warn!(
            service = %target,
            "Webserver utilises a {} redirect to HTTPS, but HSTS declaration is not present.", status
        ),
        Outcome::RedirectsWithoutInfo(MissingInfo::NoLocation) => {
            warn!(service = %target, "Web server responded with a {} and did not specify a redirect", status)
        }
        Outcome::Unclassified(code) => warn!(service = %target, "Web server responded with an unexpected {} status code", code),
        Outcome::Unreachable(Hop::Initial, kind) => error!(service = %target, "Could not connect to Webserver: {}", kind),
        Outcome::Unreachable(Hop::HstsCheck, kind) => error!(
            service = %target,
            "Could not follow redirect to {} for HSTS validation: {}", location, kind
        ),
    }
}
