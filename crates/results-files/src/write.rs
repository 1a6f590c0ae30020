use crate::{LogRow, ReportFiles, Tally};
use anyhow::Result;
use httpget_core::{Hop, InputError, MissingInfo, Outcome, ProbeResult, Target, WeakReason};
use std::io::Write;

fn crlf(w: &mut impl Write, text: &str) -> std::io::Result<()> {
    w.write_all(text.as_bytes())?;
    w.write_all(b"\r\n")
}

impl ReportFiles {
    /// Append one classified target: a CSV row always, plus a line in the
    /// sink its outcome belongs to.
    pub fn record(&mut self, target: &Target, outcome: &Outcome, result: &ProbeResult) -> Result<()> {
        let status = result.status_code.map(|s| s.to_string()).unwrap_or_default();
        match outcome {
            Outcome::Plaintext(_) => crlf(&mut self.plaintext, &target.to_string())?,
            Outcome::RedirectsSecurely => crlf(&mut self.redirecting, &target.to_string())?,
            Outcome::RedirectsWeakly(WeakReason::MaxAgeTooLow(_)) => {
                let raw = result.hsts.as_ref().map(|h| h.raw.as_str()).unwrap_or_default();
                crlf(
                    &mut self.warnings,
                    &format!(
                        "[!] Webserver {} is using a {} redirect, but the HSTS header on the redirect is set with a value of {} which is too low.",
                        target, status, raw
                    ),
                )?
            }
            Outcome::RedirectsWeakly(WeakReason::UnparseableHsts) => {
                let raw = result.hsts.as_ref().map(|h| h.raw.as_str()).unwrap_or_default();
                crlf(
                    &mut self.warnings,
                    &format!(
                        "[!] Webserver {} is using a {} redirect, but the HSTS header on the redirect could not be parsed: {}",
                        target, status, raw
                    ),
                )?
            }
            Outcome::RedirectsWithoutInfo(MissingInfo::NoHsts) => crlf(
                &mut self.warnings,
                &format!(
                    "[!] Webserver {} is using a {} redirect, but the HSTS header on the redirect is not set.",
                    target, status
                ),
            )?,
            Outcome::RedirectsWithoutInfo(MissingInfo::NoLocation) => crlf(
                &mut self.warnings,
                &format!("[!] Webserver {} responded with a {} and did not specify a redirect", target, status),
            )?,
            Outcome::Unclassified(code) => crlf(
                &mut self.warnings,
                &format!("[!] Webserver {} responded with an unexpected {} status code", target, code),
            )?,
            Outcome::Unreachable(Hop::Initial, kind) => crlf(
                &mut self.errors,
                &format!("[x] Could not connect to Webserver: {} - {}", target, kind),
            )?,
            Outcome::Unreachable(Hop::HstsCheck, kind) => crlf(
                &mut self.errors,
                &format!(
                    "[x] Could not connect to Webserver: {} - {} (HSTS validation of redirect to {} failed)",
                    target,
                    kind,
                    result.redirect_location.as_deref().unwrap_or_default()
                ),
            )?,
        }
        self.log.serialize(LogRow::new(target, outcome, result))?;
        self.tally.count(outcome);
        Ok(())
    }

    /// Note an input line that could not be turned into a target. No CSV row.
    pub fn record_malformed(&mut self, err: &InputError) -> Result<()> {
        crlf(&mut self.errors, &format!("[x] Skipped input {}", err))?;
        self.tally.malformed += 1;
        Ok(())
    }

    /// Flush every sink and hand back the final counts. Files close on drop.
    pub fn finish(mut self) -> Result<Tally> {
        self.plaintext.flush()?;
        self.redirecting.flush()?;
        self.errors.flush()?;
        self.warnings.flush()?;
        self.log.flush()?;
        Ok(self.tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CSV_LOG, ERROR_LOG, PLAINTEXT_LIST, REDIRECT_LIST, WARNINGS_LOG};
    use httpget_core::{ErrorKind, HstsHeader, LineFault, PlaintextVia};
    use std::fs;
    use tempfile::TempDir;

    fn read(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap()
    }

    fn status(code: u16) -> ProbeResult {
        ProbeResult { status_code: Some(code), ..Default::default() }
    }

    fn https_redirect(code: u16, hsts: Option<(&str, Option<u64>)>) -> ProbeResult {
        ProbeResult {
            status_code: Some(code),
            redirect_location: Some("https://x/".into()),
            hsts: hsts.map(|(raw, max_age)| HstsHeader { raw: raw.into(), max_age }),
            error: None,
        }
    }

    #[test]
    fn each_outcome_lands_in_its_sink() {
        let dir = TempDir::new().unwrap();
        let mut files = ReportFiles::open_or_create(dir.path()).unwrap();
        let a = Target::new("10.0.0.1", 80);
        let b = Target::new("10.0.0.2", 8080);
        let c = Target::new("10.0.0.3", 80);
        let d = Target::new("10.0.0.4", 80);
        files.record(&a, &Outcome::Plaintext(PlaintextVia::Direct), &status(200)).unwrap();
        files
            .record(&b, &Outcome::RedirectsSecurely, &https_redirect(301, Some(("max-age=31536000", Some(31_536_000)))))
            .unwrap();
        files
            .record(
                &c,
                &Outcome::RedirectsWeakly(WeakReason::MaxAgeTooLow(3600)),
                &https_redirect(302, Some(("max-age=3600", Some(3600)))),
            )
            .unwrap();
        files
            .record(&d, &Outcome::Unreachable(Hop::Initial, ErrorKind::Timeout), &ProbeResult::failed(ErrorKind::Timeout))
            .unwrap();
        let tally = files.finish().unwrap();
        assert_eq!(tally.targets(), 4);

        assert_eq!(read(&dir, PLAINTEXT_LIST), "10.0.0.1:80\r\n");
        assert_eq!(read(&dir, REDIRECT_LIST), "10.0.0.2:8080\r\n");
        assert_eq!(
            read(&dir, WARNINGS_LOG),
            "[!] Webserver 10.0.0.3:80 is using a 302 redirect, but the HSTS header on the redirect is set with a value of max-age=3600 which is too low.\r\n"
        );
        assert_eq!(read(&dir, ERROR_LOG), "[x] Could not connect to Webserver: 10.0.0.4:80 - Timed Out\r\n");
        assert_eq!(
            read(&dir, CSV_LOG),
            "10.0.0.1:80,200,n,,\r\n\
             10.0.0.2:8080,301,y,https://x/,max-age=31536000\r\n\
             10.0.0.3:80,302,y,https://x/,max-age=3600\r\n\
             10.0.0.4:80,,n,,\r\n"
        );
    }

    #[test]
    fn warnings_and_failed_second_hop() {
        let dir = TempDir::new().unwrap();
        let mut files = ReportFiles::open_or_create(dir.path()).unwrap();
        let t = Target::new("web.local", 80);
        files.record(&t, &Outcome::RedirectsWithoutInfo(MissingInfo::NoLocation), &status(302)).unwrap();
        files.record(&t, &Outcome::Unclassified(404), &status(404)).unwrap();
        files
            .record(&t, &Outcome::RedirectsWithoutInfo(MissingInfo::NoHsts), &https_redirect(307, None))
            .unwrap();
        let mut failed = https_redirect(301, None);
        failed.error = Some(ErrorKind::Tls);
        files.record(&t, &Outcome::Unreachable(Hop::HstsCheck, ErrorKind::Tls), &failed).unwrap();
        files.finish().unwrap();

        let warnings = read(&dir, WARNINGS_LOG);
        let lines: Vec<_> = warnings.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("responded with a 302 and did not specify a redirect"));
        assert!(lines[1].contains("unexpected 404 status code"));
        assert!(lines[2].ends_with("the HSTS header on the redirect is not set."));
        assert!(read(&dir, ERROR_LOG).contains("SSL Error (HSTS validation of redirect to https://x/ failed)"));
        assert!(read(&dir, PLAINTEXT_LIST).is_empty());
        assert!(read(&dir, REDIRECT_LIST).is_empty());
        assert_eq!(
            read(&dir, CSV_LOG),
            "web.local:80,302,n,,\r\n\
             web.local:80,404,n,,\r\n\
             web.local:80,307,y,https://x/,not set\r\n\
             web.local:80,301,y,https://x/,\r\n"
        );
    }

    #[test]
    fn malformed_lines_go_to_error_log_only() {
        let dir = TempDir::new().unwrap();
        let mut files = ReportFiles::open_or_create(dir.path()).unwrap();
        let err = InputError::Malformed { line_no: 3, line: "nocolon".into(), fault: LineFault::MissingColon };
        files.record_malformed(&err).unwrap();
        let tally = files.finish().unwrap();
        assert_eq!(tally.malformed, 1);
        assert_eq!(tally.targets(), 0);
        assert!(read(&dir, ERROR_LOG).starts_with("[x] Skipped input line 3: malformed target \"nocolon\""));
        assert!(read(&dir, CSV_LOG).is_empty());
    }

    #[test]
    fn reopening_truncates_previous_run() {
        let dir = TempDir::new().unwrap();
        let mut files = ReportFiles::open_or_create(dir.path()).unwrap();
        files
            .record(&Target::new("a", 1), &Outcome::Plaintext(PlaintextVia::Direct), &status(200))
            .unwrap();
        files.finish().unwrap();
        ReportFiles::open_or_create(dir.path()).unwrap().finish().unwrap();
        assert!(read(&dir, PLAINTEXT_LIST).is_empty());
        assert!(read(&dir, CSV_LOG).is_empty());
    }
}
