//! Line-oriented `host:port` target list.

use crate::Target;
use std::io::BufRead;
use thiserror::Error;

/// Why a single input line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LineFault {
    #[error("missing ':' between host and port")]
    MissingColon,
    #[error("more than one ':' (wrap IPv6 hosts in brackets)")]
    ExtraColon,
    #[error("empty host")]
    EmptyHost,
    #[error("empty port")]
    EmptyPort,
    #[error("port is not a number in 1-65535")]
    BadPort,
    #[error("line is not valid UTF-8")]
    NotUtf8,
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("line {line_no}: malformed target {line:?}: {fault}")]
    Malformed { line_no: usize, line: String, fault: LineFault },
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse one `host:port` (or `[v6]:port`) line. Surrounding whitespace on
/// either field is ignored.
pub fn parse_target(line: &str) -> Result<Target, LineFault> {
    let line = line.trim();
    let (host, port) = if let Some(rest) = line.strip_prefix('[') {
        let (host, port) = rest.split_once("]:").ok_or(LineFault::MissingColon)?;
        (host.trim(), port.trim())
    } else {
        let (host, port) = line.split_once(':').ok_or(LineFault::MissingColon)?;
        if port.contains(':') {
            return Err(LineFault::ExtraColon);
        }
        (host.trim(), port.trim())
    };
    if host.is_empty() {
        return Err(LineFault::EmptyHost);
    }
    if port.is_empty() {
        return Err(LineFault::EmptyPort);
    }
    let port: u16 = port.parse().map_err(|_| LineFault::BadPort)?;
    if port == 0 {
        return Err(LineFault::BadPort);
    }
    Ok(Target::new(host, port))
}

/// Lazily yields one item per non-blank, non-comment line. Malformed lines,
/// including ones that are not UTF-8, come back as `InputError::Malformed`
/// and iteration carries on; an I/O error ends the sequence.
pub struct TargetReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> TargetReader<R> {
    pub fn new(reader: R) -> Self {
        TargetReader { reader, buf: Vec::new(), line_no: 0, done: false }
    }
}

impl<R: BufRead> Iterator for TargetReader<R> {
    type Item = Result<Target, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
            self.line_no += 1;
            let line_no = self.line_no;
            let line = match std::str::from_utf8(&self.buf) {
                Ok(l) => l,
                Err(_) => {
                    let lossy = String::from_utf8_lossy(&self.buf);
                    let trimmed = lossy.trim();
                    if trimmed.starts_with('#') {
                        continue;
                    }
                    return Some(Err(InputError::Malformed {
                        line_no,
                        line: trimmed.to_string(),
                        fault: LineFault::NotUtf8,
                    }));
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(parse_target(trimmed).map_err(|fault| InputError::Malformed {
                line_no,
                line: trimmed.to_string(),
                fault,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_host_port_with_whitespace() {
        let t = parse_target("  intranet.local : 8080 ").unwrap();
        assert_eq!(t, Target::new("intranet.local", 8080));
    }

    #[test]
    fn parses_bracketed_ipv6() {
        let t = parse_target("[fe80::1]:80").unwrap();
        assert_eq!(t.host, "fe80::1");
        assert_eq!(t.port, 80);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_target("10.0.0.1"), Err(LineFault::MissingColon));
        assert_eq!(parse_target(" :80"), Err(LineFault::EmptyHost));
        assert_eq!(parse_target("10.0.0.1: "), Err(LineFault::EmptyPort));
        assert_eq!(parse_target("10.0.0.1:http"), Err(LineFault::BadPort));
        assert_eq!(parse_target("10.0.0.1:0"), Err(LineFault::BadPort));
        assert_eq!(parse_target("10.0.0.1:70000"), Err(LineFault::BadPort));
        assert_eq!(parse_target("fe80::1:80"), Err(LineFault::ExtraColon));
    }

    #[test]
    fn reader_keeps_going_after_malformed_line() {
        let input = "10.0.0.1:80\nbroken\n\n# comment\n10.0.0.2:8080\n";
        let items: Vec<_> = TargetReader::new(Cursor::new(input)).collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), &Target::new("10.0.0.1", 80));
        match &items[1] {
            Err(InputError::Malformed { line_no, line, fault }) => {
                assert_eq!(*line_no, 2);
                assert_eq!(line, "broken");
                assert_eq!(*fault, LineFault::MissingColon);
            }
            other => panic!("unexpected item: {:?}", other),
        }
        assert_eq!(items[2].as_ref().unwrap(), &Target::new("10.0.0.2", 8080));
    }

    #[test]
    fn reader_handles_crlf_input() {
        let input = "a.example:80\r\nb.example:81\r\n";
        let targets: Vec<_> = TargetReader::new(Cursor::new(input)).map(|r| r.unwrap()).collect();
        assert_eq!(targets, vec![Target::new("a.example", 80), Target::new("b.example", 81)]);
    }

    #[test]
    fn non_utf8_line_is_skipped_not_fatal() {
        let input: &[u8] = b"a.example:80\nbad\xff:80\n# caf\xe9\nb.example:81\n";
        let items: Vec<_> = TargetReader::new(input).collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), &Target::new("a.example", 80));
        match &items[1] {
            Err(InputError::Malformed { line_no, line, fault }) => {
                assert_eq!(*line_no, 2);
                assert_eq!(line, "bad\u{FFFD}:80");
                assert_eq!(*fault, LineFault::NotUtf8);
            }
            other => panic!("unexpected item: {:?}", other),
        }
        assert_eq!(items[2].as_ref().unwrap(), &Target::new("b.example", 81));
    }
}
