//! Log sanitization for credentials and doctor identity.
//!
//! The client handles bearer tokens, passwords, email addresses and medical
//! license numbers. None of them may reach a log file. Types carrying them
//! already redact their `Debug` output; this module is the second line: every
//! formatted log line passes through [`sanitize`] before it is written.
//!
//! Input is capped (see `CANCERAI_SANITIZE_MAX_BYTES`) so a runaway log line
//! cannot stall the writer.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Rules {
    set: RegexSet,
    rules: Vec<Rule>,
}

static RULES: OnceLock<Rules> = OnceLock::new();

// Order matters: header and JSON-field rules run before the generic JWT and
// email rules so the more specific label wins.
const PATTERNS: &[(&str, &str)] = &[
    (r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]+", "Bearer [REDACTED-TOKEN]"),
    (
        r#"(?i)"(access_token|token|password)"\s*:\s*"[^"]*""#,
        r#""$1":"[REDACTED]""#,
    ),
    (
        r#"(?i)"license_number"\s*:\s*"[^"]*""#,
        r#""license_number":"[REDACTED-LICENSE]""#,
    ),
    (
        r"(?i)\b(password|passwd|pwd)\s*[:=]\s*\S+",
        "$1=[REDACTED]",
    ),
    (
        r"\beyJ[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]{5,}\.[A-Za-z0-9_-]+",
        "[REDACTED-JWT]",
    ),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
];

fn rules() -> &'static Rules {
    RULES.get_or_init(|| {
        let set = RegexSet::new(PATTERNS.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = PATTERNS
            .iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();
        Rules { set, rules }
    })
}

fn max_sanitize_bytes() -> usize {
    std::env::var("CANCERAI_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn truncate_at_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact secrets and identity from a string.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let rules = rules();
    let (prefix, truncated) = truncate_at_boundary(input, max_bytes);

    let mut out = prefix.to_string();
    // Rules are re-checked against the running output: an earlier
    // replacement can consume what a later rule would have matched.
    for idx in rules.set.matches(prefix).into_iter() {
        let rule = &rules.rules[idx];
        if rule.regex.is_match(&out) {
            out = rule.regex.replace_all(&out, rule.replacement).into_owned();
        }
    }

    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// Whether a string contains anything [`sanitize`] would redact.
#[must_use]
pub fn contains_secret(input: &str) -> bool {
    let (prefix, _) = truncate_at_boundary(input, max_sanitize_bytes());
    rules().set.is_match(prefix)
}

/// `MakeWriter` wrapper that sanitizes each formatted log line.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn emit_complete_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let clean = sanitize(&String::from_utf8_lossy(&line));
            self.inner.write_all(clean.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        if self.buffer.len() > max_sanitize_bytes().saturating_mul(2) {
            let clean = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(clean.as_bytes())?;
            self.inner.write_all(b"\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.emit_complete_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.emit_complete_lines()?;
        if !self.buffer.is_empty() {
            let clean = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(clean.as_bytes())?;
            self.buffer.clear();
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
        }
    }
}
