use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use regex::Regex;

use crate::error::Error;

/// Text translation collaborator. Implementations may fail; callers fall back
/// to the untranslated text.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, src: &str, dst: &str) -> Result<String, Error>;
}

/// Returns text unchanged.
pub struct Passthrough;

impl Translator for Passthrough {
    fn translate(&self, text: &str, _src: &str, _dst: &str) -> Result<String, Error> {
        Ok(text.to_string())
    }
}

/// Pipes text through an external program's stdin and reads the translation
/// from its stdout. `{src}` and `{dst}` in arguments are replaced with the
/// language codes.
pub struct CommandTranslator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTranslator {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Parse a whitespace-separated command line such as `trans -b {src}:{dst}`.
    pub fn from_command_line(line: &str, timeout: Duration) -> Option<Self> {
        let mut parts = line.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect(), timeout))
    }
}

impl Translator for CommandTranslator {
    fn translate(&self, text: &str, src: &str, dst: &str) -> Result<String, Error> {
        let service = |msg: String| Error::ExternalService(format!("{}: {msg}", self.program));
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{src}", src).replace("{dst}", dst))
            .collect();

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| service(e.to_string()))?;

        // Both pipes are serviced off this thread so the deadline below bounds
        // the whole call; killing the child unblocks them.
        let stdout = child.stdout.take();
        let reader = std::thread::spawn(move || {
            let mut out = String::new();
            if let Some(mut pipe) = stdout {
                let _ = pipe.read_to_string(&mut out);
            }
            out
        });
        let stdin = child.stdin.take();
        let input = text.to_string();
        let writer = std::thread::spawn(move || match stdin {
            Some(mut pipe) => pipe.write_all(input.as_bytes()),
            None => Ok(()),
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(service(format!("timed out after {:?}", self.timeout)));
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(10)),
                Err(e) => return Err(service(e.to_string())),
            }
        };

        let written = writer
            .join()
            .map_err(|_| service("input writer panicked".into()))?;
        let out = reader
            .join()
            .map_err(|_| service("output reader panicked".into()))?;
        if !status.success() {
            return Err(service(format!("exited with {status}")));
        }
        written.map_err(|e| service(format!("writing input: {e}")))?;
        let translated = out.trim();
        if translated.is_empty() {
            return Err(service("empty translation".into()));
        }
        Ok(translated.to_string())
    }
}

/// Rewrites dollar amounts as euro amounts: `$12.50`, `12.50 USD` and
/// `12.50 $` all become `"<amount × rate> €"` with two decimals.
pub struct CurrencyNormalizer {
    rate: f64,
    patterns: Vec<Regex>,
}

const DOLLAR_PATTERNS: &[&str] = &[
    r"\$\s?(\d+(?:\.\d{1,2})?)",
    r"(\d+(?:\.\d{1,2})?)\s?USD\b",
    r"(\d+(?:\.\d{1,2})?)\s?\$",
];

impl CurrencyNormalizer {
    pub fn new(rate: f64) -> Self {
        let patterns = DOLLAR_PATTERNS
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("currency pattern {p:?} rejected: {e}");
                    None
                }
            })
            .collect();
        Self { rate, patterns }
    }

    pub fn normalize(&self, text: &str) -> String {
        let mut out = text.to_string();
        for re in &self.patterns {
            out = re
                .replace_all(&out, |caps: &regex::Captures| match caps[1].parse::<f64>() {
                    Ok(usd) => format!("{:.2} €", usd * self.rate),
                    Err(_) => caps[0].to_string(),
                })
                .into_owned();
        }
        out
    }
}
