use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// Upper bound on samples a single range token may expand to.
const MAX_RANGE_SAMPLES: usize = 100_000;

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct SampleRead {
    pub(crate) samples: Vec<f64>,
    pub(crate) warnings: Vec<String>,
}

impl SampleRead {
    pub(crate) fn extend(&mut self, other: SampleRead) {
        self.samples.extend(other.samples);
        self.warnings.extend(other.warnings);
    }
}

pub(crate) fn read_sample_source(path: &Path) -> Result<SampleRead> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed reading samples from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed reading samples from {}", path.display()))?
    };
    Ok(parse_samples(&raw))
}

/// Parses playback positions in seconds.
///
/// Tokens are separated by whitespace or commas and `#` starts a comment.
/// `a..b` expands at one-second cadence, `a..b:step` at `step`.
pub(crate) fn parse_samples(raw: &str) -> SampleRead {
    let mut out = SampleRead::default();
    for (line_no, line) in raw.lines().enumerate() {
        let content = line.split('#').next().unwrap_or_default();
        for token in content
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
        {
            match parse_token(token) {
                Ok(values) => out.samples.extend(values),
                Err(reason) => out.warnings.push(format!(
                    "skipped sample `{token}` on line {}: {reason}",
                    line_no + 1
                )),
            }
        }
    }
    out
}

fn parse_token(token: &str) -> Result<Vec<f64>, String> {
    let Some((from, rest)) = token.split_once("..") else {
        return parse_seconds(token).map(|value| vec![value]);
    };
    let (to, step) = match rest.split_once(':') {
        Some((to, step)) => (to, parse_seconds(step)?),
        None => (rest, 1.0),
    };
    let from = parse_seconds(from)?;
    let to = parse_seconds(to)?;
    expand_range(from, to, step)
}

fn parse_seconds(raw: &str) -> Result<f64, String> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| "not a number".to_string())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err("not a finite number".to_string())
    }
}

fn expand_range(from: f64, to: f64, step: f64) -> Result<Vec<f64>, String> {
    if step <= 0.0 {
        return Err("range step must be positive".to_string());
    }
    if to < from {
        return Err("range end is before its start".to_string());
    }
    let steps = ((to - from) / step).floor();
    if steps >= MAX_RANGE_SAMPLES as f64 {
        return Err(format!("range expands to more than {MAX_RANGE_SAMPLES} samples"));
    }
    let count = steps as usize + 1;
    Ok((0..count).map(|idx| from + idx as f64 * step).collect())
}
