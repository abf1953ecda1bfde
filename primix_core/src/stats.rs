//! Statistical harness over engine output.
//!
//! Treats the stream as an opaque `&[u64]`: bucket distribution with a
//! chi-square statistic, per-bit set counts, a 2x2 bit-transition matrix
//! with its entropy, and normalised successive differences.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{TEST_BUCKETS, TEST_SEQUENCE_LENGTH, WORD_BITS};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub chi_square: f64,
    pub bit_entropy: f64,
    pub generation_time: f64,
    pub numbers_per_second: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub rng: String,
    pub distribution: Vec<u64>,
    pub bit_counts: Vec<u64>,
    pub transition_matrix: [[u64; 2]; 2],
    pub metrics: Metrics,
    /// BLAKE3 of the little-endian output stream, for comparing runs.
    pub stream_digest: String,
    #[serde(skip)]
    pub sequence_correlation: Vec<f64>,
}

impl StatsReport {
    pub fn analyze(rng: &str, values: &[u64], elapsed: Duration) -> Self {
        let distribution = distribution(values, TEST_BUCKETS);
        let chi_square = chi_square(&distribution, values.len());
        let bits = bit_analysis(values);
        let secs = elapsed.as_secs_f64();
        let numbers_per_second = if secs > 0.0 {
            (values.len() as f64 / secs) as u64
        } else {
            0
        };
        Self {
            rng: rng.to_string(),
            distribution,
            bit_counts: bits.bit_counts.to_vec(),
            transition_matrix: bits.transition_matrix,
            metrics: Metrics {
                chi_square,
                bit_entropy: bits.bit_entropy,
                generation_time: secs,
                numbers_per_second,
            },
            stream_digest: stream_digest(values),
            sequence_correlation: sequence_analysis(values, TEST_SEQUENCE_LENGTH),
        }
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BitAnalysis {
    pub bit_counts: [u64; 64],
    /// `[previous bit][current bit]`, summed over all 64 positions.
    pub transition_matrix: [[u64; 2]; 2],
    pub bit_entropy: f64,
}

pub fn distribution(values: &[u64], buckets: usize) -> Vec<u64> {
    let mut counts = vec![0u64; buckets.max(1)];
    let width = counts.len() as u64;
    for &v in values {
        counts[(v % width) as usize] += 1;
    }
    counts
}

pub fn chi_square(counts: &[u64], total: usize) -> f64 {
    if counts.is_empty() || total == 0 {
        return 0.0;
    }
    let expected = total as f64 / counts.len() as f64;
    counts
        .iter()
        .map(|&c| {
            let diff = c as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

pub fn bit_analysis(values: &[u64]) -> BitAnalysis {
    let mut bit_counts = [0u64; 64];
    let mut transition_matrix = [[0u64; 2]; 2];
    let mut prev: Option<u64> = None;
    for &value in values {
        for bit in 0..WORD_BITS {
            let curr = ((value >> bit) & 1) as usize;
            bit_counts[bit as usize] += curr as u64;
            if let Some(p) = prev {
                transition_matrix[((p >> bit) & 1) as usize][curr] += 1;
            }
        }
        prev = Some(value);
    }

    let total: u64 = transition_matrix.iter().flatten().sum();
    let bit_entropy = if total == 0 {
        0.0
    } else {
        transition_matrix
            .iter()
            .flatten()
            .filter(|&&n| n > 0)
            .map(|&n| {
                let p = n as f64 / total as f64;
                -p * p.log2()
            })
            .sum()
    };
    BitAnalysis {
        bit_counts,
        transition_matrix,
        bit_entropy,
    }
}

/// Differences of successive values normalised to `[0, 1]`; entry 0 is 0.
pub fn sequence_analysis(values: &[u64], window: usize) -> Vec<f64> {
    let mut out = vec![0.0; window];
    for i in 1..window.min(values.len()) {
        let prev = values[i - 1] as f64 / u64::MAX as f64;
        let curr = values[i] as f64 / u64::MAX as f64;
        out[i] = prev - curr;
    }
    out
}

pub fn stream_digest(values: &[u64]) -> String {
    let mut hasher = Hasher::new();
    for v in values {
        hasher.update(&v.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Collects `count` outputs and the time spent producing them.
pub fn timed_samples<E>(
    count: usize,
    mut next: impl FnMut() -> Result<u64, E>,
) -> Result<(Vec<u64>, Duration), E> {
    let mut values = Vec::with_capacity(count);
    let start = Instant::now();
    for _ in 0..count {
        values.push(next()?);
    }
    Ok((values, start.elapsed()))
}
