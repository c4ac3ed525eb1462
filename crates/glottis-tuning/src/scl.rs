//! Scala scale files (`.scl`).
//!
//! ```text
//! ! comment lines start with '!'
//! Just major                  <- description
//!  7                          <- number of degrees
//!  9/8                        <- ratio
//!  386.31371                  <- cents (has a decimal point)
//!  4/3
//!  3/2
//!  5/3
//!  15/8
//!  2                          <- bare integer, same as 2/1
//! ```
//!
//! Only the first whitespace-delimited token of a degree line is read;
//! anything after it is a label. The 1/1 degree is implicit and never
//! stored.
//!
//! In [`ParseMode::Strict`] an unrecognized degree is an error, a blank
//! line after at least one degree ends the file, and the number of degrees
//! must match the count line. [`ParseMode::Lenient`] skips lines it cannot
//! use and does not check the count.

use std::fmt;
use std::path::Path;

use crate::error::{Result, TuningError};

/// How forgiving the parser is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParseMode {
    /// Reject anything outside the format.
    #[default]
    Strict,
    /// Skip what cannot be used.
    Lenient,
}

/// One scale degree relative to 1/1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleDegree {
    /// Integer frequency ratio.
    Ratio {
        /// Numerator, non-zero.
        numerator: u64,
        /// Denominator, non-zero.
        denominator: u64,
    },
    /// Interval in cents.
    Cents(f64),
}

impl ScaleDegree {
    /// Ratio degree `numerator/denominator`.
    pub fn ratio_of(numerator: u64, denominator: u64) -> Self {
        ScaleDegree::Ratio { numerator, denominator }
    }

    /// Frequency ratio.
    pub fn ratio(&self) -> f64 {
        match *self {
            ScaleDegree::Ratio { numerator, denominator } => numerator as f64 / denominator as f64,
            ScaleDegree::Cents(cents) => 2f64.powf(cents / 1200.0),
        }
    }

    /// Interval in cents.
    pub fn cents(&self) -> f64 {
        match *self {
            ScaleDegree::Ratio { .. } => 1200.0 * self.ratio().log2(),
            ScaleDegree::Cents(cents) => cents,
        }
    }
}

impl fmt::Display for ScaleDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ScaleDegree::Ratio { numerator, denominator } => write!(f, "{numerator}/{denominator}"),
            ScaleDegree::Cents(cents) => write!(f, "{cents:.5}"),
        }
    }
}

enum Entry {
    Degree(ScaleDegree),
    Invalid(&'static str),
    Unrecognized,
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn classify(entry: &str) -> Entry {
    if let Some((num, den)) = entry.split_once('/') {
        if !all_digits(num) || !all_digits(den) {
            return Entry::Unrecognized;
        }
        return match (num.parse::<u64>(), den.parse::<u64>()) {
            (Ok(_), Ok(0)) => Entry::Invalid("zero denominator"),
            (Ok(0), Ok(_)) => Entry::Invalid("zero numerator"),
            (Ok(n), Ok(d)) => Entry::Degree(ScaleDegree::ratio_of(n, d)),
            _ => Entry::Invalid("value out of range"),
        };
    }

    if entry.contains('.') {
        let unsigned = entry.strip_prefix(['-', '+']).unwrap_or(entry);
        let Some((whole, frac)) = unsigned.split_once('.') else {
            return Entry::Unrecognized;
        };
        let digits_ok =
            (whole.is_empty() || all_digits(whole)) && (frac.is_empty() || all_digits(frac));
        if !digits_ok || (whole.is_empty() && frac.is_empty()) {
            return Entry::Unrecognized;
        }
        return match entry.parse::<f64>() {
            Ok(cents) if cents.is_finite() => Entry::Degree(ScaleDegree::Cents(cents)),
            _ => Entry::Invalid("cents value is not finite"),
        };
    }

    if all_digits(entry) {
        return match entry.parse::<u64>() {
            Ok(0) => Entry::Invalid("zero ratio"),
            Ok(n) => Entry::Degree(ScaleDegree::ratio_of(n, 1)),
            Err(_) => Entry::Invalid("value out of range"),
        };
    }

    Entry::Unrecognized
}

/// A parsed scale. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Scale {
    description: String,
    degrees: Vec<ScaleDegree>,
    declared_count: usize,
}

impl Scale {
    /// Build a scale directly from its explicit degrees.
    pub fn from_degrees(description: impl Into<String>, degrees: Vec<ScaleDegree>) -> Self {
        let declared_count = degrees.len();
        Self {
            description: description.into(),
            degrees,
            declared_count,
        }
    }

    /// `steps`-tone equal temperament with a 2/1 period.
    pub fn equal_temperament(steps: usize) -> Self {
        let steps = steps.max(1);
        let degrees = (1..=steps)
            .map(|i| {
                if i == steps {
                    ScaleDegree::ratio_of(2, 1)
                } else {
                    ScaleDegree::Cents(1200.0 * i as f64 / steps as f64)
                }
            })
            .collect();
        Self::from_degrees(format!("{steps}-tone equal temperament"), degrees)
    }

    /// Parse `.scl` text.
    pub fn parse(text: &str, mode: ParseMode) -> Result<Self> {
        let mut description: Option<String> = None;
        let mut declared: Option<usize> = None;
        let mut degrees = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end();
            let content = line.trim_start();

            if content.starts_with('!') {
                continue;
            }
            if content.is_empty() {
                if mode == ParseMode::Strict && declared.is_some() && !degrees.is_empty() {
                    break;
                }
                continue;
            }

            let entry = content.split_whitespace().next().unwrap_or(content);

            if description.is_none() {
                description = Some(content.to_string());
                continue;
            }
            if declared.is_none() {
                let count = entry.parse::<usize>().map_err(|_| TuningError::InvalidCount {
                    line: line_no,
                    value: entry.to_string(),
                })?;
                declared = Some(count);
                continue;
            }

            match classify(entry) {
                Entry::Degree(degree) => degrees.push(degree),
                Entry::Invalid(reason) if mode == ParseMode::Strict => {
                    return Err(TuningError::InvalidDegree {
                        line: line_no,
                        entry: entry.to_string(),
                        reason,
                    });
                }
                Entry::Unrecognized if mode == ParseMode::Strict => {
                    return Err(TuningError::UnrecognizedDegree {
                        line: line_no,
                        entry: entry.to_string(),
                    });
                }
                Entry::Invalid(_) | Entry::Unrecognized => {}
            }
        }

        let (Some(description), Some(declared_count)) = (description, declared) else {
            return Err(TuningError::MissingHeader);
        };

        if mode == ParseMode::Strict && degrees.len() != declared_count {
            return Err(TuningError::CountMismatch {
                expected: declared_count + 1,
                actual: degrees.len() + 1,
            });
        }

        Ok(Self {
            description,
            degrees,
            declared_count,
        })
    }

    /// Read and parse a `.scl` file.
    pub fn load(path: impl AsRef<Path>, mode: ParseMode) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TuningError::io(path, e))?;
        Self::parse(&text, mode)
    }

    /// Description line.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Explicit degrees in file order, without the implicit 1/1.
    pub fn degrees(&self) -> &[ScaleDegree] {
        &self.degrees
    }

    /// Count from the file's count line.
    pub fn declared_count(&self) -> usize {
        self.declared_count
    }

    /// Number of explicit degrees; the scale length used for mapping.
    pub fn degree_count(&self) -> usize {
        self.degrees.len()
    }

    /// Number of degrees including the implicit 1/1.
    pub fn len(&self) -> usize {
        self.degrees.len() + 1
    }

    /// True when only the implicit 1/1 is present.
    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    /// Ratio of degree `index`; index 0 is 1/1.
    pub fn ratio(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(1.0),
            i => self.degrees.get(i - 1).map(ScaleDegree::ratio),
        }
    }

    /// Cents of degree `index`; index 0 is 0.
    pub fn cents(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(0.0),
            i => self.degrees.get(i - 1).map(ScaleDegree::cents),
        }
    }

    /// Index of the first degree with the same ratio as `degree`.
    pub fn index_of(&self, degree: &ScaleDegree) -> Option<usize> {
        let target = degree.ratio();
        let same = |r: f64| (r - target).abs() <= 1e-9 * target.abs().max(1.0);
        if same(1.0) {
            return Some(0);
        }
        self.degrees.iter().position(|d| same(d.ratio())).map(|i| i + 1)
    }

    /// Interval of repetition: the last degree's ratio, or 2/1 for an
    /// empty scale.
    pub fn period(&self) -> f64 {
        self.degrees.last().map_or(2.0, ScaleDegree::ratio)
    }

    /// Ratio of any integer degree, folding by [`period`](Self::period)
    /// outside `0..degree_count()`.
    pub fn extended_ratio(&self, degree: i64) -> f64 {
        let n = self.degrees.len() as i64;
        if n == 0 {
            return self.period().powi(degree as i32);
        }
        let periods = degree.div_euclid(n);
        let index = degree.rem_euclid(n) as usize;
        let base = self.ratio(index).unwrap_or(1.0);
        base * self.period().powi(periods as i32)
    }

    /// Render back to `.scl` text.
    pub fn to_scl(&self) -> String {
        let mut out = format!("{}\n {}\n", self.description, self.degrees.len());
        for degree in &self.degrees {
            out.push_str(&format!(" {degree}\n"));
        }
        out
    }
}
