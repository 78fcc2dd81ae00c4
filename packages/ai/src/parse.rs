//! Defensive parsing of the generative model's analysis response.
//!
//! The model is instructed to answer with four labeled fields, but real
//! responses drift: numbering disappears, labels get reworded into
//! `snake_case`, markdown bullets appear, fields go missing entirely.
//! [`parse_response`] never fails; any field it cannot extract falls back
//! to a sentinel value and is named in
//! [`ParsedAnalysis::defaulted_fields`].

use std::str::FromStr as _;
use std::sync::LazyLock;

use crime_rag_models::{CrimeShare, RiskLevel};
use regex::Regex;

/// Matches `Name(NN%)` entries in the crime-type distribution, e.g.
/// `Theft(60%)` or `Vehicle Theft (12.5%)`.
static DISTRIBUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z /\-]*?)\s*\(\s*(\d+(?:\.\d+)?)\s*%\s*\)")
        .expect("valid distribution regex")
});

/// Matches the first number in a field value.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)").expect("valid number regex")
});

/// The structured fields extracted from one model response.
#[derive(Debug, Clone)]
pub struct ParsedAnalysis {
    /// Crime probability in [0, 100], if present.
    pub crime_probability: Option<f64>,
    /// Crime-type distribution in the order the model listed it.
    pub distribution: Vec<CrimeShare>,
    /// Contributing risk factors.
    pub key_factors: Vec<String>,
    /// Categorical risk level.
    pub risk_level: RiskLevel,
    /// Names of the fields that fell back to their sentinel values.
    pub defaulted_fields: Vec<String>,
}

/// Extracts the four analysis fields from a raw model response.
///
/// Accepts both the numbered upper-case labels the prompt asks for
/// (`1. CRIME PROBABILITY:`) and common drift forms such as
/// `crime_probability:` or `**Risk Level**:`. Parsing is line-oriented;
/// the first line matching each label wins.
#[must_use]
pub fn parse_response(response: &str) -> ParsedAnalysis {
    let mut probability: Option<f64> = None;
    let mut distribution: Vec<CrimeShare> = Vec::new();
    let mut key_factors: Vec<String> = Vec::new();
    let mut risk_level: Option<RiskLevel> = None;

    for line in response.lines() {
        let Some((label, value)) = split_labeled_line(line) else {
            continue;
        };

        match label.as_str() {
            "crime probability" | "probability" => {
                if probability.is_none() {
                    probability = parse_probability(value);
                }
            }
            "most likely crime type" | "most likely crime" | "crime type distribution" => {
                if distribution.is_empty() {
                    distribution = parse_distribution(value);
                }
            }
            "key factors" | "contributing factors" => {
                if key_factors.is_empty() {
                    key_factors = parse_factors(value);
                }
            }
            "risk level" | "risk" => {
                if risk_level.is_none() {
                    risk_level = parse_risk_level(value);
                }
            }
            _ => {}
        }
    }

    let mut defaulted_fields = Vec::new();
    if probability.is_none() {
        defaulted_fields.push("crime_probability".to_string());
    }
    if distribution.is_empty() {
        defaulted_fields.push("most_likely_crime".to_string());
    }
    if key_factors.is_empty() {
        defaulted_fields.push("key_factors".to_string());
    }
    if risk_level.is_none() {
        defaulted_fields.push("risk_level".to_string());
    }

    if !defaulted_fields.is_empty() {
        log::warn!(
            "model response missing fields: {}",
            defaulted_fields.join(", ")
        );
    }

    ParsedAnalysis {
        crime_probability: probability,
        distribution,
        key_factors,
        risk_level: risk_level.unwrap_or(RiskLevel::Unknown),
        defaulted_fields,
    }
}

/// Splits a line into a normalized label and its raw value.
///
/// Normalization strips leading numbering (`1.`), markdown emphasis and
/// bullets, lowercases, and maps underscores to spaces, so that
/// `2. MOST LIKELY CRIME TYPE:` and `most_likely_crime_type:` collapse to
/// the same label.
fn split_labeled_line(line: &str) -> Option<(String, &str)> {
    let (raw_label, value) = line.split_once(':')?;

    let label = raw_label
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')' || c == ' ')
        .trim_matches(|c: char| c == '*' || c == '#' || c == '-' || c == ' ')
        .to_lowercase()
        .replace('_', " ");

    if label.is_empty() {
        return None;
    }

    Some((label, value))
}

fn parse_probability(value: &str) -> Option<f64> {
    let capture = NUMBER.captures(value)?;
    let number: f64 = capture[1].parse().ok()?;
    Some(number.clamp(0.0, 100.0))
}

fn parse_distribution(value: &str) -> Vec<CrimeShare> {
    DISTRIBUTION
        .captures_iter(value)
        .filter_map(|capture| {
            let crime_type = capture[1].trim().to_string();
            let percent: f64 = capture[2].parse().ok()?;
            Some(CrimeShare {
                crime_type,
                percent,
            })
        })
        .collect()
}

fn parse_factors(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|factor| !factor.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Maps the risk-level field to a [`RiskLevel`].
///
/// Checks "very high" before "high" since the latter is a substring of
/// the former.
fn parse_risk_level(value: &str) -> Option<RiskLevel> {
    let cleaned = value.trim().trim_matches('*').trim();

    if let Ok(level) = RiskLevel::from_str(cleaned) {
        return Some(level);
    }

    let lower = cleaned.to_lowercase();
    if lower.contains("very high") || lower.contains("critical") {
        Some(RiskLevel::VeryHigh)
    } else if lower.contains("high") {
        Some(RiskLevel::High)
    } else if lower.contains("moderate") || lower.contains("medium") {
        Some(RiskLevel::Moderate)
    } else if lower.contains("low") {
        Some(RiskLevel::Low)
    } else {
        None
    }
}
