// crates/riskprobe-core/src/phi.rs
// ============================================================================
// Module: PHI Detection
// Description: Heuristic extraction of identifying tokens from requests.
// Purpose: Feed the PHI non-leakage assertion with tokens to look for.
// Dependencies: regex, serde, serde_json
// ============================================================================

//! ## Overview
//! Sensitive tokens are pulled from the request (patient identifier, name-like
//! capitalized word runs, phone-like digit runs) and then searched for in the
//! serialized response. Matching is case-insensitive over the raw body plus
//! every decoded string leaf, so JSON escaping cannot hide an echo. Names match
//! on word boundaries; identifiers and phone digits match as substrings. Five
//! digit phone fragments are searched in string leaves only, so numeric fields
//! such as `confidence` cannot trip them.
//!
//! Limitations: reformatted leaks (digits re-spaced, names re-cased into a
//! single token) are not normalized before comparison, and the patient
//! identifier is matched whole.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::model::RequestPayload;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Two or more consecutive capitalized words.
const NAME_RUN_PATTERN: &str = r"\b[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)+\b";
/// Digit runs of seven or more digits with optional single delimiters.
const PHONE_PATTERN: &str = r"\+?\d(?:[\s.\-()]{0,2}\d){6,}";
/// Minimum digits for a phone-like run.
const MIN_PHONE_DIGITS: usize = 7;
/// Shortest token worth searching for; shorter ones match by accident.
const MIN_TOKEN_CHARS: usize = 3;
/// Digits in a partial phone fragment.
const PHONE_FRAGMENT_DIGITS: usize = 5;
/// Digits in a national number without country code.
const NATIONAL_PHONE_DIGITS: usize = 10;
/// Capitalized words that are clinical or calendar vocabulary, not names.
pub(crate) const NON_NAME_WORDS: &[&str] = &[
    "acute", "and", "april", "arm", "august", "breath", "chest", "crushing", "december",
    "discomfort", "dizzy", "exertion", "exertional", "feb", "february", "friday", "heart",
    "jan", "january", "july", "june", "left", "march", "may", "monday", "nausea", "november",
    "october", "pain", "patient", "pressure", "right", "saturday", "september", "severe", "shortness",
    "sunday", "the", "thursday", "tightness", "tuesday", "wednesday", "with",
];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Category of sensitive token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhiKind {
    /// The request's patient identifier.
    PatientId,
    /// A name-like token from free text.
    Name,
    /// A phone-like digit run from free text.
    Phone,
    /// Leading or trailing digits of a phone number.
    PhoneFragment,
    /// The full chief complaint text.
    ChiefComplaint,
}

impl PhiKind {
    /// Returns a stable label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PatientId => "patient_id",
            Self::Name => "name",
            Self::Phone => "phone",
            Self::PhoneFragment => "phone_fragment",
            Self::ChiefComplaint => "chief_complaint",
        }
    }
}

impl fmt::Display for PhiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensitive token extracted from a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhiToken {
    /// Token category.
    pub kind: PhiKind,
    /// Token text exactly as it appeared in the request.
    pub value: String,
}

// ============================================================================
// SECTION: Patterns
// ============================================================================

/// Compiled name-run pattern.
fn name_pattern() -> Result<&'static Regex, regex::Error> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(NAME_RUN_PATTERN)).as_ref().map_err(Clone::clone)
}

/// Compiled phone pattern.
fn phone_pattern() -> Result<&'static Regex, regex::Error> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(PHONE_PATTERN)).as_ref().map_err(Clone::clone)
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Returns name-like tokens: words of capitalized runs minus clinical vocabulary.
///
/// # Errors
///
/// Returns an error when the built-in pattern fails to compile.
pub fn name_tokens(text: &str) -> Result<Vec<String>, regex::Error> {
    let pattern = name_pattern()?;
    let mut tokens = Vec::new();
    for run in pattern.find_iter(text) {
        for word in run.as_str().split_whitespace() {
            let lowered = word.to_ascii_lowercase();
            if word.len() < MIN_TOKEN_CHARS || NON_NAME_WORDS.contains(&lowered.as_str()) {
                continue;
            }
            tokens.push(word.to_string());
        }
    }
    Ok(tokens)
}

/// Returns phone-like digit runs with at least seven digits.
///
/// # Errors
///
/// Returns an error when the built-in pattern fails to compile.
pub fn phone_numbers(text: &str) -> Result<Vec<String>, regex::Error> {
    let pattern = phone_pattern()?;
    Ok(pattern
        .find_iter(text)
        .map(|found| found.as_str().trim().to_string())
        .filter(|candidate| digits_only(candidate).len() >= MIN_PHONE_DIGITS)
        .collect())
}

/// Extracts every sensitive token carried by a request payload.
///
/// Phone numbers contribute their verbatim form, their bare digits, and
/// five-digit prefix and suffix fragments.
///
/// # Errors
///
/// Returns an error when a built-in pattern fails to compile.
pub fn scan_request(payload: &RequestPayload) -> Result<Vec<PhiToken>, regex::Error> {
    let mut tokens = BTreeSet::new();
    if let Some(patient_id) = payload.patient_id() {
        let trimmed = patient_id.trim();
        if trimmed.len() >= MIN_TOKEN_CHARS {
            tokens.insert(PhiToken {
                kind: PhiKind::PatientId,
                value: trimmed.to_string(),
            });
        }
    }
    if let Some(complaint) = payload.chief_complaint() {
        for name in name_tokens(complaint)? {
            tokens.insert(PhiToken {
                kind: PhiKind::Name,
                value: name,
            });
        }
        for phone in phone_numbers(complaint)? {
            let digits = digits_only(&phone);
            for fragment in phone_fragments(&digits) {
                tokens.insert(PhiToken {
                    kind: PhiKind::PhoneFragment,
                    value: fragment,
                });
            }
            if digits != phone {
                tokens.insert(PhiToken {
                    kind: PhiKind::Phone,
                    value: digits,
                });
            }
            tokens.insert(PhiToken {
                kind: PhiKind::Phone,
                value: phone,
            });
        }
    }
    Ok(tokens.into_iter().collect())
}

/// Returns the leading and trailing fragments of a phone digit string.
///
/// Numbers with a country code also yield the prefix of the national number.
fn phone_fragments(digits: &str) -> Vec<String> {
    let len = digits.len();
    if len <= PHONE_FRAGMENT_DIGITS {
        return Vec::new();
    }
    let mut fragments = vec![
        digits[.. PHONE_FRAGMENT_DIGITS].to_string(),
        digits[len - PHONE_FRAGMENT_DIGITS ..].to_string(),
    ];
    if len > NATIONAL_PHONE_DIGITS {
        let start = len - NATIONAL_PHONE_DIGITS;
        fragments.push(digits[start .. start + PHONE_FRAGMENT_DIGITS].to_string());
    }
    fragments
}

// ============================================================================
// SECTION: Matching
// ============================================================================

/// Lowercase search space for one response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Haystack {
    /// Raw body followed by every decoded string leaf.
    full: String,
    /// Decoded string leaves only; the raw body when it is not JSON.
    strings: String,
}

impl Haystack {
    /// Returns the raw body plus decoded strings.
    #[must_use]
    pub fn full(&self) -> &str {
        &self.full
    }

    /// Returns the decoded string leaves.
    #[must_use]
    pub fn strings(&self) -> &str {
        &self.strings
    }
}

/// Builds the lowercase search space for a response: raw text plus decoded strings.
#[must_use]
pub fn response_haystack(raw_body: &str, body: Option<&Value>) -> Haystack {
    let mut full = raw_body.to_lowercase();
    let Some(body) = body else {
        return Haystack {
            strings: full.clone(),
            full,
        };
    };
    let mut leaves = Vec::new();
    collect_strings(body, &mut leaves);
    let mut strings = String::new();
    for leaf in leaves {
        let leaf = leaf.to_lowercase();
        full.push('\n');
        full.push_str(&leaf);
        strings.push('\n');
        strings.push_str(&leaf);
    }
    Haystack {
        full,
        strings,
    }
}

/// Returns the tokens that occur in the haystack (case-insensitive).
#[must_use]
pub fn echoed_tokens<'a>(tokens: &'a [PhiToken], haystack: &Haystack) -> Vec<&'a PhiToken> {
    tokens.iter().filter(|token| token_echoed(token, haystack)).collect()
}

/// Matches one token according to its kind.
fn token_echoed(token: &PhiToken, haystack: &Haystack) -> bool {
    let needle = token.value.to_lowercase();
    if needle.is_empty() {
        return false;
    }
    match token.kind {
        PhiKind::Name => match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&needle))) {
            Ok(pattern) => pattern.is_match(haystack.full()),
            // Fail closed.
            Err(_) => true,
        },
        PhiKind::PhoneFragment => haystack.strings().contains(&needle),
        PhiKind::PatientId | PhiKind::Phone | PhiKind::ChiefComplaint => {
            haystack.full().contains(&needle)
        }
    }
}

/// Masks a sensitive value for diagnostics: first character plus length.
#[must_use]
pub fn mask(value: &str) -> String {
    let first = value.chars().next().map(String::from).unwrap_or_default();
    format!("{first}***({} chars)", value.chars().count())
}

/// Keeps ASCII digits only.
fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Collects every string leaf and object key.
fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) => out.push(text.clone()),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => {
            for (key, item) in map {
                out.push(key.clone());
                collect_strings(item, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
