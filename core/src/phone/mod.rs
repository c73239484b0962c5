//! Phone number normalization.
//!
//! Canonicalizes raw user input to E.164 and derives the locale-specific
//! format variants some legacy gateways expect instead of E.164. The
//! calling-code table is intentionally small and static: it covers the
//! markets the engine serves, tested longest-first so `971` wins over `9`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{OtpError, OtpResult};

/// E.164: `+`, a non-zero digit, then 6 to 14 more digits
static E164_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").expect("E.164 pattern is valid"));

/// Known (alpha-2, calling code) pairs, ordered longest calling code first
const CALLING_CODES: &[(&str, &str)] = &[
    ("AE", "971"),
    ("LK", "94"),
    ("IN", "91"),
    ("GB", "44"),
    ("US", "1"),
];

/// Default country when no usable hint is supplied
pub const DEFAULT_COUNTRY: &str = "LK";

/// Canonicalize a raw phone number string to E.164.
///
/// Resolution order:
/// 1. strip everything except digits and a leading `+`
/// 2. convert a leading international `00` prefix to `+`
/// 3. accept as-is if already E.164
/// 4. recognize a leading known calling code and prefix `+`
/// 5. resolve the 2-letter country hint (defaulting to `LK`), strip a
///    national trunk `0`, and prepend the hint's calling code
///
/// # Arguments
///
/// * `raw` - Phone number as the caller supplied it
/// * `country_hint` - Optional 2-letter country code; unrecognized hints
///   fall back to the default country
pub fn canonicalize(raw: &str, country_hint: Option<&str>) -> OtpResult<String> {
    let has_plus = raw.trim_start().starts_with('+');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut cleaned = if has_plus {
        format!("+{digits}")
    } else {
        digits
    };

    if let Some(rest) = cleaned.strip_prefix("00") {
        cleaned = format!("+{rest}");
    }

    if E164_RE.is_match(&cleaned) {
        return Ok(cleaned);
    }

    let bare = cleaned.trim_start_matches('+');

    if CALLING_CODES.iter().any(|(_, code)| bare.starts_with(code)) {
        let candidate = format!("+{bare}");
        if E164_RE.is_match(&candidate) {
            return Ok(candidate);
        }
    }

    let calling_code = country_hint
        .and_then(calling_code_for_country)
        .unwrap_or_else(|| {
            calling_code_for_country(DEFAULT_COUNTRY).expect("default country is in the table")
        });
    let local = bare.strip_prefix('0').unwrap_or(bare);
    let candidate = format!("+{calling_code}{local}");
    if E164_RE.is_match(&candidate) {
        return Ok(candidate);
    }

    Err(OtpError::InvalidPhoneFormat {
        phone: raw.to_string(),
    })
}

/// The three representations legacy gateways accept in place of E.164
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariants {
    /// Digits with country code, no plus: `94771234567`
    pub with_country_code: String,
    /// National format with trunk zero: `0771234567`
    pub with_leading_zero: String,
    /// Bare subscriber number: `771234567`
    pub bare_local: String,
}

impl LocalVariants {
    /// Variants in the order legacy gateways are most likely to accept them
    pub fn as_candidates(&self) -> [&str; 3] {
        [
            &self.with_country_code,
            &self.with_leading_zero,
            &self.bare_local,
        ]
    }
}

/// Derive the locale-specific variants of an E.164 number.
///
/// When the calling code is not in the table the subscriber split cannot be
/// made; the full digit string stands in for the local forms.
pub fn local_variants(e164: &str) -> LocalVariants {
    let digits = e164.trim_start_matches('+');
    let subscriber = CALLING_CODES
        .iter()
        .find(|(_, code)| digits.starts_with(code))
        .map(|(_, code)| &digits[code.len()..])
        .unwrap_or(digits);

    LocalVariants {
        with_country_code: digits.to_string(),
        with_leading_zero: format!("0{subscriber}"),
        bare_local: subscriber.to_string(),
    }
}

/// Calling code for a 2-letter country code, if known.
///
/// `UK` is accepted as an alias for `GB`.
pub fn calling_code_for_country(country: &str) -> Option<&'static str> {
    let normalized = country.trim().to_ascii_uppercase();
    let normalized = if normalized == "UK" {
        "GB".to_string()
    } else {
        normalized
    };
    CALLING_CODES
        .iter()
        .find(|(alpha2, _)| *alpha2 == normalized)
        .map(|(_, code)| *code)
}

/// 2-letter country code for a calling code, if known.
///
/// Accepts `94`, `+94`, and `0094` forms; the match is exact, not a prefix
/// match, so subscriber digits must not be attached.
pub fn country_for_calling_code(calling_code: &str) -> Option<&'static str> {
    let trimmed = calling_code.trim().trim_start_matches('+');
    let trimmed = trimmed.strip_prefix("00").unwrap_or(trimmed);
    CALLING_CODES
        .iter()
        .find(|(_, code)| *code == trimmed)
        .map(|(alpha2, _)| *alpha2)
}

/// 2-letter country code for an E.164 number whose calling code is in the
/// table, longest code first
pub fn country_for_e164(e164: &str) -> Option<&'static str> {
    let digits = e164.trim_start_matches('+');
    CALLING_CODES
        .iter()
        .find(|(_, code)| digits.starts_with(code))
        .map(|(alpha2, _)| *alpha2)
}

/// Mask a phone number for logging, keeping the prefix and last two digits
pub fn mask_phone(phone: &str) -> String {
    if phone.len() <= 5 || !phone.is_ascii() {
        return "***".to_string();
    }
    let prefix = &phone[..3];
    let suffix = &phone[phone.len() - 2..];
    format!("{prefix}{}{suffix}", "*".repeat(phone.len() - 5))
}
