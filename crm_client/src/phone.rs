//! Canonicalization of Moroccan phone numbers.
//!
//! Lead phone numbers arrive in every format ambassadors manage to type:
//! local trunk form ("0612..."), bare subscriber digits, international form
//! with "+" or "00", with or without punctuation. [`normalize`] maps all of
//! them onto one E.164-style shape so the CRM lookup key is stable.
//!
//! This is a lenient heuristic, not validation. Input that matches no known
//! pattern passes through cleaned but otherwise untouched; the caller
//! decides whether the result is usable (the reconciler requires at least
//! 10 characters before it performs a lookup).

/// Moroccan country calling code, with the international `+` prefix.
const COUNTRY_PREFIX: &str = "+212";

/// Normalize a raw phone string into `+212...` form where possible.
///
/// Returns `None` only when the input is empty (or contains nothing but
/// separators). Rules, in order:
///
/// 1. Strip whitespace, hyphens, parentheses, and periods.
/// 2. A leading `00` international dialing prefix becomes `+`.
/// 3. `+2120...` longer than 13 chars has the stray `0` after the country
///    code dropped; any other `+...` value is kept as-is.
/// 4. `2120...` longer than 12 chars likewise drops the stray `0` and gains
///    a `+`; any other `212...` value just gains a `+`.
/// 5. A leading local trunk `0` is replaced by `+212`.
/// 6. Exactly nine digits starting with 5, 6 or 7 gain `+212`.
/// 7. Anything else passes through unchanged.
///
/// The length thresholds in rules 3 and 4 are asymmetric (`> 13` with the
/// `+`, `> 12` without). That asymmetry is preserved on purpose: both
/// branches exist to repair an observed data-entry mistake and were tuned
/// against real lead data, so "fixing" one would change which inputs get
/// repaired.
pub fn normalize(raw: &str) -> Option<String> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    if cleaned.starts_with("00") {
        cleaned = format!("+{}", &cleaned[2..]);
    }

    if let Some(rest) = cleaned.strip_prefix('+') {
        // Repair the common "+2120 6xx ..." typo: an extra trunk zero
        // left in after the country code.
        if rest.starts_with("2120") && cleaned.len() > 13 {
            return Some(format!("{COUNTRY_PREFIX}{}", &rest[4..]));
        }
        return Some(cleaned);
    }

    if let Some(rest) = cleaned.strip_prefix("212") {
        if rest.starts_with('0') && cleaned.len() > 12 {
            return Some(format!("{COUNTRY_PREFIX}{}", &rest[1..]));
        }
        return Some(format!("+{cleaned}"));
    }

    if let Some(rest) = cleaned.strip_prefix('0') {
        return Some(format!("{COUNTRY_PREFIX}{rest}"));
    }

    if cleaned.len() == 9
        && cleaned.bytes().all(|b| b.is_ascii_digit())
        && matches!(cleaned.as_bytes()[0], b'5' | b'6' | b'7')
    {
        return Some(format!("{COUNTRY_PREFIX}{cleaned}"));
    }

    Some(cleaned)
}
