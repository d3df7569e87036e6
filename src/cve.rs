//! CVE identifier normalization.
//!
//! Upstream sources misspell identifiers in creative ways: embedded spaces,
//! unicode dashes, unpadded serial numbers and a handful of outright garbled
//! IDs. Everything is canonicalized here before being used as a grouping key.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static CANONICAL_CVE: Lazy<Result<Regex, regex_lite::Error>> =
    Lazy::new(|| Regex::new(r"^CVE-(\d{4})-\d{4,}$"));

static SHORT_SERIAL: Lazy<Result<Regex, regex_lite::Error>> =
    Lazy::new(|| Regex::new(r"^CVE-(\d{4})-(\d{1,3})$"));

/// Known-garbled identifiers from particular ingest sources.
///
/// Applied after dash/case normalization but before zero-padding, since
/// padding would turn e.g. `CVE-2017-75` into a different, valid-looking ID.
const CORRECTIONS: &[(&str, &str)] = &[
    // trickest: transposed year and serial
    ("CVE-7600-2018", "CVE-2018-7600"),
    ("CVE-2121-44228", "CVE-2021-44228"),
    // nomi-sec: truncated or misfiled file names
    ("CVE-2017-75", "CVE-2017-7529"),
    ("CVE-2018-14", "CVE-2018-14773"),
    ("CVE-2021-22", "CVE-2021-22555"),
    ("CVE-2023-08", "CVE-2022-31470"),
];

/// Canonicalize a raw CVE identifier.
///
/// Strips embedded whitespace, maps non-ASCII dash variants to the ASCII
/// hyphen, uppercases, applies the static correction table and zero-pads a
/// 1-3 digit serial number to 4 digits.
pub fn clean_cve(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        match c {
            c if c.is_whitespace() => {}
            // hyphen, non-breaking hyphen, en dash, em dash, minus sign
            '\u{2010}' | '\u{2011}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => cleaned.push('-'),
            c => cleaned.extend(c.to_uppercase()),
        }
    }

    for (garbled, fixed) in CORRECTIONS {
        if cleaned == *garbled {
            cleaned = (*fixed).to_string();
            break;
        }
    }

    if let Ok(regex) = &*SHORT_SERIAL
        && let Some(caps) = regex.captures(&cleaned)
    {
        return format!("CVE-{}-{:0>4}", &caps[1], &caps[2]);
    }
    cleaned
}

/// Extract the 4-digit year grouping key from a canonical CVE identifier.
///
/// Returns `None` for anything not in canonical `CVE-YYYY-NNNN+` form;
/// callers must drop such records with a warning, never treat it as fatal.
pub fn cve_year(cve: &str) -> Option<String> {
    if let Ok(regex) = &*CANONICAL_CVE
        && let Some(caps) = regex.captures(cve)
    {
        return Some(caps[1].to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_serial() {
        assert_eq!(clean_cve("CVE-2018-7"), "CVE-2018-0007");
        assert_eq!(clean_cve("CVE-2019-42"), "CVE-2019-0042");
        assert_eq!(clean_cve("CVE-2020-123"), "CVE-2020-0123");
    }

    #[test]
    fn keeps_canonical_serial() {
        assert_eq!(clean_cve("CVE-2021-44228"), "CVE-2021-44228");
        assert_eq!(clean_cve("CVE-1999-0502"), "CVE-1999-0502");
    }

    #[test]
    fn normalizes_unicode_dashes_and_case() {
        // non-breaking hyphens, as pasted from rendered markdown
        assert_eq!(clean_cve("cve\u{2011}2021\u{2011}44228"), "CVE-2021-44228");
        assert_eq!(clean_cve("cve\u{2013}2018\u{2013}7600"), "CVE-2018-7600");
    }

    #[test]
    fn strips_embedded_whitespace() {
        assert_eq!(clean_cve(" CVE-2021- 44228 "), "CVE-2021-44228");
    }

    #[test]
    fn applies_correction_table_before_padding() {
        assert_eq!(clean_cve("CVE-7600-2018"), "CVE-2018-7600");
        assert_eq!(clean_cve("CVE-2017-75"), "CVE-2017-7529");
        assert_eq!(clean_cve("CVE-2023-08"), "CVE-2022-31470");
    }

    #[test]
    fn year_of_canonical_id() {
        assert_eq!(cve_year("CVE-1999-0502").as_deref(), Some("1999"));
        assert_eq!(cve_year("CVE-2024-123456").as_deref(), Some("2024"));
    }

    #[test]
    fn year_of_garbage_is_none() {
        assert_eq!(cve_year("not-a-cve"), None);
        assert_eq!(cve_year("CVE-2018-7"), None); // short serial never reaches grouping
        assert_eq!(cve_year(""), None);
    }
}
