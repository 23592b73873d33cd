use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for locale code handling
///
/// Validation, normalization and matching for the language codes that name
/// locale directories. Codes are ISO 639-1 (2-letter) or ISO 639-2
/// (3-letter), optionally carrying a region subtag as in "pt-BR" or
/// "zh_TW". The region is opaque here; only the base language is checked
/// against the ISO tables.
/// Base language of a locale code, with any region subtag stripped
pub fn base_language(code: &str) -> &str {
    code.trim().split(['-', '_']).next().unwrap_or(code)
}

/// Region subtag of a locale code, if it carries one
pub fn region_subtag(code: &str) -> Option<&str> {
    code.trim().split_once(['-', '_']).map(|(_, region)| region)
}

/// Normalize a base language code to ISO 639-2/T (3-letter) form
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized = code.trim().to_lowercase();

    match normalized.len() {
        2 => {
            if let Some(lang) = Language::from_639_1(&normalized) {
                return Ok(lang.to_639_3().to_string());
            }
        }
        3 => {
            if Language::from_639_3(&normalized).is_some() {
                return Ok(normalized);
            }
            // Bibliographic codes still turn up in older locale trees
            if let Some(terminological) = part2b_to_part2t(&normalized) {
                return Ok(terminological.to_string());
            }
        }
        _ => {}
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// ISO 639-2/T equivalents for the bibliographic codes where B and T differ
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    let terminological = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };

    Some(terminological)
}

/// Check if two locale codes address the same locale.
///
/// The base languages are compared through their ISO 639-2/T form, so "fr"
/// and "fra" match. Region subtags distinguish locales: "pt" and "pt-BR"
/// do not match, while "pt-br" and "pt_BR" do.
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let normalized1 = match normalize_to_part2t(base_language(code1)) {
        Ok(n) => n,
        Err(_) => return false,
    };

    let normalized2 = match normalize_to_part2t(base_language(code2)) {
        Ok(n) => n,
        Err(_) => return false,
    };

    if normalized1 != normalized2 {
        return false;
    }

    match (region_subtag(code1), region_subtag(code2)) {
        (None, None) => true,
        (Some(region1), Some(region2)) => region1.eq_ignore_ascii_case(region2),
        _ => false,
    }
}

/// Get the English language name for a locale code.
///
/// A region subtag is kept visible, so "pt-BR" comes out as
/// "Portuguese (BR)". Used when building prompts and validating config.
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(base_language(code))?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    match region_subtag(code) {
        Some(region) => Ok(format!("{} ({})", lang.to_name(), region.to_uppercase())),
        None => Ok(lang.to_name().to_string()),
    }
}
