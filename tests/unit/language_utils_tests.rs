/*!
 * Tests for language code utilities
 */

use locsync::language_utils::{
    base_language, get_language_name, language_codes_match, normalize_to_part2t, region_subtag,
};

/// Test base language extraction from regional codes
#[test]
fn test_base_language_withRegionSubtags_shouldStripThem() {
    assert_eq!(base_language("en"), "en");
    assert_eq!(base_language("pt-BR"), "pt");
    assert_eq!(base_language("zh_TW"), "zh");
    assert_eq!(base_language("  fr  "), "fr");
}

/// Test region subtag extraction
#[test]
fn test_region_subtag_shouldExtractRegionWhenPresent() {
    assert_eq!(region_subtag("pt-BR"), Some("BR"));
    assert_eq!(region_subtag("zh_TW"), Some("TW"));
    assert_eq!(region_subtag("en"), None);
}

/// Test 2-letter to 3-letter normalization
#[test]
fn test_normalize_to_part2t_with2LetterCodes_shouldReturn3LetterForm() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("fr").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("DE").unwrap(), "deu");
}

/// Test bibliographic to terminology conversion
#[test]
fn test_normalize_to_part2t_withBibliographicCodes_shouldConvertToTerminology() {
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("chi").unwrap(), "zho");
}

/// Test that invalid codes are rejected
#[test]
fn test_normalize_to_part2t_withInvalidCodes_shouldFail() {
    assert!(normalize_to_part2t("xyz").is_err());
    assert!(normalize_to_part2t("").is_err());
    assert!(normalize_to_part2t("english").is_err());
}

/// Test matching across 2-letter and 3-letter forms
#[test]
fn test_language_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("fr", "fra"));
    assert!(language_codes_match("fr", "fre"));
    assert!(language_codes_match("EN", "eng"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("en", "bogus"));
}

/// Test that region subtags distinguish locales
#[test]
fn test_language_codes_match_withRegionVariants_shouldCompareRegions() {
    assert!(language_codes_match("pt-br", "pt_BR"));
    assert!(language_codes_match("pt-BR", "pt-BR"));
    assert!(!language_codes_match("pt", "pt-BR"));
    assert!(!language_codes_match("pt-BR", "pt-PT"));
}

/// Test English names for plain and regional codes
#[test]
fn test_get_language_name_withPlainAndRegionalCodes_shouldFormatNames() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("fr").unwrap(), "French");
    assert_eq!(get_language_name("pt-BR").unwrap(), "Portuguese (BR)");
    assert_eq!(get_language_name("pt-br").unwrap(), "Portuguese (BR)");
    assert!(get_language_name("xx").is_err());
}
