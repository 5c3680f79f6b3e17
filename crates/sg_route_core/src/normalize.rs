use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static RE_NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase, strip diacritics, collapse everything that is not a-z0-9 to
/// single spaces. "Pan-Island Expwy (PIE)" -> "pan island expwy pie".
pub fn normalize_text(input: &str) -> String {
    let lower = input.trim().to_lowercase();

    let no_diacritics: String = lower.nfkd().filter(|c| !is_combining_mark(*c)).collect();

    let tmp = RE_NON_ALNUM.replace_all(&no_diacritics, " ");
    RE_SPACES.replace_all(tmp.trim(), " ").to_string()
}

/// Whole-word containment on already normalized text, so "pie" matches
/// "accident on pie towards changi" but not "magpie rd".
pub fn mentions(haystack_norm: &str, needle_norm: &str) -> bool {
    if needle_norm.is_empty() {
        return false;
    }
    let hay = format!(" {haystack_norm} ");
    let needle = format!(" {needle_norm} ");
    hay.contains(&needle)
}
