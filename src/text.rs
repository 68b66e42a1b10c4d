//! Text cleanup applied to every extracted value.

use unicode_normalization::UnicodeNormalization;

/// NFC-normalize `text` and collapse runs of whitespace into single spaces.
///
/// ```
/// use mdingest::text::clean;
///
/// assert_eq!(clean("  Deep\n   enzymology\tdata "), "Deep enzymology data");
/// // "e" + combining acute accent becomes the precomposed character
/// assert_eq!(clean("cafe\u{301}"), "caf\u{e9}");
/// ```
#[must_use]
pub fn clean(text: &str) -> String {
    let normalized: String = text.nfc().collect();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean every value and drop the ones that end up empty.
#[must_use]
pub fn clean_all<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| clean(v.as_ref()))
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_all_drops_empty() {
        assert_eq!(clean_all(["a", "  ", " b  c "]), vec!["a", "b c"]);
    }
}
