/// Keyword list cleanup
///
/// Turns the model's free-text reply into the fields of one output row:
/// unique keywords sorted case-insensitively, then the `RANK n` token the
/// model was asked for (if it gave one), then the file's SHA-256.
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Matches a `RANK <int>` token anywhere inside a field, any case
static RANK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)RANK\s+(\d+)").expect("rank pattern is valid"));

/// Extract the rank from a field containing a `RANK <int>` token
///
/// Returns `None` only when the field has no such token. Numbers too large
/// for a `u32` saturate at `u32::MAX`.
pub fn parse_rank(field: &str) -> Option<u32> {
    RANK_PATTERN
        .captures(field)
        .and_then(|caps| caps.get(1))
        .map(|digits| digits.as_str().parse().unwrap_or(u32::MAX))
}

/// Split a comma-separated list into trimmed, non-empty items
pub fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// Drop later items that equal an earlier one ignoring case
///
/// The first spelling seen is the one kept.
pub fn dedup_case_insensitive<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Build the keyword fields for one image
///
/// # Arguments
/// * `raw_text` - the model's reply, expected to be a comma-separated list
/// * `sha256_hex` - digest of the image bytes, always the last field
pub fn process_keywords(raw_text: &str, sha256_hex: &str) -> Vec<String> {
    let mut rank = None;
    let mut keywords: Vec<String> = dedup_case_insensitive(split_list(raw_text))
        .into_iter()
        .filter(|item| match parse_rank(item) {
            Some(value) => {
                rank.get_or_insert(value);
                false
            }
            None => true,
        })
        .collect();

    // Stable, so spellings that only differ in case keep reply order
    keywords.sort_by_key(|kw| kw.to_lowercase());

    if let Some(rank) = rank {
        keywords.push(format!("RANK {}", rank));
    }
    keywords.push(sha256_hex.to_string());
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

    #[test]
    fn test_rank_is_moved_before_hash() {
        let fields = process_keywords("blue, sky, RANK 8, photo", HASH);
        assert_eq!(fields, vec!["blue", "photo", "sky", "RANK 8", HASH]);
    }

    #[test]
    fn test_dedup_keeps_first_spelling_then_sorts() {
        let fields = process_keywords("Sunset, beach, sunset, Beach, ocean", HASH);
        assert_eq!(fields, vec!["beach", "ocean", "Sunset", HASH]);
    }

    #[test]
    fn test_hash_is_always_last() {
        for reply in ["", ",,,", "zebra", "a, RANK 3", "RANK 1"] {
            let fields = process_keywords(reply, HASH);
            assert_eq!(fields.last().map(String::as_str), Some(HASH), "reply {:?}", reply);
        }
    }

    #[test]
    fn test_only_first_rank_counts() {
        let fields = process_keywords("rank 2, cat, RANK 9", HASH);
        assert_eq!(fields, vec!["cat", "RANK 2", HASH]);
    }

    #[test]
    fn test_parse_rank() {
        assert_eq!(parse_rank("RANK 7"), Some(7));
        assert_eq!(parse_rank("quality rank   10"), Some(10));
        assert_eq!(parse_rank("ranking"), None);
    }

    #[test]
    fn test_oversized_rank_saturates_and_leaves_keywords() {
        assert_eq!(parse_rank("RANK 99999999999999999999"), Some(u32::MAX));

        let fields = process_keywords("sky, RANK 99999999999, cloud", HASH);
        assert_eq!(
            fields,
            vec!["cloud".to_string(), "sky".to_string(), format!("RANK {}", u32::MAX), HASH.to_string()]
        );
    }

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        let items: Vec<&str> = split_list(" a ,, b,  ,c ").collect();
        assert_eq!(items, vec!["a", "b", "c"]);
    }
}
