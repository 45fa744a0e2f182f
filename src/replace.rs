//! Exact substring replacement with occurrence counting.
//!
//! This is the one primitive every patch compiles down to. There is no
//! regex, no whitespace normalization, no fuzzy matching: a rule's search
//! text must appear byte-for-byte, line endings and indentation included.

/// Replace every occurrence of `search` in `content` and report how many
/// were replaced.
///
/// Scans left to right and never rescans replaced text, so a replacement
/// that happens to contain the search text does not recurse. An empty
/// search text matches nothing and returns the content unchanged.
pub fn replace_count(content: &str, search: &str, replace: &str) -> (String, usize) {
    if search.is_empty() {
        return (content.to_string(), 0);
    }

    let mut out = String::with_capacity(content.len());
    let mut count = 0;
    let mut rest = content;

    while let Some(pos) = rest.find(search) {
        out.push_str(&rest[..pos]);
        out.push_str(replace);
        rest = &rest[pos + search.len()..];
        count += 1;
    }
    out.push_str(rest);

    (out, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_occurrence() {
        let (out, n) = replace_count("hello world", "world", "there");
        assert_eq!(out, "hello there");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_all_occurrences_replaced() {
        let (out, n) = replace_count("a-b-a-b-a", "a", "x");
        assert_eq!(out, "x-b-x-b-x");
        assert_eq!(n, 3);
    }

    #[test]
    fn test_no_match_returns_input_unchanged() {
        let (out, n) = replace_count("hello world", "absent", "x");
        assert_eq!(out, "hello world");
        assert_eq!(n, 0);
    }

    #[test]
    fn test_empty_search_is_a_noop() {
        let (out, n) = replace_count("hello", "", "x");
        assert_eq!(out, "hello");
        assert_eq!(n, 0);
    }

    #[test]
    fn test_multiline_exact_match() {
        let content = "case 'empty':\n    break;\ncase 'other':\n    break;\n";
        let (out, n) = replace_count(content, "case 'empty':\n    break;", "case 'empty':\n    skip;");
        assert_eq!(out, "case 'empty':\n    skip;\ncase 'other':\n    break;\n");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_replacement_containing_search_does_not_recurse() {
        let (out, n) = replace_count("ab", "a", "aa");
        assert_eq!(out, "aab");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_whitespace_is_significant() {
        let (_, n) = replace_count("foo  bar", "foo bar", "x");
        assert_eq!(n, 0);
    }

    proptest! {
        #[test]
        fn prop_count_matches_constructed_occurrences(
            gap_a in "[a-z]{0,12}",
            gap_b in "[a-z]{0,12}",
            n in 1usize..6,
        ) {
            // Needle is uppercase so the lowercase gaps can never contain it.
            let needle = "NEEDLE";
            let mut content = gap_a.clone();
            for _ in 0..n {
                content.push_str(needle);
                content.push_str(&gap_b);
            }

            let (out, count) = replace_count(&content, needle, "q");
            prop_assert_eq!(count, n);
            prop_assert!(!out.contains(needle));
        }

        #[test]
        fn prop_zero_count_means_identity(content in "[a-z \n]{0,64}") {
            let (out, count) = replace_count(&content, "NEEDLE", "q");
            prop_assert_eq!(count, 0);
            prop_assert_eq!(out, content);
        }
    }
}
