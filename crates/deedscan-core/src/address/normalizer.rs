use std::sync::LazyLock;

use regex::Regex;

/// Estate and fiduciary roles that trail an address in deed captions.
/// The first one found is cut together with everything after it.
pub const ROLE_WORDS: [&str; 5] = [
    "Estate",
    "Executor",
    "Executrix",
    "Administrator",
    "Administratrix",
];

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static TRAILING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,]+$").expect("trailing punctuation pattern is valid"));

static ROLE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?:{})\b.*$", ROLE_WORDS.join("|")))
        .expect("role suffix pattern is valid")
});

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s,]").expect("disallowed character pattern is valid"));

/// Canonical form of an extracted address, used as the dedup and
/// comparison key everywhere downstream.
///
/// Steps run in a fixed order: collapse whitespace, strip trailing
/// commas/periods, cut the first role word and its tail, then drop every
/// character that is not a word character, whitespace or a comma. Removing
/// characters can leave fresh whitespace runs, edge commas, or glue a role
/// word back together (`Est.ate`), so the steps are repeated until the
/// output stops changing. After the first pass every step only deletes
/// characters, which bounds the loop by the input length.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut current = normalize_once(raw);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    let stripped = TRAILING_PUNCTUATION.replace(&collapsed, "");
    let without_role = ROLE_SUFFIX.replace(&stripped, "");
    let cleaned = DISALLOWED.replace_all(&without_role, "");

    collapse_whitespace(&cleaned)
        .trim_matches(|c: char| c == ',' || c == ' ')
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_newlines() {
        assert_eq!(
            normalize("  123   Main\nStreet,\t Springfield  "),
            "123 Main Street, Springfield"
        );
    }

    #[test]
    fn test_strips_trailing_commas_and_periods() {
        assert_eq!(normalize("123 Main St.,."), "123 Main St");
        assert_eq!(normalize("123 Main St ."), "123 Main St");
    }

    #[test]
    fn test_removes_role_word_and_tail() {
        assert_eq!(
            normalize("456 Oak Ave, Dover, DE, 19901 Estate of John Smith"),
            "456 Oak Ave, Dover, DE, 19901"
        );
        assert_eq!(
            normalize("456 Oak Ave, Dover, DE, 19901, Executrix"),
            "456 Oak Ave, Dover, DE, 19901"
        );
    }

    #[test]
    fn test_role_word_requires_word_boundary() {
        assert_eq!(normalize("12 Estates Lane, Bath"), "12 Estates Lane, Bath");
        assert_eq!(normalize("12 RealEstate Way"), "12 RealEstate Way");
    }

    #[test]
    fn test_removes_disallowed_characters() {
        assert_eq!(
            normalize("Unit #4-B, 77 Elm St. (rear), Media, PA"),
            "Unit 4B, 77 Elm St rear, Media, PA"
        );
    }

    #[test]
    fn test_removal_does_not_leave_double_spaces() {
        assert_eq!(normalize("77 Elm - St"), "77 Elm St");
    }

    #[test]
    fn test_rejoined_role_word_is_removed() {
        assert_eq!(normalize("77 Elm St Est.ate of Doe"), "77 Elm St");
    }

    #[test]
    fn test_empty_and_noise_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t"), "");
        assert_eq!(normalize(".,.,"), "");
        assert_eq!(normalize("Estate"), "");
    }

    #[test]
    fn test_idempotent_on_examples() {
        for raw in [
            "123 Main Street, Springfield, IL, 62704.",
            " , 9 Elm St , ",
            "1 A  St, B , C, 12345 Administrator d.b.n.",
            "x-y-z",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input: {raw:?}");
        }
    }
}
