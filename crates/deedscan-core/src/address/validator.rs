use std::sync::LazyLock;

use regex::Regex;

/// House number, a street-name run of at least two words, a city segment,
/// a region segment, then a five-digit postal code closing the text.
static ADDRESS_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[0-9]+\s[A-Za-z]+(?:\s[A-Za-z]+)+,?\s+[A-Za-z]+(?:\s[A-Za-z]+)*,\s+[A-Za-z]+(?:\s[A-Za-z]+)*,?\s+[0-9]{5}[\s.,]*$",
    )
    .expect("address shape pattern is valid")
});

/// Structural check for candidate spans coming out of a recognizer.
///
/// This is a shape heuristic, not geocoding: correctly punctuated nonsense
/// passes, and real addresses missing the comma/postal-code layout are
/// rejected. The match may start anywhere, so leading carrier text such as
/// "being known as" does not disqualify a candidate.
#[must_use]
pub fn is_likely_address(text: &str) -> bool {
    ADDRESS_SHAPE.is_match(text)
}
