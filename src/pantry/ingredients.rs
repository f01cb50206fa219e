//! Ingredient name normalization

use std::collections::BTreeSet;

/// Title-case a name: a letter following a non-letter (or the start) is
/// uppercased, every other letter lowercased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }

    out
}

/// Trim, drop empties, title-case, deduplicate and sort.
pub fn normalize<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .filter_map(|item| {
            let trimmed = item.as_ref().trim();
            (!trimmed.is_empty()).then(|| title_case(trimmed))
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
