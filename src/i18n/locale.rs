//! Locale matching: pick the best supported locale for a list of candidates.
//!
//! Tags are compared as plain strings. The only normalization performed is the
//! "alternate form" of a tag: a bare language code gains a region made of the
//! upper-cased language (`pl` -> `pl-PL`), and a language-region code loses its
//! region (`en-US` -> `en`).

/// Get the alternate form of a locale tag.
///
/// # Example
/// ```
/// use t_i18n::i18n::alt_language_code;
///
/// assert_eq!(alt_language_code("de"), "de-DE");
/// assert_eq!(alt_language_code("de-AT"), "de");
/// ```
pub fn alt_language_code(code: &str) -> String {
    match code.split_once('-') {
        Some((language, _region)) => language.to_string(),
        None => format!("{}-{}", code, code.to_uppercase()),
    }
}

/// Find the first supported locale matching a single candidate.
fn matching_supported_locale<'s, S: AsRef<str>>(
    candidate: &str,
    supported: &'s [S],
) -> Option<&'s str> {
    let alt_candidate = alt_language_code(candidate);

    for el in supported {
        let el = el.as_ref();
        if el == candidate || el == alt_candidate || alt_language_code(el) == candidate {
            return Some(el);
        }
    }

    None
}

/// Find a locale which is both supported and preferred.
///
/// Candidates are tried in order (most preferred first). For each candidate,
/// `supported` is searched for an exact match, then for the candidate's
/// alternate form, then for an entry whose own alternate form equals the
/// candidate. The first supported entry satisfying any of these for the first
/// matching candidate wins.
///
/// # Returns
/// * `Some(&str)` borrowed from `supported`
/// * `None` if no candidate matches anything
pub fn get_matching_locale<'s, C, S>(
    candidates: impl IntoIterator<Item = C>,
    supported: &'s [S],
) -> Option<&'s str>
where
    C: AsRef<str>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .find_map(|candidate| matching_supported_locale(candidate.as_ref(), supported))
}
