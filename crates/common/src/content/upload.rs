//! Naming rules for uploaded files.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

/// Longest stored name derived from a client-supplied filename.
pub const MAX_DERIVED_NAME_LEN: usize = 100;

const TRUNCATED_HEAD: usize = 60;
const TRUNCATED_TAIL: usize = 20;
const DISAMBIGUATOR_LEN: usize = 5;

static EXTENSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\w{1,8}$").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__+").unwrap());

/// Whether `name` ends in a 1 to 8 character word extension.
pub fn has_valid_extension(name: &str) -> bool {
    EXTENSION.is_match(name)
}

/// Stored name for an upload without an explicit target name.
///
/// Directory components sent by the client are dropped, the name is
/// lowercased, whitespace runs become `_` and overlong names are shortened
/// around the extension.
pub fn derive_name(client_filename: &str) -> String {
    let base = client_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let spaced = WHITESPACE.replace_all(&base, "_");
    let name = UNDERSCORES.replace_all(&spaced, "_").into_owned();
    shorten(&name)
}

fn shorten(name: &str) -> String {
    if name.chars().count() <= MAX_DERIVED_NAME_LEN {
        return name.to_string();
    }
    let (stem, ext) = split_extension(name);
    let chars: Vec<char> = stem.chars().collect();
    let head: String = chars.iter().take(TRUNCATED_HEAD).collect();
    let tail: String = chars[chars.len().saturating_sub(TRUNCATED_TAIL)..]
        .iter()
        .collect();
    format!("{}-{}{}", head, tail, ext)
}

/// Insert `__` and a random uppercase suffix before the extension.
pub fn disambiguate(name: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..DISAMBIGUATOR_LEN)
        .map(|_| char::from(rng.random_range(b'A'..=b'Z')))
        .collect();
    let (stem, ext) = split_extension(name);
    format!("{}__{}{}", stem, suffix, ext)
}

/// Endless fresh alternatives for a taken `name`, each built from `name`
/// itself so suffixes never pile up.
pub fn candidates(name: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::repeat_with(move || disambiguate(name))
}

fn split_extension(name: &str) -> (&str, &str) {
    match EXTENSION.find(name) {
        Some(m) => (&name[..m.start()], &name[m.start()..]),
        None => (name, ""),
    }
}
