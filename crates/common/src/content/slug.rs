use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase, diacritic-free, hyphen-separated form of `input`.
///
/// `"Hello World"` becomes `hello-world` and `"Crème Brûlée!"` becomes
/// `creme-brulee`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;
    for c in input.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Whether `name` matches a listing search term.
pub fn matches_search(name: &str, term: &str) -> bool {
    let needle = slugify(term);
    needle.is_empty() || slugify(name).contains(&needle)
}
