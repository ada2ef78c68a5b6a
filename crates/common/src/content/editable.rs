use super::ContentError;

/// Extensions of text formats the in-browser editor may open.
pub const EDITABLE_EXTENSIONS: &[&str] = &[
    "md", "mdwn", "mdown", "markdown", "mmd", "gfm", "html", "htm", "org", "rst", "tex", "man",
    "rtf", "textile", "xml", "jats", "tei", "docbook", "yaml", "yml", "json", "js", "css",
    "scss", "csv", "txt", "sgml", "ini", "toml", "svg",
];

/// Reject files the editor must not open.
pub fn check_editable(file_name: &str) -> Result<(), ContentError> {
    let ext = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
        _ => return Err(ContentError::MissingExtension(file_name.to_string())),
    };
    if EDITABLE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(ContentError::PolicyViolation(format!(
            "files with the extension '{}' cannot be edited",
            ext
        )))
    }
}
