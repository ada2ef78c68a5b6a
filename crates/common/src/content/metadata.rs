//! Front matter date management.
//!
//! Only top-level `key: value` lines of a leading `---` block are inspected;
//! everything else in the header and the whole body pass through untouched.

use chrono::{DateTime, Local};

use crate::config::MetadataField;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Apply `fields` to `text` as of `now`.
///
/// - `modified_date` is always refreshed
/// - `created_date` is added once, seeded from an existing `date` if present
/// - `date` is added once
///
/// A document without front matter gains one when anything is added.
pub fn inject(text: &str, fields: &[MetadataField], now: DateTime<Local>) -> String {
    if fields.is_empty() {
        return text.to_string();
    }
    let (mut lines, body): (Vec<String>, &str) = match split_front_matter(text) {
        Some((header, body)) => (header.lines().map(str::to_string).collect(), body),
        None => (Vec::new(), text),
    };
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();

    let mut changed = false;
    let mut seen = Vec::with_capacity(fields.len());
    for field in fields {
        if seen.contains(field) {
            continue;
        }
        seen.push(*field);
        match field {
            MetadataField::ModifiedDate => {
                let line = format!("{}: {}", field.key(), stamp);
                match find_key(&lines, field.key()) {
                    Some(idx) => {
                        if lines[idx] != line {
                            lines[idx] = line;
                            changed = true;
                        }
                    }
                    None => {
                        lines.push(line);
                        changed = true;
                    }
                }
            }
            MetadataField::CreatedDate => {
                if find_key(&lines, field.key()).is_none() {
                    let seed = find_key(&lines, MetadataField::Date.key())
                        .map(|idx| value_of(&lines[idx], MetadataField::Date.key()))
                        .filter(|v| !v.is_empty())
                        .unwrap_or(&stamp)
                        .to_string();
                    lines.push(format!("{}: {}", field.key(), seed));
                    changed = true;
                }
            }
            MetadataField::Date => {
                if find_key(&lines, field.key()).is_none() {
                    lines.push(format!("{}: {}", field.key(), stamp));
                    changed = true;
                }
            }
        }
    }

    if !changed {
        return text.to_string();
    }
    format!("---\n{}\n---\n{}", lines.join("\n"), body)
}

/// Split a leading `---` block into header and body.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---\n")?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn find_key(lines: &[String], key: &str) -> Option<usize> {
    lines.iter().position(|line| {
        line.strip_prefix(key)
            .is_some_and(|rest| rest.starts_with(':'))
    })
}

fn value_of<'a>(line: &'a str, key: &str) -> &'a str {
    line[key.len() + 1..].trim()
}
