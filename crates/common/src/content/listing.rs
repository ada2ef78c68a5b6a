use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::slug::matches_search;
use crate::layout::Root;

pub const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Alphabetical
    #[default]
    Name,
    /// Most recently modified first
    Mtime,
}

impl FromStr for SortOrder {
    type Err = std::convert::Infallible;

    /// Anything other than `date` or `mtime` sorts by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "date" | "mtime" => SortOrder::Mtime,
            _ => SortOrder::Name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub modified_at: DateTime<Local>,
}

/// One page of a directory listing.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub root: Root,
    /// Directory relative to the root, without leading or trailing slashes
    pub dir: String,
    pub entries: Vec<DirEntry>,
    pub page: usize,
    pub total_pages: usize,
    /// Entries matching the search, across all pages
    pub total_entries: usize,
}

impl Listing {
    pub(super) fn paginate(
        root: Root,
        dir: String,
        mut entries: Vec<DirEntry>,
        sort: SortOrder,
        search: Option<&str>,
        page: usize,
    ) -> Self {
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            entries.retain(|e| matches_search(&e.name, term));
        }
        match sort {
            SortOrder::Name => entries.sort_by(|a, b| a.name.cmp(&b.name)),
            SortOrder::Mtime => entries.sort_by(|a, b| {
                b.modified_at
                    .cmp(&a.modified_at)
                    .then_with(|| a.name.cmp(&b.name))
            }),
        }

        let total_entries = entries.len();
        let total_pages = total_entries.div_ceil(PAGE_SIZE).max(1);
        let page = page.max(1);
        let entries = entries
            .into_iter()
            .skip((page - 1).saturating_mul(PAGE_SIZE))
            .take(PAGE_SIZE)
            .collect();
        Self {
            root,
            dir,
            entries,
            page,
            total_pages,
            total_entries,
        }
    }

    /// `content` or `content/posts`, as shown in breadcrumbs and messages.
    pub fn location(&self) -> String {
        if self.dir.is_empty() {
            self.root.to_string()
        } else {
            format!("{}/{}", self.root, self.dir)
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entries(n: usize) -> Vec<DirEntry> {
        let base = Local::now();
        (0..n)
            .map(|i| DirEntry {
                name: format!("file-{:03}.md", i),
                is_directory: false,
                size: i as u64,
                modified_at: base + Duration::seconds(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_pages_are_bounded() {
        let listing = Listing::paginate(
            Root::Content,
            String::new(),
            entries(120),
            SortOrder::Name,
            None,
            3,
        );
        assert_eq!(listing.total_pages, 3);
        assert_eq!(listing.total_entries, 120);
        assert_eq!(listing.entries.len(), 20);
        assert_eq!(listing.entries[0].name, "file-100.md");
        assert!(listing.has_previous());
        assert!(!listing.has_next());
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let listing =
            Listing::paginate(Root::Data, String::new(), entries(10), SortOrder::Name, None, 9);
        assert!(listing.entries.is_empty());
        assert_eq!(listing.total_pages, 1);
    }

    #[test]
    fn test_page_zero_means_first() {
        let listing =
            Listing::paginate(Root::Data, String::new(), entries(3), SortOrder::Name, None, 0);
        assert_eq!(listing.page, 1);
        assert_eq!(listing.entries.len(), 3);
    }

    #[test]
    fn test_date_sort_is_newest_first() {
        let listing =
            Listing::paginate(Root::Static, "img".into(), entries(5), SortOrder::Mtime, None, 1);
        assert_eq!(listing.entries[0].name, "file-004.md");
        assert_eq!(listing.location(), "static/img");
    }

    #[test]
    fn test_search_filters_before_paging() {
        let listing = Listing::paginate(
            Root::Content,
            String::new(),
            entries(120),
            SortOrder::Name,
            Some("File 11"),
            1,
        );
        let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names.len(), 10);
        assert_eq!(names.first(), Some(&"file-110.md"));
        assert_eq!(names.last(), Some(&"file-119.md"));
        assert_eq!(listing.total_entries, 10);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("date".parse::<SortOrder>().unwrap(), SortOrder::Mtime);
        assert_eq!("bogus".parse::<SortOrder>().unwrap(), SortOrder::Name);
    }
}
