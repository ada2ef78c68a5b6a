use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::Deserialize;

use common::content::check_editable;
use common::path_guard::join_relative;
use common::prelude::*;

use super::{admin_url, edit_url, list_url, RootPath};
use crate::daemon::http_server::error::AdminError;
use crate::ServiceState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub q: Option<String>,
    pub page: Option<usize>,
}

/// A listing entry with its links worked out.
pub struct Row {
    pub name: String,
    pub is_directory: bool,
    pub size: String,
    pub modified: String,
    pub open_href: Option<String>,
    pub delete_href: String,
}

pub struct Crumb {
    pub name: String,
    pub href: String,
}

#[derive(Template)]
#[template(path = "pages/list.html")]
pub struct ListTemplate {
    pub flash: Option<FlashMessage>,
    pub listing: Listing,
    pub location: String,
    pub crumbs: Vec<Crumb>,
    pub rows: Vec<Row>,
    pub directories: Vec<String>,
    pub sort: SortOrder,
    pub search: String,
    pub create_suffix: String,
    pub self_href: String,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

impl ListTemplate {
    pub fn by_date(&self) -> bool {
        self.sort == SortOrder::Mtime
    }
}

#[tracing::instrument(skip(state, session))]
pub async fn handler(
    State(state): State<ServiceState>,
    Extension(session): Extension<Session>,
    Path(path): Path<RootPath>,
    Query(query): Query<ListQuery>,
) -> Result<Response, AdminError> {
    let root = path.root()?;
    let sort: SortOrder = query
        .sort
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    let search = query.q.unwrap_or_default();
    let listing = state
        .content()
        .list(
            root,
            &path.path,
            sort,
            Some(search.as_str()),
            query.page.unwrap_or(1),
        )
        .await?;
    let directories = state.content().directories().await?;
    let flash = state.sessions().flash().take(&session).await?;

    let rows = listing
        .entries
        .iter()
        .map(|entry| {
            let rel = join_relative(&listing.dir, &entry.name);
            let (open_href, delete_href) = if entry.is_directory {
                (
                    Some(list_url(root, &rel)),
                    admin_url(&format!("/rmdir/{}/{}", root, rel)),
                )
            } else {
                (
                    check_editable(&entry.name)
                        .ok()
                        .map(|_| edit_url(root, &rel)),
                    admin_url(&format!("/delete/{}/{}", root, rel)),
                )
            };
            Row {
                name: entry.name.clone(),
                is_directory: entry.is_directory,
                size: human_size(entry.size),
                modified: entry.modified_at.format("%Y-%m-%d %H:%M").to_string(),
                open_href,
                delete_href,
            }
        })
        .collect();

    let create_suffix = if listing.dir.is_empty() {
        root.to_string()
    } else {
        format!("{}/{}", root, listing.dir)
    };
    let self_href = list_url(root, &listing.dir);
    let previous_href = listing
        .has_previous()
        .then(|| page_href(&self_href, sort, &search, listing.page - 1));
    let next_href = listing
        .has_next()
        .then(|| page_href(&self_href, sort, &search, listing.page + 1));
    let template = ListTemplate {
        flash,
        location: listing.location(),
        crumbs: breadcrumbs(root, &listing.dir),
        self_href,
        previous_href,
        next_href,
        rows,
        directories,
        sort,
        search,
        create_suffix,
        listing,
    };
    Ok(template.into_response())
}

fn breadcrumbs(root: Root, dir: &str) -> Vec<Crumb> {
    let mut crumbs = vec![Crumb {
        name: root.to_string(),
        href: list_url(root, ""),
    }];
    let mut so_far = String::new();
    for seg in dir.split('/').filter(|s| !s.is_empty()) {
        so_far = join_relative(&so_far, seg);
        crumbs.push(Crumb {
            name: seg.to_string(),
            href: list_url(root, &so_far),
        });
    }
    crumbs
}

/// Link to another page of the same listing, keeping sort and search.
fn page_href(self_href: &str, sort: SortOrder, search: &str, page: usize) -> String {
    let mut href = format!("{}?page={}", self_href, page);
    if sort == SortOrder::Mtime {
        href.push_str("&sort=date");
    }
    if !search.is_empty() {
        href.push_str("&q=");
        href.push_str(&encode_query(search));
    }
    href
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

fn encode_query(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            b' ' => "+".to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breadcrumbs() {
        let crumbs = breadcrumbs(Root::Content, "posts/2024");
        let hrefs: Vec<_> = crumbs.iter().map(|c| c.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec![
                "/_/admin/list/content",
                "/_/admin/list/content/posts",
                "/_/admin/list/content/posts/2024",
            ]
        );
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_page_href_keeps_sort_and_search() {
        assert_eq!(
            page_href("/_/admin/list/content", SortOrder::Name, "", 2),
            "/_/admin/list/content?page=2"
        );
        assert_eq!(
            page_href("/_/admin/list/content/posts", SortOrder::Mtime, "é t", 3),
            "/_/admin/list/content/posts?page=3&sort=date&q=%C3%A9+t"
        );
    }

    #[test]
    fn test_encode_query() {
        assert_eq!(encode_query("café au lait"), "caf%C3%A9+au+lait");
    }
}
