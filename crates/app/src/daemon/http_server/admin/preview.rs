use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Form;
use pulldown_cmark::{html, Options, Parser};
use serde::Deserialize;

use crate::ServiceState;

#[derive(Template)]
#[template(path = "pages/preview.html")]
pub struct PreviewTemplate {
    pub title: String,
    pub preview_css: Option<String>,
    pub body: PreviewBody,
}

pub enum PreviewBody {
    /// Already-rendered HTML
    Html(String),
    /// Shown verbatim
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct PreviewForm {
    #[serde(default)]
    pub filename: String,
    /// The editor form posts its buffer as `contents`
    #[serde(default, alias = "contents")]
    pub source: String,
}

/// Render an editor buffer without touching the disk.
pub fn render(filename: &str, source: &str) -> PreviewBody {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "md" | "mdwn" | "mdown" | "markdown" | "mmd" | "gfm" => {
            let options = Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
            let parser = Parser::new_ext(source, options);
            let mut out = String::with_capacity(source.len() * 3 / 2);
            html::push_html(&mut out, parser);
            PreviewBody::Html(out)
        }
        "html" | "htm" => PreviewBody::Html(source.to_string()),
        _ => PreviewBody::Text(source.to_string()),
    }
}

#[tracing::instrument(skip(state, form), fields(filename = %form.filename, len = form.source.len()))]
pub async fn handler(State(state): State<ServiceState>, Form(form): Form<PreviewForm>) -> Response {
    let template = PreviewTemplate {
        title: form.filename.clone(),
        preview_css: state.config().preview_css.clone(),
        body: render(&form.filename, &form.source),
    };
    template.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_is_rendered_without_front_matter() {
        let source = "---\ntitle: Hello\n---\n\n# Hello\n\n| a | b |\n|---|---|\n| 1 | 2 |\n";
        let PreviewBody::Html(html) = render("posts/hello.md", source) else {
            panic!("markdown should render to html");
        };
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<table>"));
        assert!(!html.contains("title: Hello"));
    }

    #[test]
    fn test_html_passes_through_and_other_text_is_verbatim() {
        assert!(matches!(
            render("page.html", "<p>x</p>"),
            PreviewBody::Html(ref s) if s == "<p>x</p>"
        ));
        assert!(matches!(
            render("data.yaml", "<b>a</b>"),
            PreviewBody::Text(ref s) if s == "<b>a</b>"
        ));
    }
}
