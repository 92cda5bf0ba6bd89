//! services/web/src/adapters/templates.rs
//!
//! This module contains the page renderer, which implements the `PageRenderer`
//! port from the `core` crate by filling placeholders in HTML files read from
//! the templates directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use visit_core::domain::PageView;
use visit_core::ports::{PageRenderer, PortError, PortResult};

const INDEX_TEMPLATE: &str = "index.html";
const DOCUMENT_TEMPLATE: &str = "document.html";
const EXAMPLE_TEMPLATE: &str = "document_example.html";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Renders the index page from `index.html` plus a content fragment.
///
/// Templates are read per render so edits show up without a restart.
#[derive(Clone, Debug)]
pub struct TemplateRenderer {
    dir: PathBuf,
}

impl TemplateRenderer {
    /// Creates a new `TemplateRenderer` reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read(&self, name: &str) -> PortResult<String> {
        let path = self.dir.join(name);
        read_template(&path).await
    }
}

async fn read_template(path: &Path) -> PortResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PortError::NotFound(path.display().to_string()),
        _ => PortError::Unexpected(format!("{}: {}", path.display(), e)),
    })
}

//=========================================================================================
// `PageRenderer` Trait Implementation
//=========================================================================================

#[async_trait]
impl PageRenderer for TemplateRenderer {
    async fn render(&self, view: &PageView) -> PortResult<String> {
        let index = self.read(INDEX_TEMPLATE).await?;
        let fragment = if view.authenticated {
            self.read(DOCUMENT_TEMPLATE).await?
        } else {
            self.read(EXAMPLE_TEMPLATE).await?
        };

        let document_json = crate::web::protocol::DocumentBody::from_domain(&view.document)
            .to_json()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // The fragment goes in first so its own placeholders are filled too.
        Ok(index
            .replace("{{ content }}", &fragment)
            .replace("{{ user_id }}", &view.document.owner_id.to_string())
            .replace("{{ user_name }}", &escape_html(&view.document.owner_name))
            .replace("{{ document }}", &escape_script_json(&document_json)))
    }
}

//=========================================================================================
// Escaping Helpers
//=========================================================================================

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Makes JSON safe to embed inside a `<script>` element.
fn escape_script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use visit_core::domain::{Document, Identity};

    fn write_templates(dir: &Path) {
        std::fs::write(
            dir.join(INDEX_TEMPLATE),
            "<h1>{{ user_name }}</h1>{{ content }}",
        )
        .unwrap();
        std::fs::write(
            dir.join(DOCUMENT_TEMPLATE),
            "<script>var doc = {{ document }};</script><p>{{ user_id }}</p>",
        )
        .unwrap();
        std::fs::write(dir.join(EXAMPLE_TEMPLATE), "<p>example</p>").unwrap();
    }

    #[tokio::test]
    async fn test_render_authenticated_view() {
        let dir = tempdir().unwrap();
        write_templates(dir.path());
        let renderer = TemplateRenderer::new(dir.path());
        let mut document = Document::default().owned_by(&Identity::new(42, "<Alice>"));
        document.payload = json!({"note": "</script>"}).as_object().cloned();

        let html = renderer
            .render(&PageView { document, authenticated: true })
            .await
            .unwrap();

        assert!(html.starts_with("<h1>&lt;Alice&gt;</h1>"));
        assert!(html.contains("<p>42</p>"));
        assert!(html.contains("\\u003c/script\\u003e"));
        assert!(!html.contains("example"));
    }

    #[tokio::test]
    async fn test_render_visitor_view_uses_example_fragment() {
        let dir = tempdir().unwrap();
        write_templates(dir.path());
        let renderer = TemplateRenderer::new(dir.path());
        let document = Document::default().owned_by(&Identity::visitor());

        let html = renderer
            .render(&PageView { document, authenticated: false })
            .await
            .unwrap();

        assert_eq!(html, "<h1>Visitor</h1><p>example</p>");
    }

    #[tokio::test]
    async fn test_render_missing_template_is_not_found() {
        let dir = tempdir().unwrap();
        let renderer = TemplateRenderer::new(dir.path());

        let err = renderer
            .render(&PageView {
                document: Document::default(),
                authenticated: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
