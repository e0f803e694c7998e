//! Rendering contexts and the renderer collaborator.
//!
//! Each page kind has its own context type, so a template can only be handed
//! the fields it was written against.

use chrono::NaiveDate;
use postpigeon_storage::{Fingerprint, PostId};
use thiserror::Error;

/// Errors raised by a [`Renderer`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RenderError {
    /// A template failed to load or execute.
    #[error("template {template} failed: {message}")]
    Template {
        /// Template name.
        template: &'static str,
        /// Failure description.
        message: String,
    },

    /// The post body could not be converted to HTML.
    #[error("cannot render body: {0}")]
    Body(String),
}

/// Context of a single post page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPage {
    /// Post title.
    pub title: String,
    /// Body as submitted by the author.
    pub body: String,
    /// Author fingerprint.
    pub fingerprint: Fingerprint,
    /// Publication date.
    pub created_on: NaiveDate,
}

/// One post in an author listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Content identifier.
    pub id: PostId,
    /// Post title.
    pub title: String,
    /// Publication date.
    pub created_on: NaiveDate,
}

/// Context of an author's post listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostListing {
    /// Author fingerprint.
    pub fingerprint: Fingerprint,
    /// Posts, oldest first.
    pub entries: Vec<ListingEntry>,
}

impl PostListing {
    /// Returns `true` if the author has no posts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns rendering contexts into sanitized HTML.
///
/// Implementations must neutralize script injection in every field that
/// originates from an author. Rendering is pure from the caller's point of
/// view and may run on any thread.
pub trait Renderer: Send + Sync {
    /// Renders a post page.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the page cannot be produced.
    fn render_post(&self, page: &PostPage) -> Result<String, RenderError>;

    /// Renders an author listing.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the page cannot be produced.
    fn render_listing(&self, listing: &PostListing) -> Result<String, RenderError>;
}

/// Minimal renderer that HTML-escapes every field and splits the body into
/// paragraphs on blank lines. No markup in the body is interpreted.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRenderer;

impl PlainRenderer {
    /// Creates a renderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for PlainRenderer {
    fn render_post(&self, page: &PostPage) -> Result<String, RenderError> {
        let mut html = String::with_capacity(page.body.len() + page.title.len() + 128);
        html.push_str("<article><h1>");
        escape_into(&mut html, &page.title);
        html.push_str("</h1><p class=\"byline\">");
        escape_into(&mut html, page.fingerprint.as_str());
        html.push(' ');
        html.push_str(&page.created_on.format("%Y-%m-%d").to_string());
        html.push_str("</p>");

        let normalized = page.body.replace("\r\n", "\n");
        for paragraph in normalized.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            html.push_str("<p>");
            escape_into(&mut html, paragraph);
            html.push_str("</p>");
        }
        html.push_str("</article>");
        Ok(html)
    }

    fn render_listing(&self, listing: &PostListing) -> Result<String, RenderError> {
        let mut html = String::from("<section><h1>");
        escape_into(&mut html, listing.fingerprint.as_str());
        html.push_str("</h1><ul>");
        for entry in &listing.entries {
            html.push_str(&format!("<li><a href=\"/posts/{}\">", entry.id));
            escape_into(&mut html, &entry.title);
            html.push_str(&format!("</a> {}</li>", entry.created_on.format("%Y-%m-%d")));
        }
        html.push_str("</ul></section>");
        Ok(html)
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
}
