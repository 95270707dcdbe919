//! Locating the watched element inside a fetched page

use scraper::{Html, Selector};

/// Selects a single element by tag and `id` attribute
#[derive(Debug, Clone)]
pub struct ElementSelector {
    element_id: String,
    selector: Selector,
}

impl ElementSelector {
    /// Build a selector for `<tag id="element_id">`. An empty tag matches any element.
    pub fn new(tag: &str, element_id: &str) -> crate::Result<Self> {
        if element_id.trim().is_empty() {
            return Err(crate::PageWatchError::Config(
                "element id must not be empty".to_string(),
            ));
        }

        let css = format!(
            r#"{}[id="{}"]"#,
            tag.trim(),
            element_id.replace('\\', "\\\\").replace('"', "\\\"")
        );
        let selector = Selector::parse(&css).map_err(|e| crate::PageWatchError::Selector {
            selector: css.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            element_id: element_id.to_string(),
            selector,
        })
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Serialized HTML of the first matching element, or `None` when absent or empty
    pub fn extract(&self, body: &str) -> Option<String> {
        let document = Html::parse_document(body);
        document
            .select(&self.selector)
            .next()
            .filter(|element| !element.inner_html().trim().is_empty())
            .map(|element| element.html())
    }
}
