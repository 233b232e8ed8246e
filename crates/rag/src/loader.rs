use scraper::{Html, Selector};

use crate::error::Error;

/// Loads a web page and extracts its text content.
///
/// An optional CSS selector narrows extraction down to the matching
/// elements (e.g. the post body of a blog); without one, the whole
/// document text is used.
pub struct WebLoader {
    client: reqwest::Client,
    selector: Option<String>,
}

impl WebLoader {
    /// Creates a loader that extracts text from the whole document.
    #[inline]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            selector: None,
        }
    }

    /// Restricts extraction to elements matching a CSS selector.
    #[inline]
    pub fn with_selector<S: Into<String>>(mut self, selector: S) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Fetches `url` and returns the extracted text.
    pub async fn load(&self, url: &str) -> Result<String, Error> {
        debug!("loading document from {url}");
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = extract_text(&body, self.selector.as_deref())?;
        if text.is_empty() {
            return Err(Error::EmptyDocument);
        }
        debug!("extracted {} characters", text.len());
        Ok(text)
    }
}

impl Default for WebLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses an HTML document and extracts normalized text, optionally
/// filtered by a CSS selector.
fn extract_text(html: &str, selector: Option<&str>) -> Result<String, Error> {
    let document = Html::parse_document(html);
    let selector = selector.unwrap_or("body");
    let parsed = Selector::parse(selector)
        .map_err(|_| Error::InvalidSelector(selector.to_owned()))?;

    let mut blocks = Vec::new();
    for element in document.select(&parsed) {
        // Runs of whitespace inside a block carry no meaning in HTML.
        let block = element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");
        if !block.is_empty() {
            blocks.push(block);
        }
    }
    Ok(blocks.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <nav>Home   About</nav>
            <div class="post-content">
                <h1>Agents</h1>
                <p>Agents   use
                   tools.</p>
            </div>
            <div class="post-content"><p>They also plan.</p></div>
            <footer>Copyright</footer>
        </body></html>
    "#;

    #[test]
    fn test_selector_filters_elements() {
        let text = extract_text(PAGE, Some("div.post-content")).unwrap();
        assert_eq!(text, "Agents Agents use tools.\n\nThey also plan.");
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_no_selector_takes_whole_body() {
        let text = extract_text(PAGE, None).unwrap();
        assert!(text.contains("Home About"));
        assert!(text.contains("Copyright"));
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        assert!(matches!(
            extract_text(PAGE, Some("div[")),
            Err(Error::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_no_matches_yields_empty_text() {
        let text = extract_text(PAGE, Some("article")).unwrap();
        assert!(text.is_empty());
    }
}
