#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub source: String,
    pub content_type: String,
}

/// Extracted text, one entry per page in page order.
#[derive(Debug, Clone)]
pub struct Document {
    pub pages: Vec<String>,
    pub metadata: DocumentMetadata,
}

impl Document {
    /// All pages joined by a single newline.
    #[must_use]
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whitespace-separated tokens across all pages.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.pages.iter().map(|p| p.split_whitespace().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pages: &[&str]) -> Document {
        Document {
            pages: pages.iter().map(|p| (*p).to_owned()).collect(),
            metadata: DocumentMetadata {
                source: "test".into(),
                content_type: "application/pdf".into(),
            },
        }
    }

    #[test]
    fn pages_joined_in_order_with_single_newline() {
        let d = doc(&["first page", "second page", "third"]);
        assert_eq!(d.text(), "first page\nsecond page\nthird");
        assert_eq!(d.page_count(), 3);
        assert_eq!(d.token_count(), 5);
    }

    #[test]
    fn empty_pages_keep_their_separator() {
        let d = doc(&["a", "", "b"]);
        assert_eq!(d.text(), "a\n\nb");
    }

    #[test]
    fn no_pages_is_empty_text() {
        assert!(doc(&[]).text().is_empty());
    }
}
