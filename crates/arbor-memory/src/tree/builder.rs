use std::sync::LazyLock;

use regex::Regex;

use super::NodeTree;

/// Title of the level-1 node holding text that precedes the first heading.
pub const INTRODUCTION_TITLE: &str = "Introduction";
pub const DEFAULT_ROOT_TITLE: &str = "Document";

const SUBSECTION_TITLE_CHARS: usize = 50;
const PARAGRAPH_TITLE_CHARS: usize = 40;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z \t/]+$").unwrap());

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+|[a-z])\.").unwrap());

/// Splits flat extracted text into root, section, subsection and paragraph nodes.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    root_title: String,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_TITLE)
    }
}

struct Section<'a> {
    title: &'a str,
    body: Vec<&'a str>,
}

impl TreeBuilder {
    /// A blank `root_title` falls back to [`DEFAULT_ROOT_TITLE`].
    #[must_use]
    pub fn new(root_title: impl Into<String>) -> Self {
        let root_title = root_title.into();
        let root_title = match root_title.trim() {
            "" => DEFAULT_ROOT_TITLE.to_owned(),
            trimmed if trimmed.len() == root_title.len() => root_title,
            trimmed => trimmed.to_owned(),
        };
        Self { root_title }
    }

    #[must_use]
    pub fn root_title(&self) -> &str {
        &self.root_title
    }

    /// Build a tree from `text`. Never fails; text without headings yields a
    /// root with at most an introduction child.
    #[must_use]
    pub fn build(&self, text: &str) -> NodeTree {
        let mut tree = NodeTree::with_root(&self.root_title);
        let root = tree.root_slot();

        let mut intro: Vec<&str> = Vec::new();
        let mut sections: Vec<Section<'_>> = Vec::new();
        for line in text.split('\n') {
            let line = line.trim_end_matches('\r');
            if HEADING_RE.is_match(line) {
                sections.push(Section {
                    title: line.trim(),
                    body: Vec::new(),
                });
            } else if let Some(section) = sections.last_mut() {
                section.body.push(line);
            } else {
                intro.push(line);
            }
        }

        let intro = intro.join("\n");
        let intro = intro.trim();
        if !intro.is_empty() {
            tree.push_child(root, INTRODUCTION_TITLE.to_owned(), intro.to_owned());
        }

        for section in &sections {
            let mut section_slot = None;
            for body in split_subsections(&section.body) {
                let paragraphs: Vec<&str> = body
                    .iter()
                    .map(|line| line.trim())
                    .filter(|line| !line.is_empty())
                    .collect();
                let Some(first) = paragraphs.first() else {
                    continue;
                };

                let parent = *section_slot.get_or_insert_with(|| {
                    tree.push_child(root, section.title.to_owned(), String::new())
                });
                let sub = tree.push_child(
                    parent,
                    truncate_chars(first, SUBSECTION_TITLE_CHARS),
                    paragraphs.join("\n"),
                );
                for paragraph in &paragraphs {
                    tree.push_child(
                        sub,
                        truncate_chars(paragraph, PARAGRAPH_TITLE_CHARS),
                        (*paragraph).to_owned(),
                    );
                }
            }
            if section_slot.is_none() {
                tracing::debug!(title = section.title, "dropping empty section");
            }
        }

        tracing::debug!(
            nodes = tree.len(),
            sections = sections.len(),
            "built chunk tree"
        );
        tree
    }
}

/// Split a section body at enumerated marker lines (`1.`, `12.`, `a.`).
/// The marker is removed and the rest of its line opens the next subsection.
fn split_subsections<'a>(body: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut subsections: Vec<Vec<&'a str>> = vec![Vec::new()];
    for &line in body {
        if let Some(marker) = MARKER_RE.find(line) {
            subsections.push(vec![&line[marker.end()..]]);
        } else if let Some(current) = subsections.last_mut() {
            current.push(line);
        }
    }
    subsections
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
