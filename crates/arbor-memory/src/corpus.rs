//! The searchable document collection, loaded from CSV, JSON Lines or a JSON array.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("failed to read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid corpus record on line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid corpus JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid corpus CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported corpus format: {0} (expected .csv, .jsonl, .ndjson or .json)")]
    UnsupportedFormat(String),

    #[error("corpus has no documents")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusDocument {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<CorpusDocument>,
}

impl Corpus {
    /// # Errors
    ///
    /// Returns [`CorpusError::Empty`] when `documents` is empty.
    pub fn new(documents: Vec<CorpusDocument>) -> Result<Self, CorpusError> {
        if documents.is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(Self { documents })
    }

    /// Load a corpus file, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError`] if the file is unreadable, malformed, of an
    /// unknown format, or holds no documents.
    pub async fn load(path: &Path) -> Result<Self, CorpusError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !matches!(ext.as_str(), "csv" | "jsonl" | "ndjson" | "json") {
            return Err(CorpusError::UnsupportedFormat(path.display().to_string()));
        }

        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CorpusError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let corpus = match ext.as_str() {
            "csv" => Self::from_csv(&raw)?,
            "json" => Self::from_json_array(&raw)?,
            _ => Self::from_json_lines(&raw)?,
        };
        tracing::info!(path = %path.display(), documents = corpus.len(), "corpus loaded");
        Ok(corpus)
    }

    /// One JSON object per line; blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Line`] with the 1-based line number of the first
    /// malformed record, or [`CorpusError::Empty`].
    pub fn from_json_lines(raw: &str) -> Result<Self, CorpusError> {
        let mut documents = Vec::new();
        for (i, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let doc = serde_json::from_str(line)
                .map_err(|source| CorpusError::Line { line: i + 1, source })?;
            documents.push(doc);
        }
        Self::new(documents)
    }

    /// CSV with a header row naming a `content` column and, optionally, a
    /// `title` column. Other columns are ignored; an empty title counts as none.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Csv`] for a malformed row or missing `content`
    /// column, or [`CorpusError::Empty`].
    pub fn from_csv(raw: &str) -> Result<Self, CorpusError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(raw.as_bytes());
        let documents = reader
            .deserialize::<CorpusDocument>()
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(documents)
    }

    /// # Errors
    ///
    /// Returns [`CorpusError::Json`] for malformed input or [`CorpusError::Empty`].
    pub fn from_json_array(raw: &str) -> Result<Self, CorpusError> {
        Self::new(serde_json::from_str(raw)?)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CorpusDocument> {
        self.documents.get(index)
    }

    /// Title of the document at `index`, or `Doc {index}` when it has none.
    #[must_use]
    pub fn title(&self, index: usize) -> Cow<'_, str> {
        match self
            .documents
            .get(index)
            .and_then(|d| d.title.as_deref())
            .filter(|t| !t.trim().is_empty())
        {
            Some(title) => Cow::Borrowed(title),
            None => Cow::Owned(format!("Doc {index}")),
        }
    }

    #[must_use]
    pub fn content(&self, index: usize) -> Option<&str> {
        self.documents.get(index).map(|d| d.content.as_str())
    }

    /// All contents in corpus order.
    pub fn contents(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.content.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_lines_skip_blank_lines() {
        let raw = "{\"title\": \"A\", \"content\": \"alpha\"}\n\n{\"content\": \"beta\"}\n";
        let corpus = Corpus::from_json_lines(raw).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.title(0), "A");
        assert_eq!(corpus.title(1), "Doc 1");
        assert_eq!(corpus.content(1), Some("beta"));
    }

    #[test]
    fn blank_title_falls_back() {
        let corpus = Corpus::new(vec![CorpusDocument {
            title: Some("  ".into()),
            content: "x".into(),
        }])
        .unwrap();
        assert_eq!(corpus.title(0), "Doc 0");
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let raw = "{\"content\": \"ok\"}\n{not json}\n";
        assert!(matches!(
            Corpus::from_json_lines(raw),
            Err(CorpusError::Line { line: 2, .. })
        ));
    }

    #[test]
    fn missing_content_is_rejected() {
        assert!(Corpus::from_json_array(r#"[{"title": "no body"}]"#).is_err());
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(matches!(
            Corpus::from_json_lines("\n\n"),
            Err(CorpusError::Empty)
        ));
        assert!(matches!(
            Corpus::from_json_array("[]"),
            Err(CorpusError::Empty)
        ));
    }

    #[tokio::test]
    async fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let jsonl = dir.path().join("corpus.jsonl");
        std::fs::write(&jsonl, "{\"title\": \"T\", \"content\": \"c\"}\n").unwrap();
        let corpus = Corpus::load(&jsonl).await.unwrap();
        assert_eq!(corpus.contents().collect::<Vec<_>>(), ["c"]);

        let json = dir.path().join("corpus.json");
        std::fs::write(&json, r#"[{"content": "a"}, {"content": "b"}]"#).unwrap();
        assert_eq!(Corpus::load(&json).await.unwrap().len(), 2);

        let csv = dir.path().join("corpus.CSV");
        std::fs::write(&csv, "title,content\nT,from csv\n").unwrap();
        assert_eq!(Corpus::load(&csv).await.unwrap().content(0), Some("from csv"));

        let txt = dir.path().join("corpus.txt");
        std::fs::write(&txt, "plain").unwrap();
        assert!(matches!(
            Corpus::load(&txt).await,
            Err(CorpusError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn csv_reads_title_and_content_columns() {
        let raw = "id,title,content\n\
                   1,Relativity,\"Einstein, Albert: relativity\"\n\
                   2,,\"Newton\nand gravity\"\n";
        let corpus = Corpus::from_csv(raw).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.title(0), "Relativity");
        assert_eq!(corpus.content(0), Some("Einstein, Albert: relativity"));
        assert_eq!(corpus.title(1), "Doc 1");
        assert_eq!(corpus.content(1), Some("Newton\nand gravity"));
    }

    #[test]
    fn csv_without_title_column() {
        let corpus = Corpus::from_csv("content\nalpha\nbeta\n").unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.title(1), "Doc 1");
    }

    #[test]
    fn csv_errors() {
        assert!(matches!(
            Corpus::from_csv("title,body\nA,text\n"),
            Err(CorpusError::Csv(_))
        ));
        assert!(matches!(
            Corpus::from_csv("title,content\n"),
            Err(CorpusError::Empty)
        ));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let result = Corpus::load(Path::new("/nonexistent/corpus.jsonl")).await;
        assert!(matches!(result, Err(CorpusError::Io { .. })));
    }
}
