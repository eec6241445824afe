//! Plain document sources feeding the builder.
//!
//! Both sources hand out documents with doc ids assigned 1.. in corpus order.

use crate::analysis::TextEncoding;
use crate::error::SourceError;
use crate::types::{DocId, DocMetadata, Document};
use futures::stream::{self, BoxStream, StreamExt};
use ignore::WalkBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Stream of documents consumed by [`crate::IndexBuilder::build_stream`].
pub type DocumentStream = BoxStream<'static, Result<Document, SourceError>>;

/// Wrap already-extracted documents as a stream.
pub fn from_documents(documents: Vec<Document>) -> DocumentStream {
    stream::iter(documents.into_iter().map(Ok)).boxed()
}

/// Drain a stream into memory, skipping documents that failed to load.
///
/// Only a fatal source error is returned.
pub async fn collect_documents(mut documents: DocumentStream) -> Result<Vec<Document>, SourceError> {
    let mut collected = Vec::new();
    while let Some(item) = documents.next().await {
        match item {
            Ok(doc) => collected.push(doc),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::warn!("Skipping document: {}", e),
        }
    }
    Ok(collected)
}

/// One document per file under a directory, visited in sorted path order.
///
/// Hidden files and anything excluded by `.gitignore`/`.ignore` files are skipped. The
/// title is the file stem and the url is the file path.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    encoding: TextEncoding,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            encoding: TextEncoding::default(),
        }
    }

    pub const fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn into_stream(self) -> DocumentStream {
        let Self { root, encoding } = self;
        stream::once(list_files(root))
            .flat_map(move |listed| match listed {
                Ok(paths) => stream::iter(paths.into_iter().zip(1..))
                    .then(move |(path, doc_id)| read_file(path, doc_id, encoding))
                    .boxed(),
                Err(e) => stream::iter([Err(e)]).boxed(),
            })
            .boxed()
    }
}

async fn list_files(root: PathBuf) -> Result<Vec<PathBuf>, SourceError> {
    if !root.is_dir() {
        return Err(SourceError::Unreachable(format!(
            "{} is not a readable directory",
            root.display()
        )));
    }

    tokio::task::spawn_blocking(move || {
        let mut paths: Vec<PathBuf> = WalkBuilder::new(&root)
            .build()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
            .map(ignore::DirEntry::into_path)
            .collect();
        paths.sort();
        tracing::info!("Found {} documents under {}", paths.len(), root.display());
        paths
    })
    .await
    .map_err(|e| SourceError::Unreachable(format!("directory walk failed: {e}")))
}

async fn read_file(path: PathBuf, doc_id: DocId, encoding: TextEncoding) -> Result<Document, SourceError> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| SourceError::MissingText {
            doc_id,
            reason: format!("{}: {e}", path.display()),
        })?;
    let text = encoding.decode(&bytes);
    if text.trim().is_empty() {
        return Err(SourceError::MissingText {
            doc_id,
            reason: format!("{} is empty", path.display()),
        });
    }

    Ok(Document::new(doc_id, text).with_metadata(DocMetadata {
        url: Some(path.display().to_string()),
        title: file_stem(&path),
    }))
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned())
}

/// One JSON object per line: `{"title": ..., "url": ..., "text": ...}`.
///
/// `title` and `url` are optional. Lines that do not parse are skipped with a warning and
/// do not consume a doc id; blank lines are ignored. The file is read one line at a time.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
    encoding: TextEncoding,
}

#[derive(Debug, Deserialize)]
struct JsonLine {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    text: String,
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: TextEncoding::default(),
        }
    }

    pub const fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn into_stream(self) -> DocumentStream {
        stream::once(LineReader::open(self.path, self.encoding))
            .flat_map(|opened| match opened {
                Ok(reader) => stream::unfold(reader, LineReader::next_document).boxed(),
                Err(e) => stream::iter([Err(e)]).boxed(),
            })
            .boxed()
    }
}

struct LineReader {
    path: PathBuf,
    reader: BufReader<File>,
    encoding: TextEncoding,
    parser: LineParser,
    buf: Vec<u8>,
    failed: bool,
}

impl LineReader {
    async fn open(path: PathBuf, encoding: TextEncoding) -> Result<Self, SourceError> {
        let file = File::open(&path)
            .await
            .map_err(|e| SourceError::Unreachable(format!("{}: {e}", path.display())))?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            encoding,
            parser: LineParser::new(),
            buf: Vec::new(),
            failed: false,
        })
    }

    /// Read lines until one yields a document or an error; `None` at end of file.
    async fn next_document(mut self) -> Option<(Result<Document, SourceError>, Self)> {
        if self.failed {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf).await {
                Ok(0) => return None,
                Ok(_) => {
                    let line = self.encoding.decode(&self.buf);
                    if let Some(item) = self.parser.parse(&line) {
                        return Some((item, self));
                    }
                }
                Err(e) => {
                    self.failed = true;
                    let error = SourceError::Unreachable(format!("{}: {e}", self.path.display()));
                    return Some((Err(error), self));
                }
            }
        }
    }
}

/// Assigns doc ids 1.. to the well-formed lines it is fed, in order.
#[derive(Debug)]
struct LineParser {
    next_id: DocId,
    line_no: usize,
}

impl LineParser {
    const fn new() -> Self {
        Self {
            next_id: 1,
            line_no: 0,
        }
    }

    /// `None` for blank and malformed lines.
    fn parse(&mut self, line: &str) -> Option<Result<Document, SourceError>> {
        self.line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let parsed: JsonLine = match serde_json::from_str(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Skipping malformed line {}: {}", self.line_no, e);
                return None;
            }
        };

        let doc_id = self.next_id;
        self.next_id += 1;
        if parsed.text.trim().is_empty() {
            return Some(Err(SourceError::MissingText {
                doc_id,
                reason: format!("line {} has empty text", self.line_no),
            }));
        }
        Some(Ok(Document::new(doc_id, parsed.text).with_metadata(DocMetadata {
            url: parsed.url,
            title: parsed.title,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use tempfile::TempDir;

    #[test]
    fn test_line_parser_skips_malformed() {
        let content = r#"{"title": "One", "url": "https://example.org/1", "text": "Cat Dog"}
not json at all

{"text": "Dog Bird 123"}
{"title": "Empty", "text": "   "}
"#;
        let mut parser = LineParser::new();
        let parsed: Vec<_> = content.lines().filter_map(|line| parser.parse(line)).collect();
        check!(parsed.len() == 3);

        let_assert!(Ok(first) = &parsed[0]);
        check!(first.doc_id == 1);
        check!(first.metadata == DocMetadata::new("https://example.org/1", "One"));

        let_assert!(Ok(second) = &parsed[1]);
        check!(second.doc_id == 2);
        check!(second.metadata.is_empty());

        let_assert!(Err(SourceError::MissingText { doc_id: 3, .. }) = &parsed[2]);
    }

    #[tokio::test]
    async fn test_directory_source_sorted_ids() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "Dog Bird 123").unwrap();
        std::fs::write(dir.path().join("a.txt"), "Cat Dog").unwrap();
        std::fs::write(dir.path().join("c.txt"), "").unwrap();

        let docs: Vec<_> = DirectorySource::new(dir.path()).into_stream().collect().await;
        check!(docs.len() == 3);

        let_assert!(Ok(first) = &docs[0]);
        check!(first.doc_id == 1);
        check!(first.text == "Cat Dog");
        check!(first.metadata.title.as_deref() == Some("a"));

        let_assert!(Ok(second) = &docs[1]);
        check!(second.doc_id == 2);

        let_assert!(Err(SourceError::MissingText { doc_id: 3, .. }) = &docs[2]);
    }

    #[tokio::test]
    async fn test_directory_source_latin1() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("doc.txt"), b"caf\xe9").unwrap();

        let docs: Vec<_> = DirectorySource::new(dir.path())
            .with_encoding(TextEncoding::Latin1)
            .into_stream()
            .collect()
            .await;
        let_assert!([Ok(doc)] = docs.as_slice());
        check!(doc.text == "café");
    }

    #[tokio::test]
    async fn test_json_lines_source_reads_lazily_decoded_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs.jsonl");
        let mut content = b"{\"title\": \"One\", \"text\": \"caf\xe9 dog\"}\r\n".to_vec();
        content.extend_from_slice(b"{broken\n\n{\"text\": \"bird\"}");
        std::fs::write(&path, content).unwrap();

        let docs: Vec<_> = JsonLinesSource::new(&path)
            .with_encoding(TextEncoding::Latin1)
            .into_stream()
            .collect()
            .await;
        let_assert!([Ok(first), Ok(second)] = docs.as_slice());
        check!(first.doc_id == 1);
        check!(first.text == "café dog");
        check!(first.metadata.title.as_deref() == Some("One"));
        check!(second.doc_id == 2);
        check!(second.text == "bird");
    }

    #[tokio::test]
    async fn test_collect_documents_skips_missing_text() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Cat Dog").unwrap();
        std::fs::write(dir.path().join("b.txt"), " ").unwrap();

        let docs = collect_documents(DirectorySource::new(dir.path()).into_stream())
            .await
            .unwrap();
        check!(docs.iter().map(|d| d.doc_id).collect::<Vec<_>>() == [1]);

        let missing = collect_documents(DirectorySource::new(dir.path().join("nope")).into_stream()).await;
        let_assert!(Err(SourceError::Unreachable(_)) = missing);
    }

    #[tokio::test]
    async fn test_unreachable_sources() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let docs: Vec<_> = DirectorySource::new(&missing).into_stream().collect().await;
        let_assert!([Err(e)] = docs.as_slice());
        check!(e.is_fatal());

        let docs: Vec<_> = JsonLinesSource::new(missing.join("docs.jsonl"))
            .into_stream()
            .collect()
            .await;
        let_assert!([Err(SourceError::Unreachable(_))] = docs.as_slice());
    }
}
