use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use arbor_core::bootstrap::{build_engine, build_shutdown, create_provider, health_check};
use arbor_core::config::{Config, resolve_config_path};
use arbor_core::{SearchHit, SearchOutcome};
use arbor_gateway::GatewayServer;
use arbor_memory::tree::DEFAULT_ROOT_TITLE;
use arbor_memory::{NodeHit, NodeIndex, NodeTree, TreeBuilder, loader_for_path};
use clap::{Parser, Subcommand};
use serde::Serialize;

const ASK_TITLE_CHARS: usize = 40;
const ASK_TEXT_CHARS: usize = 200;

#[derive(Debug, Parser)]
#[command(name = "arbor", version, about = "Two-stage document search and tree chunking")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the form UI and JSON API
    Serve,
    /// Run one BM25 + rerank query against the corpus
    Search {
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        rerank_top_k: Option<usize>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the chunk tree of a document and print it as JSON
    Chunk {
        path: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        root_title: Option<String>,
    },
    /// Query the chunk tree of a document
    Ask {
        path: PathBuf,
        query: String,
        #[arg(long, default_value_t = 5)]
        top_k: usize,
        /// Tree JSON to load; written after building when it does not exist yet
        #[arg(long)]
        tree: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)?;
    config.validate()?;

    match cli.command {
        Command::Serve => serve(&config).await,
        Command::Search {
            query,
            top_k,
            rerank_top_k,
            json,
        } => search(&config, &query, top_k, rerank_top_k, json).await,
        Command::Chunk {
            path,
            output,
            root_title,
        } => chunk(&config, &path, output.as_deref(), root_title).await,
        Command::Ask {
            path,
            query,
            top_k,
            tree,
        } => ask(&config, &path, &query, top_k, tree.as_deref()).await,
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so piped JSON output stays clean.
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let provider = Arc::new(create_provider(config)?);
    health_check(&provider).await;
    let engine = Arc::new(build_engine(config, provider).await?);

    let (shutdown_tx, shutdown_rx) = build_shutdown();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let gateway = &config.gateway;
    GatewayServer::new(&gateway.bind, gateway.port, engine, shutdown_rx)
        .with_max_body_size(gateway.max_body_size)
        .serve()
        .await?;
    Ok(())
}

async fn search(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    rerank_top_k: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let provider = Arc::new(create_provider(config)?);
    let engine = build_engine(config, provider).await?;
    let top_k = top_k.unwrap_or(config.search.retrieve_top_k);
    let rerank_top_k = rerank_top_k.unwrap_or(config.search.rerank_top_k);

    let outcome = engine.search(query, top_k, rerank_top_k).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&JsonOutcome::from(&outcome))?);
    } else {
        print!("{}", format_outcome(&outcome));
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    query: &'a str,
    bm25: &'a [SearchHit],
    #[serde(skip_serializing_if = "Option::is_none")]
    sbert: Option<&'a [SearchHit]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sbert_error: Option<&'a str>,
}

impl<'a> From<&'a SearchOutcome> for JsonOutcome<'a> {
    fn from(outcome: &'a SearchOutcome) -> Self {
        let (sbert, sbert_error) = match &outcome.rerank {
            Ok(hits) => (Some(hits.as_slice()), None),
            Err(e) => (None, Some(e.as_str())),
        };
        Self {
            query: &outcome.query,
            bm25: &outcome.lexical,
            sbert,
            sbert_error,
        }
    }
}

fn format_outcome(outcome: &SearchOutcome) -> String {
    let mut out = String::from("=== BM25 Retrieval ===\n");
    format_hits(&mut out, &outcome.lexical, "BM25 score");
    out.push_str("\n=== Embedding Rerank ===\n");
    match &outcome.rerank {
        Ok(hits) => format_hits(&mut out, hits, "Cosine"),
        Err(e) => {
            let _ = writeln!(out, "rerank failed: {e}");
        }
    }
    out
}

fn format_hits(out: &mut String, hits: &[SearchHit], label: &str) {
    for hit in hits {
        let _ = writeln!(out, "{}. {} ({label}: {:.2})", hit.rank, hit.title, hit.score);
        let _ = writeln!(out, "   {}...", hit.snippet);
    }
}

async fn build_tree(
    config: &Config,
    path: &Path,
    root_title: Option<String>,
) -> anyhow::Result<NodeTree> {
    let loader = loader_for_path(path, config.chunking.max_file_size)?;
    let document = loader
        .load(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let root_title = resolve_root_title(root_title, config, path);
    let tree = TreeBuilder::new(root_title).build(&document.text());
    tracing::info!(
        pages = document.page_count(),
        tokens = document.token_count(),
        nodes = tree.len(),
        "built chunk tree for {}",
        path.display()
    );
    Ok(tree)
}

/// `--root-title`, then `[chunking] root_title`, then the file stem.
fn resolve_root_title(flag: Option<String>, config: &Config, path: &Path) -> String {
    flag.or_else(|| config.chunking.root_title.clone())
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.trim().is_empty())
        })
        .unwrap_or_else(|| DEFAULT_ROOT_TITLE.to_owned())
}

async fn chunk(
    config: &Config,
    path: &Path,
    output: Option<&Path>,
    root_title: Option<String>,
) -> anyhow::Result<()> {
    let tree = build_tree(config, path, root_title).await?;
    let json = tree.to_json()?;
    match output {
        Some(output) => {
            tokio::fs::write(output, json)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Tree JSON saved as {}", output.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn ask(
    config: &Config,
    path: &Path,
    query: &str,
    top_k: usize,
    tree_path: Option<&Path>,
) -> anyhow::Result<()> {
    let tree = match tree_path {
        Some(tree_path) if tree_path.exists() => {
            let raw = tokio::fs::read_to_string(tree_path)
                .await
                .with_context(|| format!("failed to read {}", tree_path.display()))?;
            NodeTree::from_json(&raw)
                .with_context(|| format!("invalid tree JSON in {}", tree_path.display()))?
        }
        Some(tree_path) => {
            let tree = build_tree(config, path, None).await?;
            tokio::fs::write(tree_path, tree.to_json()?)
                .await
                .with_context(|| format!("failed to write {}", tree_path.display()))?;
            tracing::info!("tree saved to {}", tree_path.display());
            tree
        }
        None => build_tree(config, path, None).await?,
    };

    let provider = Arc::new(create_provider(config)?);
    let mut index = NodeIndex::new(provider);
    index.build(&tree).await?;
    let hits = index.query(query, top_k).await?;
    print!("{}", format_node_hits(&hits));
    Ok(())
}

fn format_node_hits(hits: &[NodeHit<'_>]) -> String {
    let mut out = String::from("\n=== Retrieval Results ===\n");
    for hit in hits {
        let title: String = hit.node.title().chars().take(ASK_TITLE_CHARS).collect();
        let text: String = hit.node.text().chars().take(ASK_TEXT_CHARS).collect();
        let _ = writeln!(out, "[{title}...] (score={:.2})", hit.score);
        let _ = writeln!(out, "{text} ...\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(rank: usize, title: &str) -> SearchHit {
        SearchHit {
            rank,
            doc_idx: rank - 1,
            title: title.into(),
            score: 0.5,
            snippet: "body".into(),
        }
    }

    #[test]
    fn cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "arbor",
            "--config",
            "custom.toml",
            "search",
            "who discovered relativity",
            "--top-k",
            "3",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("custom.toml")));
        match cli.command {
            Command::Search {
                query,
                top_k,
                rerank_top_k,
                json,
            } => {
                assert_eq!(query, "who discovered relativity");
                assert_eq!(top_k, Some(3));
                assert_eq!(rerank_top_k, None);
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["arbor", "serve", "--config", "a.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
        assert_eq!(cli.config.as_deref(), Some(Path::new("a.toml")));
    }

    #[test]
    fn cli_ask_defaults() {
        let cli = Cli::try_parse_from(["arbor", "ask", "doc.pdf", "what?"]).unwrap();
        match cli.command {
            Command::Ask { top_k, tree, .. } => {
                assert_eq!(top_k, 5);
                assert!(tree.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_missing_subcommand() {
        assert!(Cli::try_parse_from(["arbor"]).is_err());
    }

    #[test]
    fn root_title_precedence() {
        let mut config = Config::default();
        let path = Path::new("docs/interview-guide.pdf");
        assert_eq!(resolve_root_title(None, &config, path), "interview-guide");

        config.chunking.root_title = Some("Handbook".into());
        assert_eq!(resolve_root_title(None, &config, path), "Handbook");
        assert_eq!(
            resolve_root_title(Some("Flag".into()), &config, path),
            "Flag"
        );

        config.chunking.root_title = None;
        assert_eq!(resolve_root_title(None, &config, Path::new("")), DEFAULT_ROOT_TITLE);
        assert_eq!(
            resolve_root_title(Some("  ".into()), &config, path),
            "interview-guide"
        );
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn build_tree_logs_page_and_token_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "RESOURCES\n1. case books\n2. mock interviews daily\n").unwrap();

        let writer = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let tree = build_tree(&Config::default(), &path, None).await.unwrap();
        assert_eq!(tree.root().title(), "notes");

        let logs = String::from_utf8(writer.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("pages=1"));
        assert!(logs.contains("tokens=8"));
    }

    #[test]
    fn outcome_text_lists_both_stages() {
        let outcome = SearchOutcome {
            query: "q".into(),
            lexical: vec![hit(1, "First"), hit(2, "Second")],
            rerank: Ok(vec![hit(1, "Second")]),
        };
        let text = format_outcome(&outcome);
        assert!(text.contains("1. First (BM25 score: 0.50)"));
        assert!(text.contains("1. Second (Cosine: 0.50)"));
        assert!(text.find("BM25 Retrieval") < text.find("Embedding Rerank"));
    }

    #[test]
    fn outcome_json_reports_rerank_error() {
        let outcome = SearchOutcome {
            query: "q".into(),
            lexical: vec![hit(1, "First")],
            rerank: Err("offline".into()),
        };
        let json = serde_json::to_value(JsonOutcome::from(&outcome)).unwrap();
        assert_eq!(json["bm25"][0]["title"], "First");
        assert_eq!(json["sbert_error"], "offline");
        assert!(json.get("sbert").is_none());
        assert!(format_outcome(&outcome).contains("rerank failed: offline"));
    }

    #[test]
    fn node_hits_truncate_title_and_text() {
        let tree = TreeBuilder::new("Guide").build(&format!(
            "RESOURCES\n{}\n",
            "Case books and mock interviews. ".repeat(10)
        ));
        let node = tree.iter().find(|n| n.is_leaf()).unwrap();
        let hits = [NodeHit { score: 0.876, node }];
        let out = format_node_hits(&hits);
        assert!(out.contains("[Case books and mock interviews. Case boo...] (score=0.88)"));
        let body = out.lines().find(|l| l.starts_with("Case books")).unwrap();
        assert_eq!(body.chars().count(), ASK_TEXT_CHARS + " ...".len());
    }
}
