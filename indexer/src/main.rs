use anyhow::{Context, Result};
use catalog_core::corpus::{read_json, read_jsonl, CorpusLoad};
use catalog_core::persist::{save_bundle, IndexPaths};
use catalog_core::results::save_result;
use catalog_core::{build, BuildStatus, MatchMode, RankingWeights, SearchEngine, SynonymMap};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a product catalog index and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from JSONL/JSON files or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long, default_value = "./index")]
        output: String,
    },
    /// Run one ranked query against a built index
    Search {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: String,
        /// Query text
        query: String,
        /// Matching mode: any, all or exact
        #[arg(long, default_value = "any")]
        mode: String,
        /// Synonym map JSON ({canonical: [synonyms]}); built-in origins if omitted
        #[arg(long)]
        synonyms: Option<PathBuf>,
        #[command(flatten)]
        weights: WeightArgs,
        /// Number of results to print
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Persist the full result as JSON
        #[arg(long, default_value_t = false)]
        save: bool,
        /// Directory for saved results
        #[arg(long, default_value = "./search_results")]
        results_dir: PathBuf,
    },
}

#[derive(Args)]
struct WeightArgs {
    #[arg(long, default_value_t = RankingWeights::default().bm25)]
    bm25_weight: f64,
    #[arg(long, default_value_t = RankingWeights::default().exact_match)]
    exact_match_weight: f64,
    #[arg(long, default_value_t = RankingWeights::default().review)]
    review_weight: f64,
    #[arg(long, default_value_t = RankingWeights::default().title_match)]
    title_match_weight: f64,
    #[arg(long, default_value_t = RankingWeights::default().origin_match)]
    origin_match_weight: f64,
}

impl From<WeightArgs> for RankingWeights {
    fn from(a: WeightArgs) -> Self {
        RankingWeights {
            bm25: a.bm25_weight,
            exact_match: a.exact_match_weight,
            review: a.review_weight,
            title_match: a.title_match_weight,
            origin_match: a.origin_match_weight,
        }
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output),
        Commands::Search { index, query, mode, synonyms, weights, top, save, results_dir } => {
            let mode: MatchMode = mode.parse()?;
            let weights: RankingWeights = weights.into();
            let synonyms = load_synonyms(synonyms.as_deref())?;
            let engine = SearchEngine::open(&IndexPaths::new(&index), synonyms)
                .with_context(|| format!("opening index at {index}"))?;
            let mut result = engine.search(&query, mode, &weights)?;
            if save {
                let path = save_result(&results_dir, &result)?;
                println!("saved: {}", path.display());
            }
            result.truncate(top);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

fn load_synonyms(path: Option<&Path>) -> Result<SynonymMap> {
    match path {
        Some(p) => SynonymMap::from_json_file(p).with_context(|| format!("reading synonyms from {}", p.display())),
        None => Ok(SynonymMap::builtin_origins()),
    }
}

fn build_index(input: &str, output: &str) -> Result<()> {
    let load = load_corpus(Path::new(input));
    tracing::info!(documents = load.documents.len(), malformed = load.skipped, "corpus loaded");

    let outcome = build(load.documents);
    save_bundle(&IndexPaths::new(output), &outcome.bundle)?;

    match outcome.status {
        BuildStatus::Indexed { documents } => {
            tracing::info!(output, documents, skipped = outcome.skipped, "index build complete");
        }
        BuildStatus::NoData => {
            tracing::warn!(input, output, "no data: wrote an empty index");
            eprintln!("indexer: no documents found under {input}; the index at {output} is empty");
        }
    }
    Ok(())
}

/// Collect documents from a file or every .json/.jsonl file below a directory.
fn load_corpus(input: &Path) -> CorpusLoad {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else {
        files.push(input.to_path_buf());
    }

    let mut load = CorpusLoad::default();
    for file in files {
        let part = if extension(&file) == Some("json") { read_json(&file) } else { read_jsonl(&file) };
        load.extend(part);
    }
    load
}

fn extension(p: &Path) -> Option<&str> { p.extension().and_then(|s| s.to_str()) }

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn directory_corpus_is_walked() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.jsonl"), "{\"url\":\"u1\",\"title\":\"Hat\"}\n").unwrap();
        fs::write(dir.path().join("nested/b.json"), r#"[{"url":"u2"},{"url":"u3"}]"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let load = load_corpus(dir.path());
        assert_eq!(load.documents.len(), 3);
    }

    #[test]
    fn build_then_search() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("products.jsonl");
        fs::write(&input, "{\"url\":\"u1\",\"title\":\"Red Wool Beanie\",\"product_features\":{\"made in\":\"Peru\"}}\n").unwrap();
        let out = dir.path().join("index");
        build_index(input.to_str().unwrap(), out.to_str().unwrap()).unwrap();

        let engine = SearchEngine::open(&IndexPaths::new(&out), SynonymMap::builtin_origins()).unwrap();
        let r = engine.search("red beanie", MatchMode::All, &RankingWeights::default()).unwrap();
        assert_eq!(r.metadata.document_count, 1);
        let r = engine.search("peru", MatchMode::Exact, &RankingWeights::default()).unwrap();
        assert_eq!(r.ranked_documents[0].url, "u1");
    }

    #[test]
    fn missing_input_builds_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("index");
        build_index("/no/such/corpus.jsonl", out.to_str().unwrap()).unwrap();
        let engine = SearchEngine::open(&IndexPaths::new(&out), SynonymMap::new()).unwrap();
        assert!(engine.bundle().is_empty());
    }
}
