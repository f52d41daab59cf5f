use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use cinematch_core::persist::{load_snapshot, save_snapshot, IndexPaths};
use cinematch_core::{Catalog, IdfScheme, IndexConfig, Language, SimilarityRanker, Snapshot, TfScheme, TokenizerConfig};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cinematch-indexer")]
#[command(about = "Build and query the TF-IDF movie index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct VectorizerArgs {
    /// Language for stopwords and stemming (english, russian)
    #[arg(long, default_value_t = Language::English)]
    language: Language,
    /// Keep words unstemmed
    #[arg(long, default_value_t = false)]
    no_stem: bool,
    /// Do not drop stopwords
    #[arg(long, default_value_t = false)]
    keep_stopwords: bool,
    /// Term frequency scheme (raw, sublinear)
    #[arg(long, default_value_t = TfScheme::Raw)]
    tf: TfScheme,
    /// Inverse document frequency scheme (smooth, standard, additive)
    #[arg(long, default_value_t = IdfScheme::Smooth)]
    idf: IdfScheme,
}

impl VectorizerArgs {
    fn index_config(&self) -> IndexConfig {
        IndexConfig {
            tokenizer: TokenizerConfig {
                language: self.language,
                remove_stopwords: !self.keep_stopwords,
                stem: !self.no_stem,
            },
            tf: self.tf,
            idf: self.idf,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a catalog CSV file or a directory of CSV files
    Build {
        /// Input path (file or directory)
        #[arg(long, env = "DB_FILE")]
        input: PathBuf,
        /// Output index directory
        #[arg(long, env = "INDEX_DIR", default_value = "./index")]
        output: PathBuf,
        #[command(flatten)]
        vectorizer: VectorizerArgs,
    },
    /// Recommend movies for a free-text description
    Query {
        #[arg(long, env = "INDEX_DIR", default_value = "./index")]
        index: PathBuf,
        /// Description to match
        #[arg(long)]
        q: String,
        /// Number of recommendations
        #[arg(short, long, default_value_t = 5)]
        k: usize,
        /// Drop matches scoring below this value
        #[arg(long)]
        min_score: Option<f32>,
        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print corpus and vocabulary statistics
    Stats {
        #[arg(long, env = "INDEX_DIR", default_value = "./index")]
        index: PathBuf,
        /// How many of the most common terms to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Serialize)]
struct QueryHit<'a> {
    position: usize,
    score: f32,
    title: &'a str,
    year: &'a str,
    genre: Option<&'a str>,
    description: &'a str,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, vectorizer } => build_index(&input, &output, vectorizer.index_config()),
        Commands::Query { index, q, k, min_score, json } => query_index(&index, &q, k, min_score, json),
        Commands::Stats { index, top } => print_stats(&index, top),
    }
}

fn collect_csv_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("csv") {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input {} does not exist", input.display());
    }
    Ok(files)
}

fn load_catalog(input: &Path) -> Result<Catalog> {
    let mut catalog = Catalog::default();
    for file in collect_csv_files(input)? {
        catalog.extend(Catalog::from_path(&file)?);
    }
    Ok(catalog)
}

fn build_index(input: &Path, output: &Path, config: IndexConfig) -> Result<()> {
    let catalog = load_catalog(input)?;
    tracing::info!(num_docs = catalog.len(), ?config, "ingested catalog");

    let snapshot = Snapshot::build(catalog.into_items(), config)?;
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into());
    let meta = save_snapshot(&IndexPaths::new(output), &snapshot, &created_at)?;

    tracing::info!(output = %output.display(), num_docs = meta.num_docs, num_terms = meta.num_terms, "index build complete");
    Ok(())
}

fn query_index(index_dir: &Path, q: &str, k: usize, min_score: Option<f32>, json: bool) -> Result<()> {
    let (snapshot, _meta) = load_snapshot(&IndexPaths::new(index_dir))?;
    let ranker = match min_score {
        Some(floor) => SimilarityRanker::with_min_score(floor)?,
        None => SimilarityRanker::default(),
    };
    let matches = snapshot.recommend_with(&ranker, q, k)?;

    if json {
        let hits: Vec<QueryHit<'_>> = matches
            .iter()
            .map(|m| QueryHit {
                position: m.position,
                score: m.score,
                title: &m.item.title,
                year: &m.item.year,
                genre: m.item.genre.as_deref(),
                description: &m.item.description,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("no similar movies found");
    }
    for m in &matches {
        println!("{:.4}  {} ({})", m.score, m.item.title, m.item.year);
    }
    Ok(())
}

fn print_stats(index_dir: &Path, top: usize) -> Result<()> {
    let (snapshot, meta) = load_snapshot(&IndexPaths::new(index_dir))?;
    let index = snapshot.index();
    let config = index.config();
    let empty = index.vectors().iter().filter(|v| v.is_zero()).count();

    println!("created_at:  {}", meta.created_at);
    println!("documents:   {} ({} without indexable terms)", index.len(), empty);
    println!("terms:       {}", index.vocabulary_len());
    println!(
        "vectorizer:  language={} stem={} stopwords={} tf={} idf={}",
        config.tokenizer.language, config.tokenizer.stem, config.tokenizer.remove_stopwords, config.tf, config.idf
    );
    for (term, df) in index.most_frequent_terms(top) {
        println!("  {df:>6}  {term}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn directory_input_loads_csv_files_in_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "title,year,description\nSecond,2001,second film\n").unwrap();
        fs::write(dir.path().join("a.csv"), "title,year,description\nFirst,2000,first film\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = load_catalog(dir.path()).unwrap();
        let titles: Vec<&str> = catalog.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(collect_csv_files(&dir.path().join("nope.csv")).is_err());
    }

    #[test]
    fn build_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("movies.csv");
        fs::write(&csv, "title,year,description\nAlien,1979,space horror aboard a ship\nGrease,1978,high school musical romance\n").unwrap();
        let out = dir.path().join("index");

        build_index(&csv, &out, IndexConfig::default()).unwrap();
        let (snapshot, meta) = load_snapshot(&IndexPaths::new(&out)).unwrap();
        assert_eq!(meta.num_docs, 2);
        assert_eq!(snapshot.recommend("space ship", 1).unwrap()[0].item.title, "Alien");
    }

    #[test]
    fn nan_min_score_is_rejected() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("movies.csv");
        fs::write(&csv, "title,year,description\nAlien,1979,space horror aboard a ship\n").unwrap();
        let out = dir.path().join("index");
        build_index(&csv, &out, IndexConfig::default()).unwrap();

        assert!(query_index(&out, "space", 1, Some(f32::NAN), false).is_err());
        assert!(query_index(&out, "space", 1, Some(0.1), false).is_ok());
    }

    #[test]
    fn vectorizer_flags_map_to_config() {
        let args = VectorizerArgs {
            language: Language::Russian,
            no_stem: true,
            keep_stopwords: false,
            tf: TfScheme::Sublinear,
            idf: IdfScheme::Additive,
        };
        let config = args.index_config();
        assert_eq!(config.tokenizer.language, Language::Russian);
        assert!(!config.tokenizer.stem);
        assert!(config.tokenizer.remove_stopwords);
        assert_eq!(config.idf, IdfScheme::Additive);
    }
}
