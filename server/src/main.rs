use anyhow::{bail, Result};
use clap::Parser;
use cinematch_core::{IndexConfig, Language, TokenizerConfig};
use cinematch_server::{build_app, AppState, SnapshotSource};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index directory written by the indexer
    #[arg(long, env = "INDEX_DIR")]
    index: Option<PathBuf>,
    /// Catalog CSV to index at startup (used when --index is absent)
    #[arg(long, env = "DB_FILE")]
    catalog: Option<PathBuf>,
    /// URL the catalog CSV is refreshed from before indexing
    #[arg(long, env = "DB_URL")]
    catalog_url: Option<String>,
    /// Language for stopwords and stemming when indexing a catalog
    #[arg(long, default_value_t = Language::English)]
    language: Language,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Recommendations returned when the request has no k
    #[arg(long, default_value_t = cinematch_server::DEFAULT_K)]
    default_k: usize,
    /// Upper bound on k
    #[arg(long, default_value_t = cinematch_server::MAX_K)]
    max_k: usize,
    /// Token required by admin endpoints
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,
    /// Download timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Args {
    fn source(&self) -> Result<SnapshotSource> {
        match (&self.index, &self.catalog) {
            (Some(dir), _) => Ok(SnapshotSource::Persisted(dir.clone())),
            (None, Some(path)) => Ok(SnapshotSource::Catalog { path: path.clone(), url: self.catalog_url.clone() }),
            (None, None) => bail!("either --index or --catalog must be given"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let index_config = IndexConfig {
        tokenizer: TokenizerConfig { language: args.language, ..Default::default() },
        ..Default::default()
    };
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;
    let source = args.source()?;
    let snapshot = source.load(&client, index_config).await?;
    tracing::info!(num_docs = snapshot.len(), num_terms = snapshot.index().vocabulary_len(), "snapshot ready");

    let mut state = AppState::new(snapshot)
        .with_source(source, index_config)
        .with_admin_token(args.admin_token.clone())
        .with_http_client(client);
    state.default_k = args.default_k;
    state.max_k = args.max_k;
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
