use anyhow::{bail, Context, Result};
use cinematch_core::persist::{load_snapshot, IndexPaths};
use cinematch_core::{Catalog, IndexConfig, Snapshot};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where the service gets its snapshot from, at startup and on reload.
#[derive(Debug, Clone)]
pub enum SnapshotSource {
    /// Directory written by `cinematch-indexer build`.
    Persisted(PathBuf),
    /// Catalog CSV indexed in-process, optionally refreshed from `url` first.
    Catalog { path: PathBuf, url: Option<String> },
}

impl SnapshotSource {
    /// Produce a complete snapshot. Vectorization runs on the blocking pool.
    pub async fn load(&self, client: &reqwest::Client, config: IndexConfig) -> Result<Snapshot> {
        match self {
            SnapshotSource::Persisted(dir) => {
                let paths = IndexPaths::new(dir);
                let (snapshot, meta) = tokio::task::spawn_blocking(move || load_snapshot(&paths)).await??;
                tracing::info!(dir = %dir.display(), num_docs = meta.num_docs, created_at = %meta.created_at, "loaded persisted index");
                Ok(snapshot)
            }
            SnapshotSource::Catalog { path, url } => {
                if let Some(url) = url {
                    refresh_catalog(client, url, path).await?;
                }
                let path = path.clone();
                let snapshot = tokio::task::spawn_blocking(move || -> Result<Snapshot> {
                    let catalog = Catalog::from_path(&path)?;
                    Ok(Snapshot::build(catalog.into_items(), config)?)
                })
                .await??;
                Ok(snapshot)
            }
        }
    }
}

/// Download the catalog CSV and replace `dest` once it parses with at least one row. Returns the row count.
pub async fn fetch_catalog(client: &reqwest::Client, url: &str, dest: &Path) -> Result<usize> {
    let body = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()?
        .bytes()
        .await?;
    let rows = Catalog::from_reader(body.as_ref())?.len();
    if rows == 0 {
        bail!("catalog at {url} has no rows");
    }
    let dir = match dest.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await?;

    // Stage next to `dest` and rename over it so readers only ever see a complete file.
    let target = dest.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut staged = tempfile::NamedTempFile::new_in(&dir)?;
        staged.write_all(&body)?;
        staged.as_file().sync_all()?;
        staged.persist(&target)?;
        Ok(())
    })
    .await?
    .with_context(|| format!("writing {}", dest.display()))?;
    Ok(rows)
}

/// Fetch the catalog, keeping the existing local copy when the download fails.
pub async fn refresh_catalog(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    match fetch_catalog(client, url, dest).await {
        Ok(rows) => {
            tracing::info!(rows, dest = %dest.display(), "catalog exported");
            Ok(())
        }
        Err(e) if dest.exists() => {
            tracing::error!(error = %e, "catalog download failed");
            tracing::info!(dest = %dest.display(), "using existing catalog file");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "catalog download failed");
            Err(e.context(format!("no local catalog at {}", dest.display())))
        }
    }
}
