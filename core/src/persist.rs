use crate::{CatalogItem, Snapshot, VectorSpaceIndex};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self) -> PathBuf { self.root.join("index.bin") }
    fn catalog(&self) -> PathBuf { self.root.join("catalog.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    f.write_all(bytes)?;
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn save_index(paths: &IndexPaths, index: &VectorSpaceIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(index)?;
    write_bytes(&paths.index(), &bytes)
}

pub fn load_index(paths: &IndexPaths) -> Result<VectorSpaceIndex> {
    let buf = read_bytes(&paths.index())?;
    let index = bincode::deserialize(&buf)?;
    Ok(index)
}

pub fn save_catalog(paths: &IndexPaths, items: &[CatalogItem]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(items)?;
    write_bytes(&paths.catalog(), &bytes)
}

pub fn load_catalog(paths: &IndexPaths) -> Result<Vec<CatalogItem>> {
    let buf = read_bytes(&paths.catalog())?;
    let items = bincode::deserialize(&buf)?;
    Ok(items)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_bytes(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write index, catalog and meta for `snapshot`. Returns the meta that was written.
pub fn save_snapshot(paths: &IndexPaths, snapshot: &Snapshot, created_at: &str) -> Result<MetaFile> {
    save_index(paths, snapshot.index())?;
    save_catalog(paths, snapshot.items())?;
    let meta = MetaFile {
        num_docs: snapshot.len() as u32,
        num_terms: snapshot.index().vocabulary_len() as u32,
        created_at: created_at.to_string(),
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)?;
    Ok(meta)
}

/// Load and cross-check everything written by [`save_snapshot`].
pub fn load_snapshot(paths: &IndexPaths) -> Result<(Snapshot, MetaFile)> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        bail!("unsupported index format version {} (expected {})", meta.version, FORMAT_VERSION);
    }
    let index = load_index(paths)?;
    let items = load_catalog(paths)?;
    if index.len() != meta.num_docs as usize {
        bail!("meta.json records {} documents but index.bin holds {}", meta.num_docs, index.len());
    }
    let snapshot = Snapshot::from_parts(index, items)?;
    Ok((snapshot, meta))
}
