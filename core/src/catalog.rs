use crate::error::CatalogError;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One movie in the catalog. Only `description` is vectorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub year: String,
    pub description: String,
    /// First genre of the source row's comma-separated list.
    pub genre: Option<String>,
}

/// Ordered, validated catalog rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

struct Columns {
    id: Option<usize>,
    title: usize,
    year: usize,
    description: usize,
    genre: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, CatalogError> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let required = |name: &'static str| find(name).ok_or(CatalogError::MissingColumn(name));
        Ok(Self {
            id: find("id"),
            title: required("title")?,
            year: required("year")?,
            description: required("description")?,
            genre: find("genre"),
        })
    }
}

fn cell(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").trim().to_string()
}

fn first_genre(raw: &str) -> Option<String> {
    raw.split(',').next().map(str::trim).filter(|g| !g.is_empty()).map(str::to_string)
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self { Self { items } }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let catalog = Self::from_reader(file)?;
        tracing::info!(path = %path.display(), rows = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    /// Read a headed CSV. `title`, `year` and `description` columns are required.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns = Columns::resolve(rdr.headers()?)?;

        let mut items = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let id = columns.id.map(|i| cell(&record, i)).filter(|s| !s.is_empty()).unwrap_or_else(|| row.to_string());
            items.push(CatalogItem {
                id,
                title: cell(&record, columns.title),
                year: cell(&record, columns.year),
                description: cell(&record, columns.description),
                genre: columns.genre.and_then(|i| first_genre(&cell(&record, i))),
            });
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn items(&self) -> &[CatalogItem] { &self.items }

    pub fn into_items(self) -> Vec<CatalogItem> { self.items }

    pub fn descriptions(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.description.as_str()).collect()
    }

    pub fn extend(&mut self, other: Catalog) { self.items.extend(other.items); }
}
