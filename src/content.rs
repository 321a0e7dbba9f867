use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

use rand::Rng;
use rand::seq::IndexedRandom;

/// Semantic meaning of a table column, resolved from its header text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Item,
    Quantity,
    UnitPrice,
    Total,
    Tax,
    Identifier,
    /// No synonym matched; carries the lowercased header.
    Unknown(String),
}

impl Category {
    /// Name of the backing data file (without `.txt`) in the catalog directory.
    pub fn file_stem(&self) -> &str {
        match self {
            Category::Item => "produit",
            Category::Quantity => "quantite",
            Category::UnitPrice => "prix",
            Category::Total => "total",
            Category::Tax => "tax",
            Category::Identifier => "ID",
            Category::Unknown(key) => key,
        }
    }
}

/// Category → header synonyms, in declaration order. Earlier categories win
/// when a header matches synonyms of several categories.
pub struct SynonymTable {
    entries: Vec<(Category, Vec<String>)>,
}

static BUILTIN_SYNONYMS: OnceLock<SynonymTable> = OnceLock::new();

impl SynonymTable {
    pub fn new<'a>(entries: impl IntoIterator<Item = (Category, Vec<&'a str>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(cat, syns)| (cat, syns.into_iter().map(str::to_lowercase).collect()))
                .collect(),
        }
    }

    pub fn builtin() -> &'static SynonymTable {
        BUILTIN_SYNONYMS.get_or_init(|| {
            SynonymTable::new([
                (Category::Item, vec!["produit", "description", "article", "code article"]),
                (
                    Category::Quantity,
                    vec!["quantité", "qte", "quantité commandée", "quantité livrée"],
                ),
                (
                    Category::UnitPrice,
                    vec!["prix", "prix unitaire", "prix net", "prix coutant"],
                ),
                (Category::Total, vec!["total", "montant"]),
                (Category::Tax, vec!["tax", "tva(%)", "tva"]),
                (Category::Identifier, vec!["id", "no", "référence"]),
            ])
        })
    }

    /// A header belongs to the first category holding a synonym that contains
    /// the header, compared case-insensitively.
    pub fn resolve(&self, header: &str) -> Category {
        let needle = header.trim().to_lowercase();
        if needle.is_empty() {
            return Category::Unknown(needle);
        }
        self.entries
            .iter()
            .find(|(_, syns)| syns.iter().any(|s| s.contains(&needle)))
            .map(|(cat, _)| cat.clone())
            .unwrap_or(Category::Unknown(needle))
    }
}

enum CatalogSource {
    Directory(PathBuf),
    Memory,
}

/// Candidate cell values per category file stem.
///
/// Directory-backed catalogs read `<dir>/<stem>.txt` the first time a stem is
/// asked for and keep the result, including misses. Safe to share between
/// worker threads.
pub struct ContentCatalog {
    source: CatalogSource,
    cache: RwLock<HashMap<String, Arc<[String]>>>,
}

impl ContentCatalog {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: CatalogSource::Directory(dir.into()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn in_memory<K, V>(entries: impl IntoIterator<Item = (K, Vec<V>)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let cache = entries
            .into_iter()
            .map(|(k, vals)| {
                let vals: Vec<String> = vals.into_iter().map(Into::into).collect();
                (k.into(), Arc::from(vals))
            })
            .collect();
        Self {
            source: CatalogSource::Memory,
            cache: RwLock::new(cache),
        }
    }

    pub fn empty() -> Self {
        Self::in_memory(Vec::<(String, Vec<String>)>::new())
    }

    pub fn candidates(&self, stem: &str) -> Arc<[String]> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = cache.get(stem) {
                return hit.clone();
            }
        }
        let loaded: Arc<[String]> = match &self.source {
            CatalogSource::Directory(dir) => Arc::from(load_candidates(dir, stem)),
            CatalogSource::Memory => Arc::from(Vec::new()),
        };
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.entry(stem.to_string()).or_insert(loaded).clone()
    }
}

fn load_candidates(dir: &Path, stem: &str) -> Vec<String> {
    let path = dir.join(format!("{stem}.txt"));
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let values: Vec<String> = content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect();
            log::debug!("Catalog: loaded {} values from {}", values.len(), path.display());
            values
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("Catalog: no data for '{stem}' ({})", path.display());
            Vec::new()
        }
        Err(e) => {
            log::warn!("Catalog: cannot read {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Maps column headers to categories and draws cell values for them.
pub struct ContentResolver {
    synonyms: &'static SynonymTable,
    catalog: ContentCatalog,
}

impl ContentResolver {
    pub fn new(catalog: ContentCatalog) -> Self {
        Self {
            synonyms: SynonymTable::builtin(),
            catalog,
        }
    }

    pub fn with_synonyms(synonyms: &'static SynonymTable, catalog: ContentCatalog) -> Self {
        Self { synonyms, catalog }
    }

    pub fn resolve_category(&self, header: &str) -> Category {
        self.synonyms.resolve(header)
    }

    /// Uniform pick among the category's candidates, or `"Cell <header>"` when
    /// the catalog has none. Never fails.
    pub fn sample<R: Rng + ?Sized>(&self, category: &Category, header: &str, rng: &mut R) -> String {
        let candidates = self.catalog.candidates(category.file_stem());
        match candidates.choose(rng) {
            Some(value) => value.clone(),
            None => placeholder(header),
        }
    }

    pub fn sample_cell<R: Rng + ?Sized>(&self, header: &str, rng: &mut R) -> String {
        let category = self.resolve_category(header);
        self.sample(&category, header, rng)
    }
}

pub fn placeholder(header: &str) -> String {
    format!("Cell {header}")
}
