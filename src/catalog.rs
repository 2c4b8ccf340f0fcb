use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

/// Expected number of videos per course module, keyed by topic title.
///
/// Built once and never mutated afterwards; the engine only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, u32>,
}

impl ModuleCatalog {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            modules: entries
                .into_iter()
                .map(|(title, count)| (title.into().trim().to_string(), count))
                .collect(),
        }
    }

    /// Reads a catalog from a CSV file with a `topic_title,video_count` header.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("failed to open module catalog {}", path.display()))?;
        Self::from_reader(reader)
            .with_context(|| format!("failed to read module catalog {}", path.display()))
    }

    pub fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> anyhow::Result<Self> {
        #[derive(serde::Deserialize)]
        struct CatalogRow {
            topic_title: String,
            video_count: u32,
        }

        let mut entries = Vec::new();
        for result in reader.deserialize::<CatalogRow>() {
            let row = result?;
            entries.push((row.topic_title, row.video_count));
        }

        Ok(Self::new(entries))
    }

    pub fn expected_videos(&self, topic_title: &str) -> Option<u32> {
        self.modules.get(topic_title.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.modules
            .iter()
            .map(|(title, count)| (title.as_str(), *count))
    }
}
