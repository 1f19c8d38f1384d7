//! Loading knowledge entries exported by the ingestion pipeline.
//!
//! Two layouts are accepted, in YAML or JSON:
//!
//! ```yaml
//! frameworks:
//!   - name: FastAPI
//!     entries:
//!       - full_name: fastapi.FastAPI
//!         type: class
//! ```
//!
//! or a flat `entries:` list where every entry names its own framework.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::KnowledgeEntry;

#[derive(Debug, Deserialize, Default)]
struct KnowledgeFile {
    #[serde(default)]
    frameworks: Vec<FrameworkSection>,
    #[serde(default)]
    entries: Vec<KnowledgeEntry>,
}

#[derive(Debug, Deserialize)]
struct FrameworkSection {
    name: String,
    #[serde(default)]
    entries: Vec<KnowledgeEntry>,
}

/// Read knowledge entries from a YAML (`.yaml`/`.yml`) or JSON file.
pub fn load_entries<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<KnowledgeEntry>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let file: KnowledgeFile = match ext {
        "json" => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };

    let entries = flatten(file);
    tracing::debug!(path = %path.display(), entries = entries.len(), "loaded knowledge entries");
    Ok(entries)
}

/// Parse entries from an in-memory YAML document.
pub fn parse_entries(yaml: &str) -> anyhow::Result<Vec<KnowledgeEntry>> {
    let file: KnowledgeFile = serde_yaml::from_str(yaml)?;
    Ok(flatten(file))
}

fn flatten(file: KnowledgeFile) -> Vec<KnowledgeEntry> {
    let mut entries = Vec::new();
    for section in file.frameworks {
        for mut entry in section.entries {
            if entry.framework.is_empty() {
                entry.framework = section.name.clone();
            }
            entries.push(entry);
        }
    }
    entries.extend(file.entries);
    entries
}
