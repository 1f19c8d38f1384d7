//! Immutable, queryable index over knowledge entries.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use super::entry::{parent_path, root_segment, EntryType, KnowledgeEntry};
use super::fuzzy::within_distance;

/// Two entries claimed the same canonical name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("duplicate knowledge entry {full_name:?} (frameworks {first:?} and {second:?})")]
pub struct DuplicateEntryError {
    pub full_name: String,
    pub first: String,
    pub second: String,
}

/// Read-only lookup table of known framework entities.
///
/// Built once and never mutated afterwards, so any number of analyses may
/// read it concurrently without locking.
#[derive(Debug, Default)]
pub struct Index {
    entries: Vec<KnowledgeEntry>,
    by_name: HashMap<String, usize>,
    by_framework_type: HashMap<(String, EntryType), Vec<usize>>,
    /// Parent path -> child entry positions.
    children: HashMap<String, Vec<usize>>,
    /// Dotted prefixes of entries that are packages rather than callables.
    implicit_modules: HashSet<String>,
    /// Root module -> framework name.
    roots: BTreeMap<String, String>,
    generation: u64,
}

impl Index {
    /// Build an index, rejecting duplicate full names.
    pub fn build(entries: Vec<KnowledgeEntry>) -> Result<Self, DuplicateEntryError> {
        let mut index = Index {
            entries: Vec::with_capacity(entries.len()),
            ..Default::default()
        };

        for entry in entries {
            if let Some(&existing) = index.by_name.get(&entry.full_name) {
                return Err(DuplicateEntryError {
                    full_name: entry.full_name,
                    first: index.entries[existing].framework.clone(),
                    second: entry.framework,
                });
            }

            let pos = index.entries.len();
            index.by_name.insert(entry.full_name.clone(), pos);
            index
                .by_framework_type
                .entry((entry.framework.clone(), entry.entry_type))
                .or_default()
                .push(pos);
            if let Some(parent) = entry.parent() {
                index.children.entry(parent.to_string()).or_default().push(pos);
            }
            index
                .roots
                .entry(entry.root().to_string())
                .or_insert_with(|| entry.framework.clone());
            index.entries.push(entry);
        }

        // Every dotted prefix is importable unless it names a class or callable.
        let mut prefixes = HashSet::new();
        for entry in &index.entries {
            let mut path = entry.full_name.as_str();
            while let Some(parent) = parent_path(path) {
                prefixes.insert(parent.to_string());
                path = parent;
            }
            prefixes.insert(entry.root().to_string());
        }
        index.implicit_modules = prefixes
            .into_iter()
            .filter(|p| match index.by_name.get(p) {
                Some(&pos) => index.entries[pos].entry_type == EntryType::Module,
                None => true,
            })
            .collect();

        for positions in index.children.values_mut() {
            positions.sort_by(|&a, &b| index.entries[a].full_name.cmp(&index.entries[b].full_name));
        }

        Ok(index)
    }

    /// Stamp the reload generation this index was built for.
    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn lookup_exact(&self, full_name: &str) -> Option<&KnowledgeEntry> {
        self.by_name.get(full_name).map(|&pos| &self.entries[pos])
    }

    /// All entries of one kind within a framework, ordered by full name.
    pub fn lookup_by_framework_and_type(
        &self,
        framework: &str,
        entry_type: EntryType,
    ) -> Vec<&KnowledgeEntry> {
        let mut found: Vec<&KnowledgeEntry> = self
            .by_framework_type
            .get(&(framework.to_string(), entry_type))
            .map(|positions| positions.iter().map(|&p| &self.entries[p]).collect())
            .unwrap_or_default();
        found.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        found
    }

    /// Near-miss entries for `name`, closest first.
    ///
    /// Siblings under the same parent are compared by their last segment;
    /// when the parent has no catalogued children the whole name is compared
    /// against every entry sharing the root module. Exact matches are left out.
    pub fn fuzzy_candidates(&self, name: &str, max_edit_distance: usize) -> Vec<&KnowledgeEntry> {
        let mut scored: Vec<(usize, &KnowledgeEntry)> = Vec::new();

        match parent_path(name).and_then(|parent| self.children.get(parent)) {
            Some(siblings) => {
                let last = name.rsplit_once('.').map(|(_, l)| l).unwrap_or(name);
                for &pos in siblings {
                    let entry = &self.entries[pos];
                    if entry.full_name == name {
                        continue;
                    }
                    if let Some(d) = within_distance(last, entry.simple_name(), max_edit_distance) {
                        scored.push((d, entry));
                    }
                }
            }
            None => {
                let root = root_segment(name);
                for entry in self.entries.iter().filter(|e| e.root() == root) {
                    if entry.full_name == name {
                        continue;
                    }
                    if let Some(d) = within_distance(name, &entry.full_name, max_edit_distance) {
                        scored.push((d, entry));
                    }
                }
            }
        }

        scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.full_name.cmp(&b.1.full_name)));
        scored.into_iter().map(|(_, e)| e).collect()
    }

    /// Framework owning a root module, if any.
    pub fn framework_for_root(&self, root: &str) -> Option<&str> {
        self.roots.get(root).map(String::as_str)
    }

    /// Root modules of every framework in the index, sorted.
    pub fn framework_roots(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    /// Closest framework root within `max_edit_distance` of `name`.
    pub fn nearest_root(&self, name: &str, max_edit_distance: usize) -> Option<(&str, usize)> {
        self.framework_roots()
            .filter_map(|root| within_distance(name, root, max_edit_distance).map(|d| (root, d)))
            .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
    }

    /// Whether `path` is importable as a module.
    pub fn is_known_module(&self, path: &str) -> bool {
        self.implicit_modules.contains(path)
            || self
                .lookup_exact(path)
                .map(|e| e.entry_type == EntryType::Module)
                .unwrap_or(false)
    }

    /// Whether `path` names anything the index knows about.
    pub fn contains_path(&self, path: &str) -> bool {
        self.by_name.contains_key(path) || self.implicit_modules.contains(path)
    }

    /// Entry type for a path, treating implicit packages as modules.
    pub fn path_type(&self, path: &str) -> Option<EntryType> {
        match self.lookup_exact(path) {
            Some(entry) => Some(entry.entry_type),
            None if self.implicit_modules.contains(path) => Some(EntryType::Module),
            None => None,
        }
    }
}
