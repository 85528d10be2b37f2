//! Collection index: attributes executed requests to folder paths.

use runlens_common::CollectionNode;
use std::collections::HashMap;

/// Folder key for requests that sit directly under the collection root.
pub const ROOT_FOLDER: &str = "(root)";

/// A request leaf and the folders above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedItem {
    pub path: Vec<String>,
    pub name: String,
}

/// Lookup tables built once per run from the collection tree.
#[derive(Debug, Clone, Default)]
pub struct CollectionIndex {
    id_to_path: HashMap<String, IndexedItem>,
    name_to_path: HashMap<String, Vec<Vec<String>>>,
}

impl CollectionIndex {
    /// Index a collection; a missing collection yields an empty index.
    pub fn build(collection: Option<&CollectionNode>) -> Self {
        let mut index = Self::default();
        if let Some(children) = collection.and_then(|c| c.item.as_deref()) {
            let mut ancestors = Vec::new();
            index.visit(children, &mut ancestors);
        }
        tracing::debug!(
            ids = index.id_to_path.len(),
            names = index.name_to_path.len(),
            "built collection index"
        );
        index
    }

    fn visit(&mut self, nodes: &[CollectionNode], ancestors: &mut Vec<String>) {
        for (idx, node) in nodes.iter().enumerate() {
            let name = node
                .name
                .as_deref()
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("unnamed_{idx}"));

            if let Some(children) = node.item.as_deref() {
                ancestors.push(name);
                self.visit(children, ancestors);
                ancestors.pop();
                continue;
            }

            let path = ancestors.clone();
            if let Some(id) = node.id.as_deref().filter(|id| !id.is_empty()) {
                self.id_to_path.insert(
                    id.to_string(),
                    IndexedItem {
                        path: path.clone(),
                        name: name.clone(),
                    },
                );
            }
            self.name_to_path.entry(name).or_default().push(path);
        }
    }

    pub fn get_by_id(&self, id: &str) -> Option<&IndexedItem> {
        self.id_to_path.get(id)
    }

    /// Every path recorded for a request name, in traversal order.
    pub fn paths_for_name(&self, name: &str) -> &[Vec<String>] {
        self.name_to_path.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Resolve a folder path by id, then by the first path recorded for the name.
    pub fn resolve(&self, id: Option<&str>, name: Option<&str>) -> &[String] {
        if let Some(item) = id.and_then(|id| self.get_by_id(id)) {
            return &item.path;
        }
        name.and_then(|n| self.paths_for_name(n).first())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolve a folder path by id only.
    pub fn resolve_id(&self, id: Option<&str>) -> &[String] {
        id.and_then(|id| self.get_by_id(id))
            .map(|item| item.path.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.id_to_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_path.is_empty()
    }
}

/// Bucket key of a folder path: segments joined by `/`, or `(root)`.
pub fn folder_key(path: &[String]) -> String {
    if path.is_empty() {
        ROOT_FOLDER.to_string()
    } else {
        path.join("/")
    }
}
