//! Resolve the display name a request is reported under.
//!
//! Requests live in a collection tree of folders. They are reported by their
//! path through that tree, for example `Users/Admin/Create user`. The collection
//! itself (the root of the tree) is not part of the name.

use serde::{Deserialize, Serialize};

/// Separator placed between the labels of a display name.
pub const NAME_SEPARATOR: &str = "/";

/// Produces the display name of a request.
///
/// The reporter only needs a label to group timings by. How that label is derived
/// from the host's own item structure is up to the implementor.
pub trait ResolveName {
    /// The hierarchical display name of this item.
    fn display_name(&self) -> String;
}

impl ResolveName for str {
    fn display_name(&self) -> String {
        self.to_string()
    }
}

impl ResolveName for String {
    fn display_name(&self) -> String {
        self.clone()
    }
}

/// One node (the collection, a folder, or a request) in a collection tree.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ItemNode {
    /// Unique identifier of the node.
    pub id: String,
    /// Human readable name, if one was set.
    #[serde(default)]
    pub name: Option<String>,
}
impl ItemNode {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        ItemNode {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    /// A node without a name, labelled by its identifier.
    pub fn unnamed<I: Into<String>>(id: I) -> Self {
        ItemNode {
            id: id.into(),
            name: None,
        }
    }

    /// The node's name, falling back to its identifier when the name is missing or empty.
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

/// The chain of nodes from the collection root down to a request.
///
/// # Example
/// ```rust
/// use perf_reporter::naming::{ItemNode, ItemPath, ResolveName};
///
/// let path = ItemPath::new(vec![
///     ItemNode::new("c1", "My collection"),
///     ItemNode::new("f1", "Users"),
///     ItemNode::new("r1", "Create user"),
/// ]);
/// assert_eq!(path.display_name(), "Users/Create user");
/// ```
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemPath {
    nodes: Vec<ItemNode>,
}
impl ItemPath {
    /// Build a path from its nodes, root first.
    pub fn new(nodes: Vec<ItemNode>) -> Self {
        ItemPath { nodes }
    }

    /// The labels of every node below the root, root side first.
    pub fn labels(&self) -> Vec<&str> {
        self.nodes.iter().skip(1).map(ItemNode::label).collect()
    }

    /// The item itself: the last node of the path.
    pub fn item(&self) -> Option<&ItemNode> {
        self.nodes.last()
    }
}

impl ResolveName for ItemPath {
    fn display_name(&self) -> String {
        let name = self.labels().join(NAME_SEPARATOR);
        if !name.is_empty() {
            return name;
        }

        // A path that is only the collection itself, or whose labels are all empty.
        match self.item() {
            Some(item) => {
                debug!("no display name for item {}, using its id", item.id);
                item.id.clone()
            }
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn root_is_excluded() {
        let path = ItemPath::new(vec![
            ItemNode::new("c", "Collection"),
            ItemNode::new("r", "Get index"),
        ]);
        assert_eq!(path.display_name(), "Get index");
    }

    #[test]
    fn nested_folders() {
        let path = ItemPath::new(vec![
            ItemNode::new("c", "Collection"),
            ItemNode::new("f1", "Users"),
            ItemNode::new("f2", "Admin"),
            ItemNode::new("r", "Delete"),
        ]);
        assert_eq!(path.labels(), vec!["Users", "Admin", "Delete"]);
        assert_eq!(path.display_name(), "Users/Admin/Delete");
    }

    #[test]
    fn missing_names_use_ids() {
        let path = ItemPath::new(vec![
            ItemNode::new("c", "Collection"),
            ItemNode::unnamed("folder-1"),
            ItemNode {
                id: "request-7".to_string(),
                name: Some(String::new()),
            },
        ]);
        assert_eq!(path.display_name(), "folder-1/request-7");
    }

    #[test]
    fn collection_only_falls_back_to_id() {
        let path = ItemPath::new(vec![ItemNode::new("c-42", "Collection")]);
        assert_eq!(path.display_name(), "c-42");
        assert_eq!(ItemPath::default().display_name(), "");
    }

    #[test]
    fn plain_strings() {
        assert_eq!("already/resolved".display_name(), "already/resolved");
        assert_eq!("x".to_string().display_name(), "x");
    }

    #[test]
    fn deserialize() {
        let path: ItemPath = serde_json::from_str(
            r#"[{"id":"c","name":"Collection"},{"id":"f"},{"id":"r","name":"Login"}]"#,
        )
        .unwrap();
        assert_eq!(path.display_name(), "f/Login");
    }
}
