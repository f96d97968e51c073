//! Hierarchical chunk trees: root, sections, subsections, paragraphs.

pub mod builder;
pub mod error;
pub mod index;

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use builder::{DEFAULT_ROOT_TITLE, INTRODUCTION_TITLE, TreeBuilder};
pub use error::{IndexError, TreeError};
pub use index::{NodeHit, NodeIndex};

/// A single chunk in the tree. `parent` and `children` are ids resolved through
/// the owning [`NodeTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    id: String,
    title: String,
    text: String,
    parent: Option<String>,
    children: Vec<String>,
    level: u8,
}

impl Node {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// 0 = root, 1 = section, 2 = subsection, 3 = paragraph.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Text handed to the embedding provider for this node.
    ///
    /// The title alone when there is no text, the text alone when it already
    /// opens with the title, otherwise the title on its own line followed by the text.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        if self.text.is_empty() {
            self.title.clone()
        } else if self.text.starts_with(&self.title) {
            self.text.clone()
        } else {
            format!("{}\n{}", self.title, self.text)
        }
    }
}

/// Arena of nodes in creation order, with an id lookup table.
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Node>,
    slots: HashMap<String, usize>,
    root: usize,
}

impl NodeTree {
    pub(crate) fn with_root(title: &str) -> Self {
        let root = Node {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_owned(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            level: 0,
        };
        let slots = HashMap::from([(root.id.clone(), 0)]);
        Self {
            nodes: vec![root],
            slots,
            root: 0,
        }
    }

    pub(crate) fn root_slot(&self) -> usize {
        self.root
    }

    /// Append a new child under the node at `parent` and return its slot.
    pub(crate) fn push_child(&mut self, parent: usize, title: String, text: String) -> usize {
        let id = uuid::Uuid::new_v4().to_string();
        let slot = self.nodes.len();
        let parent_node = &mut self.nodes[parent];
        parent_node.children.push(id.clone());
        let node = Node {
            id: id.clone(),
            title,
            text,
            parent: Some(parent_node.id.clone()),
            children: Vec::new(),
            level: parent_node.level + 1,
        };
        self.nodes.push(node);
        self.slots.insert(id, slot);
        slot
    }

    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.slots.get(id).map(|&slot| &self.nodes[slot])
    }

    /// Nodes in creation order; the root comes first for built trees.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `node` in order. Ids missing from this tree are skipped.
    pub fn children_of<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        node.children.iter().filter_map(|id| self.get(id))
    }

    /// Whether both trees have the same shape, titles, texts and levels,
    /// ignoring node ids.
    #[must_use]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.subtree_eq(self.root(), other, other.root())
    }

    fn subtree_eq(&self, a: &Node, other: &Self, b: &Node) -> bool {
        a.title == b.title
            && a.text == b.text
            && a.level == b.level
            && a.children.len() == b.children.len()
            && self
                .children_of(a)
                .zip(other.children_of(b))
                .all(|(ca, cb)| self.subtree_eq(ca, other, cb))
    }

    /// Check every structural invariant of the tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`TreeError`] found.
    pub fn validate(&self) -> Result<(), TreeError> {
        for node in &self.nodes {
            if node.title.trim().is_empty() && node.text.trim().is_empty() {
                return Err(TreeError::BlankNode(node.id.clone()));
            }

            let mut seen = HashSet::with_capacity(node.children.len());
            for child_id in &node.children {
                if !seen.insert(child_id.as_str()) {
                    return Err(TreeError::DuplicateChild {
                        id: node.id.clone(),
                        child: child_id.clone(),
                    });
                }
                let child = self.get(child_id).ok_or_else(|| TreeError::UnknownChild {
                    id: node.id.clone(),
                    child: child_id.clone(),
                })?;
                if child.parent.as_deref() != Some(node.id.as_str()) {
                    return Err(TreeError::ParentMismatch {
                        id: node.id.clone(),
                        child: child_id.clone(),
                    });
                }
            }

            match &node.parent {
                None => {
                    if node.level != 0 {
                        return Err(TreeError::LevelMismatch {
                            id: node.id.clone(),
                            expected: 0,
                            actual: node.level,
                        });
                    }
                }
                Some(parent_id) => {
                    let parent = self.get(parent_id).ok_or_else(|| TreeError::UnknownParent {
                        id: node.id.clone(),
                        parent: parent_id.clone(),
                    })?;
                    if !parent.children.contains(&node.id) {
                        return Err(TreeError::NotListed {
                            id: node.id.clone(),
                            parent: parent_id.clone(),
                        });
                    }
                    let expected = parent.level.saturating_add(1);
                    if node.level != expected {
                        return Err(TreeError::LevelMismatch {
                            id: node.id.clone(),
                            expected,
                            actual: node.level,
                        });
                    }
                }
            }
        }

        let mut reached = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([self.root]);
        reached[self.root] = true;
        while let Some(slot) = queue.pop_front() {
            for child in &self.nodes[slot].children {
                if let Some(&child_slot) = self.slots.get(child)
                    && !reached[child_slot]
                {
                    reached[child_slot] = true;
                    queue.push_back(child_slot);
                }
            }
        }
        if let Some(slot) = reached.iter().position(|r| !r) {
            return Err(TreeError::Unreachable(self.nodes[slot].id.clone()));
        }

        Ok(())
    }

    /// Serialize as a JSON object keyed by node id, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, TreeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a tree produced by [`NodeTree::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Json`] for malformed input, or the invariant the
    /// decoded tree violates.
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        let records: NodeRecords = serde_json::from_str(json)?;
        Self::from_records(records.0)
    }

    fn from_records(records: Vec<(String, NodeRecord)>) -> Result<Self, TreeError> {
        let mut nodes = Vec::with_capacity(records.len());
        let mut slots = HashMap::with_capacity(records.len());
        let mut root: Option<usize> = None;

        for (slot, (id, record)) in records.into_iter().enumerate() {
            if slots.insert(id.clone(), slot).is_some() {
                return Err(TreeError::DuplicateId(id));
            }
            if record.parent.is_none() {
                if let Some(first) = root {
                    let first: &Node = &nodes[first];
                    return Err(TreeError::MultipleRoots {
                        first: first.id.clone(),
                        second: id,
                    });
                }
                root = Some(slot);
            }
            nodes.push(Node {
                id,
                title: record.title,
                text: record.text,
                parent: record.parent,
                children: record.children,
                level: record.level,
            });
        }

        let root = root.ok_or(TreeError::MissingRoot)?;
        let tree = Self { nodes, slots, root };
        tree.validate()?;
        Ok(tree)
    }
}

impl PartialEq for NodeTree {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Eq for NodeTree {}

#[derive(Serialize)]
struct NodeRecordRef<'a> {
    title: &'a str,
    text: &'a str,
    parent: Option<&'a str>,
    children: &'a [String],
    level: u8,
}

#[derive(Deserialize)]
struct NodeRecord {
    title: String,
    #[serde(default)]
    text: String,
    parent: Option<String>,
    #[serde(default)]
    children: Vec<String>,
    level: u8,
}

impl Serialize for NodeTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.nodes.len()))?;
        for node in &self.nodes {
            map.serialize_entry(
                &node.id,
                &NodeRecordRef {
                    title: &node.title,
                    text: &node.text,
                    parent: node.parent.as_deref(),
                    children: &node.children,
                    level: node.level,
                },
            )?;
        }
        map.end()
    }
}

/// Map entries in document order, duplicates included.
struct NodeRecords(Vec<(String, NodeRecord)>);

impl<'de> Deserialize<'de> for NodeRecords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordsVisitor;

        impl<'de> Visitor<'de> for RecordsVisitor {
            type Value = NodeRecords;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of node id to node")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut records = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, NodeRecord>()? {
                    records.push(entry);
                }
                Ok(NodeRecords(records))
            }
        }

        deserializer.deserialize_map(RecordsVisitor)
    }
}

impl<'de> Deserialize<'de> for NodeTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = NodeRecords::deserialize(deserializer)?;
        Self::from_records(records.0).map_err(serde::de::Error::custom)
    }
}
