//! Identifier and location types shared by the AST, the symbol table and the
//! resolvers.

use serde::{Deserialize, Serialize};

/// Identifies a parsed file inside a project. Ids start at 1 and are never
/// reused, so a handle into a removed file stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// Index of a node inside its file's arena. The root is always `NodeId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Index of an entry in the global symbol table's slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u32);

/// Project-wide handle to an AST node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    pub file: FileId,
    pub node: NodeId,
}

impl FileId {
    pub fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl EntryId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl NodeRef {
    pub fn new(file: FileId, node: NodeId) -> Self {
        Self { file, node }
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.0, self.node.0)
    }
}

/// Source span of a node: zero-based lines and columns plus byte offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl SourceRange {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
            start_byte: 0,
            end_byte: 0,
        }
    }

    pub fn with_bytes(mut self, start_byte: usize, end_byte: usize) -> Self {
        self.start_byte = start_byte;
        self.end_byte = end_byte;
        self
    }

    pub fn from_ts(node: &tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self::new(
            start.row as u32,
            start.column as u32,
            end.row as u32,
            end.column as u32,
        )
        .with_bytes(node.start_byte(), node.end_byte())
    }

    pub fn contains(&self, line: u32, column: u32) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }

        if line == self.start_line && column < self.start_column {
            return false;
        }

        if line == self.end_line && column > self.end_column {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_creation() {
        assert!(FileId::new(0).is_none());

        let id = FileId::new(100).unwrap();
        assert_eq!(id.value(), 100);
    }

    #[test]
    fn test_range_contains() {
        let range = SourceRange::new(10, 5, 15, 20);

        assert!(range.contains(12, 10));
        assert!(range.contains(10, 5)); // Start position
        assert!(range.contains(15, 20)); // End position

        assert!(!range.contains(9, 10));
        assert!(!range.contains(16, 10));
        assert!(!range.contains(10, 4));
        assert!(!range.contains(15, 21));
    }

    #[test]
    fn test_node_ref_equality_and_hash() {
        let file = FileId::new(1).unwrap();
        let a = NodeRef::new(file, NodeId(3));
        let b = NodeRef::new(file, NodeId(3));
        let c = NodeRef::new(file, NodeId(4));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "1:3");

        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }
}
