//! Language-agnostic AST model
//!
//! Every parsed file owns a [`FileAst`] arena. Nodes address each other by
//! [`NodeId`] inside a file and by [`NodeRef`] across files, so parent links,
//! child lists and resolved reference edges are plain index values.
//!
//! The tree is strict (one parent, ordered children). Reference edges form a
//! general graph over all files and are only appended by the resolver
//! orchestrator.

use crate::parsing::Language;
use crate::parsing::resolution::ReferenceKind;
use crate::types::{FileId, NodeId, NodeRef, SourceRange};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

/// Initial capacity of a node's reference list
const INITIAL_REFERENCE_CAPACITY: usize = 4;

/// Kind of an AST node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    Unknown,
    Root,
    Function,
    Class,
    Method,
    Variable,
    Parameter,
    Identifier,
    Import,
    Include,
    Module,
    VariableDeclaration,
    ForStatement,
    WhileStatement,
    DoWhileStatement,
    IfStatement,
    IfElseIfStatement,
    SwitchStatement,
    Comment,
    Docstring,
    Namespace,
    Struct,
    Enum,
    Interface,
    Union,
    Typedef,
    Macro,
    ControlFlow,
    TemplateSpecialization,
    Lambda,
    Using,
    Friend,
    Operator,
    Type,
    Property,
    /// Call site of a function or method
    Call,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Root => "ROOT",
            Self::Function => "FUNCTION",
            Self::Class => "CLASS",
            Self::Method => "METHOD",
            Self::Variable => "VARIABLE",
            Self::Parameter => "PARAMETER",
            Self::Identifier => "IDENTIFIER",
            Self::Import => "IMPORT",
            Self::Include => "INCLUDE",
            Self::Module => "MODULE",
            Self::VariableDeclaration => "VARIABLE_DECLARATION",
            Self::ForStatement => "FOR_STATEMENT",
            Self::WhileStatement => "WHILE_STATEMENT",
            Self::DoWhileStatement => "DO_WHILE_STATEMENT",
            Self::IfStatement => "IF_STATEMENT",
            Self::IfElseIfStatement => "IF_ELSE_IF_STATEMENT",
            Self::SwitchStatement => "SWITCH_STATEMENT",
            Self::Comment => "COMMENT",
            Self::Docstring => "DOCSTRING",
            Self::Namespace => "NAMESPACE",
            Self::Struct => "STRUCT",
            Self::Enum => "ENUM",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Typedef => "TYPEDEF",
            Self::Macro => "MACRO",
            Self::ControlFlow => "CONTROL_FLOW",
            Self::TemplateSpecialization => "TEMPLATE_SPECIALIZATION",
            Self::Lambda => "LAMBDA",
            Self::Using => "USING",
            Self::Friend => "FRIEND",
            Self::Operator => "OPERATOR",
            Self::Type => "TYPE",
            Self::Property => "PROPERTY",
            Self::Call => "CALL",
        }
    }

    /// Kinds whose bodies open a naming scope for their children
    pub fn opens_scope(&self) -> bool {
        matches!(
            self,
            Self::Class | Self::Namespace | Self::Struct | Self::Interface
        )
    }

    /// Kinds that name a type
    pub fn is_type_like(&self) -> bool {
        matches!(
            self,
            Self::Class
                | Self::Struct
                | Self::Union
                | Self::Enum
                | Self::Interface
                | Self::Typedef
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FUNCTION" => Ok(Self::Function),
            "CLASS" => Ok(Self::Class),
            "METHOD" => Ok(Self::Method),
            "VARIABLE" => Ok(Self::Variable),
            "PARAMETER" => Ok(Self::Parameter),
            "IMPORT" => Ok(Self::Import),
            "INCLUDE" => Ok(Self::Include),
            "MODULE" => Ok(Self::Module),
            "NAMESPACE" => Ok(Self::Namespace),
            "STRUCT" => Ok(Self::Struct),
            "ENUM" => Ok(Self::Enum),
            "INTERFACE" => Ok(Self::Interface),
            "UNION" => Ok(Self::Union),
            "TYPEDEF" => Ok(Self::Typedef),
            "MACRO" => Ok(Self::Macro),
            "USING" => Ok(Self::Using),
            "FRIEND" => Ok(Self::Friend),
            "OPERATOR" => Ok(Self::Operator),
            "TYPE" => Ok(Self::Type),
            "PROPERTY" => Ok(Self::Property),
            "CALL" => Ok(Self::Call),
            "IDENTIFIER" => Ok(Self::Identifier),
            _ => Err("Unknown node kind"),
        }
    }
}

bitflags! {
    /// Storage and linkage facts recorded by the front end
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct NodeFlags: u8 {
        /// Prototype or forward declaration without a body
        const DECLARATION = 0b0000_0001;
        /// `static` storage, visible to its translation unit only
        const STATIC      = 0b0000_0010;
        /// Exported from its module (`export`, `module.exports`)
        const EXPORTED    = 0b0000_0100;
    }
}

/// A textual reference recorded by the front end.
///
/// The reference itself is permanent; `resolved` holds the target of the
/// last resolution pass and is cleared when that target's file goes away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReference {
    pub kind: ReferenceKind,
    pub name: String,
    pub resolved: Option<NodeRef>,
}

impl PendingReference {
    pub fn new(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            resolved: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

/// A node in a per-file syntax tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AstNode {
    pub kind: NodeKind,
    pub name: String,
    pub qualified_name: String,
    pub range: SourceRange,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub raw_content: Option<String>,
    pub file_path: PathBuf,
    pub language: Option<Language>,
    pub flags: NodeFlags,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Resolved edges to declarations, appended by resolution
    pub references: Vec<NodeRef>,
    /// References recorded by the front end (inheritance, implementation)
    pub pending: Vec<PendingReference>,
    /// Free-form key/value annotations
    pub properties: Vec<(String, String)>,
}

impl AstNode {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_qualified_name(mut self, qualified_name: impl Into<String>) -> Self {
        self.qualified_name = qualified_name.into();
        self
    }

    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_raw_content(mut self, raw: impl Into<String>) -> Self {
        self.raw_content = Some(raw.into());
        self
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_pending(mut self, kind: ReferenceKind, name: impl Into<String>) -> Self {
        self.pending.push(PendingReference::new(kind, name));
        self
    }

    /// True unless the node is only a forward declaration
    pub fn is_definition(&self) -> bool {
        !self.flags.contains(NodeFlags::DECLARATION)
    }

    /// Append a reference edge. Returns `false` when the edge already exists.
    pub fn add_reference(&mut self, target: NodeRef) -> bool {
        if self.references.contains(&target) {
            return false;
        }
        if self.references.capacity() == 0 {
            self.references.reserve_exact(INITIAL_REFERENCE_CAPACITY);
        }
        self.references.push(target);
        true
    }

    pub fn has_reference(&self, target: NodeRef) -> bool {
        self.references.contains(&target)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((key, value)),
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Arena owning every node of one parsed file
#[derive(Debug, Clone)]
pub struct FileAst {
    file_id: FileId,
    path: PathBuf,
    language: Language,
    nodes: Vec<AstNode>,
}

impl FileAst {
    /// Create an arena holding only a `Root` node
    pub fn new(file_id: FileId, path: impl Into<PathBuf>, language: Language) -> Self {
        let path = path.into();
        let mut root = AstNode::new(NodeKind::Root, "");
        root.file_path = path.clone();
        root.language = Some(language);
        Self {
            file_id,
            path,
            language,
            nodes: vec![root],
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &AstNode {
        &self.nodes[0]
    }

    pub fn root_mut(&mut self) -> &mut AstNode {
        &mut self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut AstNode> {
        self.nodes.get_mut(id.index())
    }

    pub fn node_ref(&self, id: NodeId) -> NodeRef {
        NodeRef::new(self.file_id, id)
    }

    /// Attach `node` as the last child of `parent` and return its id.
    ///
    /// The node inherits the file's path and language. An unknown parent
    /// falls back to the root.
    pub fn add_child(&mut self, parent: NodeId, mut node: AstNode) -> NodeId {
        let parent = if parent.index() < self.nodes.len() {
            parent
        } else {
            NodeId::ROOT
        };
        let id = NodeId(self.nodes.len() as u32);
        node.parent = Some(parent);
        node.file_path = self.path.clone();
        node.language = Some(self.language);
        self.nodes.push(node);
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Iterate all nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &AstNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Breadth-first order starting at the root
    pub fn bfs(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::new();
        queue.push_back(NodeId::ROOT);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            if let Some(node) = self.node(id) {
                queue.extend(node.children.iter().copied());
            }
        }
        order
    }

    /// Parents of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.node(parent).and_then(|n| n.parent);
        }
        chain
    }

    /// First direct child of `id` with the given simple name
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.node(id)?
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).is_some_and(|n| n.name == name))
    }

    /// Drop every reference edge into `file` and reopen the front-end
    /// references that resolved there. Returns how many edges were removed.
    pub fn remove_references_to(&mut self, file: FileId) -> usize {
        let mut removed = 0;
        for node in &mut self.nodes {
            let before = node.references.len();
            node.references.retain(|r| r.file != file);
            removed += before - node.references.len();
            for pending in &mut node.pending {
                if pending.resolved.is_some_and(|r| r.file == file) {
                    pending.resolved = None;
                }
            }
        }
        removed
    }

    /// Front-end references whose last resolution failed
    pub fn unresolved_pending(&self) -> impl Iterator<Item = (NodeId, &PendingReference)> {
        self.iter().flat_map(|(id, node)| {
            node.pending
                .iter()
                .filter(|p| !p.is_resolved())
                .map(move |p| (id, p))
        })
    }
}

/// Read access to every file's nodes, used by resolvers
pub trait NodeLookup {
    fn file(&self, id: FileId) -> Option<&FileAst>;

    fn node(&self, target: NodeRef) -> Option<&AstNode> {
        self.file(target.file)?.node(target.node)
    }
}

/// All parsed ASTs of a project, keyed by file id in creation order
#[derive(Debug, Default)]
pub struct AstStore {
    files: BTreeMap<FileId, FileAst>,
}

impl AstStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ast: FileAst) {
        self.files.insert(ast.file_id(), ast);
    }

    /// Remove a file's arena and scrub every edge that pointed into it
    pub fn remove(&mut self, id: FileId) -> Option<FileAst> {
        let removed = self.files.remove(&id)?;
        for ast in self.files.values_mut() {
            ast.remove_references_to(id);
        }
        Some(removed)
    }

    pub fn get(&self, id: FileId) -> Option<&FileAst> {
        self.files.get(&id)
    }

    pub fn get_mut(&mut self, id: FileId) -> Option<&mut FileAst> {
        self.files.get_mut(&id)
    }

    pub fn node_mut(&mut self, target: NodeRef) -> Option<&mut AstNode> {
        self.files.get_mut(&target.file)?.node_mut(target.node)
    }

    pub fn ids(&self) -> Vec<FileId> {
        self.files.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileAst> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl NodeLookup for AstStore {
    fn file(&self, id: FileId) -> Option<&FileAst> {
        self.files.get(&id)
    }
}
