//! Syntax tree for BSL and OneScript modules.
//!
//! The tree is an arena: nodes live in one vector and refer to their parent
//! and children by [`NodeId`]. It is immutable once built, so rules can walk
//! it from any number of threads.
//!
//! ```ignore
//! use bsl_lint_core::syntax::{self, SyntaxKind};
//!
//! let tree = syntax::parse("Компонента = Новый COMОбъект(\"X\");")?;
//! let new_expr = tree
//!     .descendants(tree.root())
//!     .find(|&id| tree.kind(id) == SyntaxKind::NewExpression);
//! ```

pub mod lexer;
pub mod parser;
pub mod visit;

use lexer::{Token, Trivia, TriviaKind};

pub use parser::{parse, MAX_NESTING_DEPTH};

/// Error produced while tokenizing or parsing a module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Index of a node in its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind tag of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum SyntaxKind {
    Module,
    VarDeclaration,
    Procedure,
    Function,
    ParameterList,
    Parameter,
    Annotation,
    CodeBlock,
    IfStatement,
    IfBranch,
    ElsIfBranch,
    ElseBranch,
    WhileStatement,
    ForStatement,
    ForEachStatement,
    TryStatement,
    ExceptBranch,
    ReturnStatement,
    RaiseStatement,
    ExecuteStatement,
    GotoStatement,
    Label,
    BreakStatement,
    ContinueStatement,
    AddHandlerStatement,
    RemoveHandlerStatement,
    AssignmentStatement,
    CallStatement,
    NewExpression,
    TypeName,
    ArgumentList,
    BinaryExpression,
    UnaryExpression,
    TernaryExpression,
    MemberAccess,
    IndexAccess,
    CallExpression,
    Identifier,
    Literal,
    ParenExpression,
}

impl SyntaxKind {
    /// Returns true for the leading `Если ... Тогда` branch of an `If`.
    ///
    /// `ElsIfBranch` and `ElseBranch` are siblings of the `IfBranch` under
    /// `IfStatement`, so code in them has no enclosing conditional branch.
    #[must_use]
    pub fn is_conditional_branch(self) -> bool {
        matches!(self, Self::IfBranch)
    }

    /// Returns true for procedure and function declarations.
    #[must_use]
    pub fn is_method(self) -> bool {
        matches!(self, Self::Procedure | Self::Function)
    }
}

/// Source range of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the first character.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
    /// Line number of the first character (1-indexed).
    pub line: usize,
    /// Column number of the first character (1-indexed).
    pub column: usize,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: SyntaxKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Token range `first_token..end_token`.
    first_token: usize,
    end_token: usize,
}

/// An immutable, parsed module.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    tokens: Vec<Token>,
    trivia: Vec<Trivia>,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// Returns the root node (always a [`SyntaxKind::Module`]).
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.nodes[id.index()].kind
    }

    /// Returns the parent of a node, or `None` for the root.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Returns the children of a node in source order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Returns the first child of the given kind.
    #[must_use]
    pub fn child_of_kind(&self, id: NodeId, kind: SyntaxKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.kind(child) == kind)
    }

    /// Iterates over the strict ancestors of a node, innermost first.
    ///
    /// The walk stops after as many steps as there are nodes, so a corrupted
    /// parent chain cannot loop forever.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
            remaining: self.nodes.len(),
        }
    }

    /// Iterates over a node and all its descendants in preorder.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![id];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.children(next).iter().rev().copied());
            Some(next)
        })
    }

    /// Reconstructs the text of a node from its tokens.
    ///
    /// Whitespace, comments and preprocessor lines are dropped and the
    /// lexemes are concatenated, so `Новый COMОбъект("X")` reads back as
    /// `НовыйCOMОбъект("X")`.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let node = &self.nodes[id.index()];
        self.tokens[node.first_token..node.end_token]
            .iter()
            .map(|t| &self.source[t.offset..t.end()])
            .collect()
    }

    /// Returns the source range covered by a node.
    #[must_use]
    pub fn span(&self, id: NodeId) -> Span {
        let node = &self.nodes[id.index()];
        match (
            self.tokens.get(node.first_token),
            node.end_token
                .checked_sub(1)
                .and_then(|last| self.tokens.get(last)),
        ) {
            (Some(first), Some(last)) if node.end_token > node.first_token => Span {
                offset: first.offset,
                len: last.end() - first.offset,
                line: first.line,
                column: first.column,
            },
            (Some(first), _) => Span {
                offset: first.offset,
                len: 0,
                line: first.line,
                column: first.column,
            },
            _ => Span {
                offset: self.source.len(),
                len: 0,
                line: self.source.lines().count().max(1),
                column: 1,
            },
        }
    }

    /// Returns the text of every `//` comment that starts on the given line.
    pub fn comments_on_line(&self, line: usize) -> impl Iterator<Item = &str> + '_ {
        self.trivia
            .iter()
            .filter(move |t| t.kind == TriviaKind::Comment && t.line == line)
            .map(|t| &self.source[t.offset..t.offset + t.len])
    }
}

/// Iterator returned by [`SyntaxTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Position in the builder that a later node can wrap from.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    parent: NodeId,
    child_count: usize,
    token_pos: usize,
}

/// Incrementally builds a [`SyntaxTree`] while tokens are consumed.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
    token_pos: usize,
}

impl TreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push_node(&mut self, kind: SyntaxKind, parent: Option<NodeId>, first_token: usize) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
            first_token,
            end_token: first_token,
        });
        id
    }

    /// Opens a node at the current token; it becomes the current parent.
    pub fn start_node(&mut self, kind: SyntaxKind) -> NodeId {
        let parent = self.stack.last().copied();
        let id = self.push_node(kind, parent, self.token_pos);
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        self.stack.push(id);
        id
    }

    /// Closes the current node.
    pub fn finish_node(&mut self) {
        if let Some(id) = self.stack.pop() {
            self.nodes[id.index()].end_token = self.token_pos;
        }
    }

    /// Attributes the next token to the current node.
    pub fn token(&mut self) {
        self.token_pos += 1;
    }

    /// Remembers the current position so a node can later be opened there.
    ///
    /// Must be called while a node is open.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        let parent = self.stack.last().copied().unwrap_or(NodeId(0));
        Checkpoint {
            parent,
            child_count: self.nodes.get(parent.index()).map_or(0, |n| n.children.len()),
            token_pos: self.token_pos,
        }
    }

    /// Opens a node starting at `checkpoint`, adopting every sibling built
    /// since then as its children.
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) -> NodeId {
        let parent = checkpoint.parent;
        let id = self.push_node(kind, Some(parent), checkpoint.token_pos);
        let adopted = self.nodes[parent.index()]
            .children
            .split_off(checkpoint.child_count);
        for &child in &adopted {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes[id.index()].children = adopted;
        self.nodes[parent.index()].children.push(id);
        self.stack.push(id);
        id
    }

    /// Finishes the tree. Any node still open is closed at the last token.
    #[must_use]
    pub fn finish(mut self, source: String, tokens: Vec<Token>, trivia: Vec<Trivia>) -> SyntaxTree {
        while !self.stack.is_empty() {
            self.finish_node();
        }
        SyntaxTree {
            source,
            tokens,
            trivia,
            nodes: self.nodes,
        }
    }
}
