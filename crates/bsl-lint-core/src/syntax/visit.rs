//! Depth-first traversal of a [`SyntaxTree`].
//!
//! Implement [`Visit`] and override the hooks for the node kinds a rule
//! cares about. Every other kind is walked transparently. An overriding hook
//! should call [`walk_children`] to keep descending.

use super::{NodeId, SyntaxKind, SyntaxTree};

/// Visitor over syntax nodes, modelled on `syn::visit::Visit`.
pub trait Visit {
    /// Visits the whole tree starting at the root.
    fn visit_tree(&mut self, tree: &SyntaxTree) {
        self.visit_node(tree, tree.root());
    }

    /// Dispatches on the node kind.
    fn visit_node(&mut self, tree: &SyntaxTree, node: NodeId) {
        visit_node(self, tree, node);
    }

    /// `Процедура` / `Функция` declarations.
    fn visit_method(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_children(self, tree, node);
    }

    /// `Если ... Тогда` branches.
    fn visit_conditional_branch(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_children(self, tree, node);
    }

    /// `Новый ...` expressions.
    fn visit_new_expression(&mut self, tree: &SyntaxTree, node: NodeId) {
        walk_children(self, tree, node);
    }
}

/// Default dispatch used by [`Visit::visit_node`].
pub fn visit_node<V: Visit + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    match tree.kind(node) {
        SyntaxKind::NewExpression => visitor.visit_new_expression(tree, node),
        kind if kind.is_conditional_branch() => visitor.visit_conditional_branch(tree, node),
        kind if kind.is_method() => visitor.visit_method(tree, node),
        _ => walk_children(visitor, tree, node),
    }
}

/// Visits every child of `node` in source order.
pub fn walk_children<V: Visit + ?Sized>(visitor: &mut V, tree: &SyntaxTree, node: NodeId) {
    for &child in tree.children(node) {
        visitor.visit_node(tree, child);
    }
}
