//! Parse-tree and AST node shapes (§4.7).
//!
//! Grounded on `original_source/tasktwo/syntaxtree.h`'s `SyntaxNode`
//! (`note`/`str`/`children`/`brother`): `note`→[`ParseNode::label`] /
//! [`AstNode::label`], `str`→`token`, `children`→`children`,
//! `brother`→[`AstNode::siblings`] (the parse tree itself never grows a
//! sibling list — only the AST builder's PROMOTE/CHILD/SIBLING actions do).

use std::rc::Rc;

/// A concrete parse-tree node: a leaf carries the matched token text, an
/// interior node carries its children in left-to-right source order
/// (ordering guarantee).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
    pub label: Rc<str>,
    pub token: Option<String>,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    pub fn leaf(label: Rc<str>, token: String) -> Self {
        ParseNode {
            label,
            token: Some(token),
            children: Vec::new(),
        }
    }

    pub fn interior(label: Rc<str>, children: Vec<ParseNode>) -> Self {
        ParseNode {
            label,
            token: None,
            children,
        }
    }
}

/// An AST node. Unlike [`ParseNode`], carries a `siblings` chain used by
/// the PROMOTE/CHILD/SIBLING syntax-action vocabulary  to
/// flatten recursively-built lists (e.g. statement sequences) without
/// nesting a nonterminal's recursive tail under its own `children`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub label: Rc<str>,
    pub token: Option<String>,
    pub children: Vec<AstNode>,
    pub siblings: Vec<AstNode>,
}

impl AstNode {
    pub fn leaf(label: Rc<str>, token: String) -> Self {
        AstNode {
            label,
            token: Some(token),
            children: Vec::new(),
            siblings: Vec::new(),
        }
    }

    pub fn interior(label: Rc<str>) -> Self {
        AstNode {
            label,
            token: None,
            children: Vec::new(),
            siblings: Vec::new(),
        }
    }
}
