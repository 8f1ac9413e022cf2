//! # Parser Driver + Attribute Evaluator (C7)
//!
//! The shift-reduce loop of driving three independent
//! attribute stacks in lockstep with the parse stack: the concrete/abstract
//! syntax tree builder ([`tree`]) and the quadruple emitter with
//! back-patching ([`quad`]). Per-production action tables are parsed by
//! [`actions`] from the two semantic-action file formats.
//!
//! Grounded on `original_source/tasktwo/lr.cpp`'s table-driven automaton
//! traversal for the shift/reduce shape, `original_source/tasktwo/syntaxtree.cpp`
//! (`showSyntax`'s `brother`-chain walk) for the AST's PROMOTE/CHILD/SIBLING
//! semantics, and `original_source/tasktwo/intermediatecode.cpp`'s
//! `GEN`/`BackPatch`/`Merge` (kept identically named in [`quad`]).

pub mod actions;
pub mod quad;
pub mod tree;

use crate::grammar::{Grammar, EPSILON, END_MARKER};
use crate::lr::{Action as LrAction, Table};
use actions::{Action as IcAction, CanonicalProduction, IntermediateAction, Operand, SyntaxAction};
use quad::{QuadrupleTable, JUMP_PLACEHOLDER};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use tree::{AstNode, ParseNode};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriveError {
    /// No action defined for either the token's surface text or its type;
    /// surfaced at the first offending input token with the current state
    /// and lookahead.
    #[error("no action in state {state} for token '{text}' (type '{token_type}')")]
    Undefined {
        state: usize,
        text: String,
        token_type: String,
    },
    /// `accept` was reached with input remaining.
    #[error("accepted before input was exhausted")]
    NotExhausted,
}

/// The result of one driven parse: the concrete parse tree (always built),
/// the AST (only if a syntax-action table was supplied), and the quadruple
/// table (populated only for productions the intermediate-code-action table
/// covers — the three evaluators run independently, so a production with
/// no quadruple action simply leaves the table untouched).
#[derive(Debug, Clone)]
pub struct DriveOutput {
    pub parse_tree: ParseNode,
    pub ast: Option<AstNode>,
    pub quadruples: QuadrupleTable,
}

/// One shift/reduce attribute record : `val` is surface text or
/// a temporary name, the rest are quadruple-chain heads.
#[derive(Debug, Clone, Default)]
struct AttrRecord {
    val: String,
    tc: usize,
    fc: usize,
    chain: usize,
    head: usize,
}

type ActionKey = (String, Vec<String>);

fn action_key(p: &CanonicalProduction) -> ActionKey {
    (p.lhs.to_string(), p.rhs.iter().map(|s| s.to_string()).collect())
}

fn production_key(grammar: &Grammar, idx: usize) -> ActionKey {
    let prod = grammar.production(idx);
    (prod.lhs.to_string(), prod.rhs.iter().map(|s| s.to_string()).collect())
}

/// Parses the `<text> <token-name>` per-line lex-file format into the
/// `(text, type)` pairs [`Driver::run`] consumes, dropping any
/// `annotation`-typed token.
pub fn parse_lex_tokens(input: &str) -> Vec<(String, String)> {
    input
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (text, name) = line.rsplit_once(' ')?;
            Some((text.trim().to_string(), name.trim().to_string()))
        })
        .filter(|(_, name)| name != "annotation")
        .collect()
}

/// Drives a shift-reduce parse over a grammar's LALR(1) [`Table`], building
/// the parse tree and, where action tables are supplied, the AST and
/// quadruple list.
pub struct Driver<'a> {
    grammar: &'a Grammar,
    table: &'a Table,
    syntax_actions: Option<HashMap<ActionKey, Vec<u8>>>,
    ic_actions: Option<HashMap<ActionKey, Vec<IcAction>>>,
}

impl<'a> Driver<'a> {
    pub fn new(grammar: &'a Grammar, table: &'a Table) -> Self {
        Driver {
            grammar,
            table,
            syntax_actions: None,
            ic_actions: None,
        }
    }

    pub fn with_syntax_actions(mut self, actions: &[SyntaxAction]) -> Self {
        self.syntax_actions = Some(
            actions
                .iter()
                .map(|a| (action_key(&a.production), a.roles.clone()))
                .collect(),
        );
        self
    }

    pub fn with_intermediate_actions(mut self, actions: &[IntermediateAction]) -> Self {
        self.ic_actions = Some(
            actions
                .iter()
                .map(|a| (action_key(&a.production), a.actions.clone()))
                .collect(),
        );
        self
    }

    /// Runs the driver to completion or first error. The end marker
    /// `($, end)` is appended automatically if not already present.
    pub fn run(&self, tokens: &[(String, String)]) -> Result<DriveOutput, DriveError> {
        let mut input = tokens.to_vec();
        if input.last().map(|(w, _)| w.as_str()) != Some(END_MARKER) {
            input.push((END_MARKER.to_string(), "end".to_string()));
        }

        let mut pos = 0usize;
        let mut states: Vec<usize> = vec![0];
        let mut tree_stack: Vec<ParseNode> = Vec::new();
        let mut ast_stack: Vec<Option<AstNode>> = Vec::new();
        let mut attr_stack: Vec<AttrRecord> = Vec::new();
        let mut quads = QuadrupleTable::new();
        let mut temp_counter = 0usize;

        loop {
            let s = *states.last().expect("state stack never empties");
            let (w, t) = &input[pos];

            let lookup = self
                .table
                .action(s, w)
                .map(|a| (a, Rc::from(w.as_str()), false))
                .or_else(|| self.table.action(s, t).map(|a| (a, Rc::from(t.as_str()), false)))
                .or_else(|| self.table.action(s, EPSILON).map(|a| (a, Rc::from(EPSILON), true)));

            let Some((action, symbol, synthetic)) = lookup else {
                return Err(DriveError::Undefined {
                    state: s,
                    text: w.clone(),
                    token_type: t.clone(),
                });
            };

            match action {
                LrAction::Shift(j) => {
                    let (text, kind) = if synthetic {
                        (String::new(), "empty".to_string())
                    } else {
                        (w.clone(), t.clone())
                    };

                    tree_stack.push(ParseNode::leaf(symbol.clone(), text.clone()));
                    ast_stack.push((kind != "empty").then(|| AstNode::leaf(symbol.clone(), text.clone())));
                    attr_stack.push(AttrRecord {
                        val: text,
                        ..Default::default()
                    });

                    states.push(j);
                    if !synthetic {
                        pos += 1;
                    }
                }
                LrAction::Reduce(p) => {
                    let prod = self.grammar.production(p);
                    let k = prod.core_len();

                    states.truncate(states.len() - k);
                    let children = tree_stack.split_off(tree_stack.len() - k);
                    tree_stack.push(ParseNode::interior(prod.lhs.clone(), children));

                    let ast_children = ast_stack.split_off(ast_stack.len() - k);
                    ast_stack.push(self.reduce_ast(p, ast_children));

                    let attr_children = attr_stack.split_off(attr_stack.len() - k);
                    attr_stack.push(self.reduce_quads(p, attr_children, &mut quads, &mut temp_counter));
                }
                LrAction::Accept => {
                    if pos + 1 != input.len() {
                        return Err(DriveError::NotExhausted);
                    }
                    break;
                }
            }
        }

        let final_attr = attr_stack.pop().expect("one attribute record survives to accept");
        quads.back_patch(final_attr.chain, quads.next());

        Ok(DriveOutput {
            parse_tree: tree_stack.pop().expect("one parse tree survives to accept"),
            ast: ast_stack.pop().flatten(),
            quadruples: quads,
        })
    }

    /// Applies production `p`'s syntax-action role vector (PROMOTE=1,
    /// CHILD=2, SIBLING=3) to its popped children No
    /// entry for this production (or no table at all) discards the node,
    /// matching "missing action simply omits that output". An epsilon
    /// production pops zero children (`core_len() == 0`) even though its
    /// role vector is validated against the single-symbol `@` RHS, so
    /// `promote_at` can point past the end of `children` — that's just
    /// another case of "empty-typed leaves are never emitted to the AST".
    fn reduce_ast(&self, p: usize, children: Vec<Option<AstNode>>) -> Option<AstNode> {
        let roles = self.syntax_actions.as_ref()?.get(&production_key(self.grammar, p))?;

        let promote_at = roles.iter().position(|&r| r == 1)?;
        let mut promoted = children.get(promote_at)?.clone();

        for (i, (role, child)) in roles.iter().zip(children.iter()).enumerate() {
            if i == promote_at {
                continue;
            }
            match role {
                2 => {
                    if let (Some(node), Some(child)) = (promoted.as_mut(), child) {
                        node.children.push(child.clone());
                    }
                }
                3 => {
                    if let (Some(node), Some(child)) = (promoted.as_mut(), child) {
                        let mut child = child.clone();
                        let nested = std::mem::take(&mut child.siblings);
                        node.siblings.push(child);
                        node.siblings.extend(nested);
                    }
                }
                _ => {}
            }
        }
        promoted
    }

    /// Evaluates production `p`'s intermediate-code action list against its
    /// popped attribute records, returning the reduction's own result
    /// record . No entry leaves the result record at its
    /// zero/empty default, contributing no quadruples.
    fn reduce_quads(
        &self,
        p: usize,
        children: Vec<AttrRecord>,
        quads: &mut QuadrupleTable,
        temp_counter: &mut usize,
    ) -> AttrRecord {
        let mut dst = AttrRecord::default();
        let Some(ic_actions) = self.ic_actions.as_ref() else {
            return dst;
        };
        let Some(actions) = ic_actions.get(&production_key(self.grammar, p)) else {
            return dst;
        };

        let mut children = children;
        for action in actions {
            match action {
                IcAction::Assign { dst: d, src } => {
                    let v = read(src, &dst, &children, quads, temp_counter);
                    write(d, v, &mut dst, &mut children);
                }
                IcAction::Emit { op, a, b, c } => {
                    let (op, a, b, c) = (
                        read(op, &dst, &children, quads, temp_counter),
                        read(a, &dst, &children, quads, temp_counter),
                        read(b, &dst, &children, quads, temp_counter),
                        read(c, &dst, &children, quads, temp_counter),
                    );
                    quads.gen(op, a, b, c);
                }
                IcAction::Merge { dst: d, b, c } => {
                    let b = read(b, &dst, &children, quads, temp_counter).parse().unwrap_or(0);
                    let c = read(c, &dst, &children, quads, temp_counter).parse().unwrap_or(0);
                    let merged = quads.merge(b, c);
                    write(d, merged.to_string(), &mut dst, &mut children);
                }
                IcAction::BackPatch { p, t } => {
                    let p = read(p, &dst, &children, quads, temp_counter).parse().unwrap_or(0);
                    let t = read(t, &dst, &children, quads, temp_counter).parse().unwrap_or(0);
                    quads.back_patch(p, t);
                }
            }
        }
        dst
    }
}

/// Reads an [`Operand`]'s value against the current reduction's result
/// record (`index == 0`) or one of its popped RHS records (`index >= 1`).
fn read(
    operand: &Operand,
    dst: &AttrRecord,
    children: &[AttrRecord],
    quads: &QuadrupleTable,
    temp_counter: &mut usize,
) -> String {
    match operand {
        Operand::Field { index, field } => {
            // `index` is validated against the action's RHS length, not against
            // `children.len()` (== core_len()) — an epsilon production's action
            // can reference a slot no reduction ever pops. Treat it as empty,
            // the same way reduce_ast discards an out-of-range PROMOTE.
            let rec = if *index == 0 { Some(dst) } else { children.get(*index - 1) };
            rec.map(|r| field_value(r, *field)).unwrap_or_default()
        }
        Operand::Next => quads.next().to_string(),
        Operand::FreshTemp => {
            let name = format!("T{temp_counter}");
            *temp_counter += 1;
            name
        }
        Operand::JumpPlaceholder => JUMP_PLACEHOLDER.to_string(),
        Operand::Literal(s) => s.clone(),
    }
}

/// Writes a value into the field an [`Operand::Field`] names; any other
/// operand kind is not a valid write target and is ignored.
fn write(operand: &Operand, value: String, dst: &mut AttrRecord, children: &mut [AttrRecord]) {
    if let Operand::Field { index, field } = operand {
        let rec = if *index == 0 { Some(&mut *dst) } else { children.get_mut(*index - 1) };
        if let Some(rec) = rec {
            set_field(rec, *field, value);
        }
    }
}

fn field_value(rec: &AttrRecord, field: char) -> String {
    match field {
        'V' => rec.val.clone(),
        'C' => rec.chain.to_string(),
        'H' => rec.head.to_string(),
        'T' => rec.tc.to_string(),
        'F' => rec.fc.to_string(),
        _ => String::new(),
    }
}

fn set_field(rec: &mut AttrRecord, field: char, value: String) {
    match field {
        'V' => rec.val = value,
        'C' => rec.chain = value.parse().unwrap_or(0),
        'H' => rec.head = value.parse().unwrap_or(0),
        'T' => rec.tc = value.parse().unwrap_or(0),
        'F' => rec.fc = value.parse().unwrap_or(0),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::lr::{build_table, canonical, collapse_to_lalr};

    fn build(src: &str) -> (Grammar, Table) {
        let grammar = Grammar::parse(src).unwrap();
        let canon = canonical(&grammar);
        let (lalr, _) = collapse_to_lalr(&canon);
        let (table, _warnings) = build_table(&grammar, &lalr).unwrap();
        (grammar, table)
    }

    fn tok(text: &str, kind: &str) -> (String, String) {
        (text.to_string(), kind.to_string())
    }

    #[test]
    fn parses_ccdd_and_rejects_cd() {
        let (grammar, table) = build("S -> C C\nC -> c C | d");
        let driver = Driver::new(&grammar, &table);

        let tokens = vec![tok("c", "c"), tok("c", "c"), tok("d", "d"), tok("d", "d")];
        let out = driver.run(&tokens).unwrap();
        assert_eq!(&*out.parse_tree.label, "S'");

        let bad = vec![tok("c", "c"), tok("d", "d")];
        assert!(driver.run(&bad).is_err());
    }

    #[test]
    fn dangling_else_binds_to_inner_if() {
        // the classic dangling-else shape.
        let (grammar, table) = build("S -> if E then S else S | if E then S | a\nE -> b");
        let driver = Driver::new(&grammar, &table);

        let tokens = vec![
            tok("if", "if"),
            tok("b", "b"),
            tok("then", "then"),
            tok("if", "if"),
            tok("b", "b"),
            tok("then", "then"),
            tok("a", "a"),
            tok("else", "else"),
            tok("a", "a"),
        ];
        let out = driver.run(&tokens).unwrap();

        let root = out.parse_tree;
        assert_eq!(&*root.label, "S'");
        let outer = &root.children[0];
        // Shift wins the conflict, so the outer `if` reduces via the
        // else-less alternative (4 symbols: if E then S) whose trailing S
        // is the inner `if ... else ...` (6 symbols), not the other way
        // around.
        assert_eq!(outer.children.len(), 4);
        let inner = &outer.children[3];
        assert_eq!(&*inner.label, "S");
        assert_eq!(inner.children.len(), 6);
    }

    #[test]
    fn ic_actions_emit_and_back_patch_a_conditional_jump() {
        let (grammar, table) = build("E -> id relop id");
        let ic_src = "E -> id relop id\n0 0T N\n1 j< 1V 3V J\n3 0T N";
        let actions = actions::parse_intermediate_actions(ic_src).unwrap();
        let driver = Driver::new(&grammar, &table).with_intermediate_actions(&actions);

        let tokens = vec![tok("a", "id"), tok("<", "relop"), tok("b", "id")];
        let out = driver.run(&tokens).unwrap();

        let emitted = out.quadruples.quadruples();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].op, "j<");
        assert_eq!(emitted[0].arg1, "a");
        assert_eq!(emitted[0].arg2, "b");
        // BackPatch(p=tc-before-emit=1, t=next-after-emit=2) resolves the
        // placeholder jump target to quad index 2.
        assert_eq!(emitted[0].result, "2");
    }

    #[test]
    fn syntax_actions_flatten_a_right_recursive_list_via_sibling() {
        // The grammar always augments with `S' -> L`; give that wrapper
        // production a pass-through PROMOTE too, or the final reduction
        // would discard the whole AST.
        let (grammar, table) = build("L -> L a | a");
        let syntax_src = "L -> L a\n3 1\nL -> a\n1\nS' -> L\n1";
        let actions = actions::parse_syntax_actions(syntax_src).unwrap();
        let driver = Driver::new(&grammar, &table).with_syntax_actions(&actions);

        let out = driver.run(&[tok("a", "a"), tok("a", "a"), tok("a", "a")]).unwrap();
        let ast = out.ast.unwrap();
        assert_eq!(&*ast.label, "a");
        assert_eq!(ast.siblings.len(), 2);
    }

    #[test]
    fn syntax_action_on_an_epsilon_production_does_not_panic() {
        // M -> @ pops zero children (core_len() == 0) but its role vector
        // is validated against the placeholder `@` RHS, so it still has a
        // PROMOTE at index 0 — out of bounds against the empty children
        // vec. reduce_ast must discard M's node rather than panic; S's own
        // production discards M's slot too (role 0), so the final AST is
        // unaffected by M being empty.
        let (grammar, table) = build("S -> a M b\nM -> @");
        let syntax_src = "S -> a M b\n0 0 1\nM -> @\n1\nS' -> S\n1";
        let actions = actions::parse_syntax_actions(syntax_src).unwrap();
        let driver = Driver::new(&grammar, &table).with_syntax_actions(&actions);

        let out = driver.run(&[tok("a", "a"), tok("b", "b")]).unwrap();
        let ast = out.ast.unwrap();
        assert_eq!(&*ast.label, "b");
        assert!(ast.children.is_empty());
    }

    #[test]
    fn undefined_action_reports_state_and_token() {
        let (grammar, table) = build("S -> a");
        let driver = Driver::new(&grammar, &table);
        let err = driver.run(&[tok("b", "b")]).unwrap_err();
        assert!(matches!(err, DriveError::Undefined { state: 0, .. }));
    }

    #[test]
    fn lex_token_parsing_drops_annotations() {
        let parsed = parse_lex_tokens("if keyword\n// a comment annotation\nx identifier");
        assert_eq!(parsed, vec![
            ("if".to_string(), "keyword".to_string()),
            ("x".to_string(), "identifier".to_string()),
        ]);
    }
}
