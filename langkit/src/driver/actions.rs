//! Semantic-action file parsers : the *syntax-action* file
//! (per-production PROMOTE/CHILD/SIBLING role vectors) and the
//! *intermediate-code-action* file (per-production opcode lists driving
//! [`crate::driver::quad::QuadrupleTable`]).
//!
//! Both files key their entries by a production written in the same
//! canonical `A -> X1 X2 … Xk` form as the grammar source ,
//! parsed with [`crate::grammar::parse`]'s line combinators.

use crate::grammar::parse::parse_line;
use nom::character::complete::{digit1, one_of};
use nom::combinator::{all_consuming, map_res};
use nom::sequence::pair;
use nom::IResult;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionParseError {
    #[error("'{0}' is not a canonical production line 'A -> X1 X2 ... Xk'")]
    Production(String),
    #[error("'{0}' is not a valid syntax-action role vector (expected integers in 0..=3)")]
    Roles(String),
    #[error("'{0}' is not a valid intermediate-code action line")]
    Action(String),
}

/// A single `A -> X1 X2 … Xk` production in canonical (single-alternative)
/// form, shared by both action-file kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalProduction {
    pub lhs: Rc<str>,
    pub rhs: Vec<Rc<str>>,
}

fn parse_canonical(line: &str) -> Result<CanonicalProduction, ActionParseError> {
    let parsed = parse_line(line).ok_or_else(|| ActionParseError::Production(line.to_string()))?;
    if parsed.alternatives.len() != 1 {
        return Err(ActionParseError::Production(line.to_string()));
    }
    Ok(CanonicalProduction {
        lhs: Rc::from(parsed.lhs),
        rhs: parsed.alternatives[0].iter().map(|s| Rc::from(*s)).collect(),
    })
}

/// One production's PROMOTE(1)/CHILD(2)/SIBLING(3) role vector, aligned
/// positionally with `production.rhs`. `0` (or a missing entry) discards
/// that RHS position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxAction {
    pub production: CanonicalProduction,
    pub roles: Vec<u8>,
}

/// Parses the syntax-action file: alternating production line / role-vector
/// line pairs, blank lines ignored .
pub fn parse_syntax_actions(input: &str) -> Result<Vec<SyntaxAction>, ActionParseError> {
    let lines: Vec<&str> = input.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() % 2 != 0 {
        return Err(ActionParseError::Roles(lines.last().copied().unwrap_or("").to_string()));
    }
    let mut out = Vec::with_capacity(lines.len() / 2);
    for pair in lines.chunks_exact(2) {
        let production = parse_canonical(pair[0])?;
        let roles: Vec<u8> = pair[1]
            .split_whitespace()
            .map(|tok| tok.parse::<u8>().ok().filter(|r| *r <= 3))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| ActionParseError::Roles(pair[1].to_string()))?;
        if roles.len() != production.rhs.len() {
            return Err(ActionParseError::Roles(pair[1].to_string()));
        }
        out.push(SyntaxAction { production, roles });
    }
    Ok(out)
}

/// An operand descriptor: the two-character `<i><F>` field-select scheme,
/// plus its two virtual fields and the `J` jump-placeholder literal.
/// Anything else is taken as a literal operand string (an opcode mnemonic
/// like `j<`, or a literal piece of text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `<i><F>`: `i == 0` selects the production's own result record,
    /// `i >= 1` selects the `i`-th RHS attribute record; `F` is one of
    /// `C`(hain) `H`(ead) `T`C `F`C `V`al.
    Field { index: usize, field: char },
    /// `N`: the quadruple table's `NEXT` index.
    Next,
    /// `P`: allocate a fresh temporary `T<n>`.
    FreshTemp,
    /// `J`: the jump placeholder `_`.
    JumpPlaceholder,
    Literal(String),
}

fn field_descriptor(input: &str) -> IResult<&str, Operand> {
    let (rest, (index, field)) = pair(map_res(digit1, str::parse::<usize>), one_of("CHTFV"))(input)?;
    Ok((rest, Operand::Field { index, field }))
}

fn parse_operand(token: &str) -> Operand {
    if token == "J" {
        return Operand::JumpPlaceholder;
    }
    if token == "N" {
        return Operand::Next;
    }
    if token == "P" {
        return Operand::FreshTemp;
    }
    match all_consuming(field_descriptor)(token) {
        Ok((_, operand)) => operand,
        Err(_) => Operand::Literal(token.to_string()),
    }
}

/// One intermediate-code action, opcodes `0`..`3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `0 dst src`: copy a field's value.
    Assign { dst: Operand, src: Operand },
    /// `1 op a b c`: `GEN(op, a, b, c)`.
    Emit { op: Operand, a: Operand, b: Operand, c: Operand },
    /// `2 dst b c`: `dst <- Merge(b, c)`.
    Merge { dst: Operand, b: Operand, c: Operand },
    /// `3 p t`: `BackPatch(p, t)`.
    BackPatch { p: Operand, t: Operand },
}

fn parse_action_line(line: &str) -> Result<Action, ActionParseError> {
    let mut tokens = line.split_whitespace();
    let opcode = tokens.next().ok_or_else(|| ActionParseError::Action(line.to_string()))?;
    let rest: Vec<Operand> = tokens.map(parse_operand).collect();
    match (opcode, rest.as_slice()) {
        ("0", [dst, src]) => Ok(Action::Assign { dst: dst.clone(), src: src.clone() }),
        ("1", [op, a, b, c]) => Ok(Action::Emit {
            op: op.clone(),
            a: a.clone(),
            b: b.clone(),
            c: c.clone(),
        }),
        ("2", [dst, b, c]) => Ok(Action::Merge {
            dst: dst.clone(),
            b: b.clone(),
            c: c.clone(),
        }),
        ("3", [p, t]) => Ok(Action::BackPatch { p: p.clone(), t: t.clone() }),
        _ => Err(ActionParseError::Action(line.to_string())),
    }
}

/// One block of the intermediate-code-action file: a production and the
/// ordered action list evaluated on its reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateAction {
    pub production: CanonicalProduction,
    pub actions: Vec<Action>,
}

/// Parses the intermediate-code-action file: `---`-separated blocks, each
/// headed by a canonical production line .
pub fn parse_intermediate_actions(input: &str) -> Result<Vec<IntermediateAction>, ActionParseError> {
    let mut out = Vec::new();
    for block in input.split("\n---\n").flat_map(|b| b.split("\r\n---\r\n")) {
        let lines: Vec<&str> = block.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if lines.is_empty() {
            continue;
        }
        let production = parse_canonical(lines[0])?;
        let actions = lines[1..].iter().map(|l| parse_action_line(l)).collect::<Result<_, _>>()?;
        out.push(IntermediateAction { production, actions });
    }
    Ok(out)
}
