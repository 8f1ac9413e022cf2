//! # Regex preprocessor (C1)
//!
//! Turns a set of named regex definitions (one `name = body` line each)
//! into postfix regex strings ready for
//! [`thompson::build`](crate::nfa::thompson::build):
//! bracket-class expansion, name merging with helper/export filtering,
//! explicit-concatenation insertion, and shunting-yard to postfix.
//!
//! Grounded on `original_source/taskone/utils/utils.cpp`, which performs the
//! same three string-rewrite passes (class expansion, merging, concat
//! insertion) before its own shunting-yard pass.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegexError {
    #[error("definition '{0}' participates in a cyclic reference chain")]
    CyclicDefinition(String),
    #[error("unbalanced parenthesis in regex body")]
    UnbalancedParens,
    #[error("line '{0}' is not of the form 'name = body'")]
    MalformedDefinition(String),
}

/// Parses a regex-definitions file into `(name, body)` pairs, in the order
/// they appear. Blank lines are ignored; every other line must be of the
/// form `name = body` (whitespace around `=` is insignificant, matching
/// whitespace around the name and body is stripped).
pub fn parse_definitions(input: &str) -> Result<Vec<(&str, &str)>, RegexError> {
    input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            line.split_once('=')
                .map(|(name, body)| (name.trim(), body.trim()))
                .ok_or_else(|| RegexError::MalformedDefinition(line.to_string()))
        })
        .collect()
}

/// Expands every `[...]` bracket class in `body` whose interior is a
/// concatenation of three-character ranges `a-b` into `(c1|c2|...|cn)`.
/// A bracket whose interior length isn't a multiple of three is truncated
/// (no error is raised for a malformed class). An empty bracket is
/// dropped. A `]` with no matching `[` is left as a literal character.
/// Backslash escapes the following character, which is passed through
/// untouched (including inside or outside brackets).
pub fn expand_classes(body: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                out.push('\\');
                out.push(chars[i + 1]);
                i += 2;
            }
            '[' => {
                if let Some(close) = chars[i + 1..].iter().position(|&c| c == ']') {
                    let close = i + 1 + close;
                    let interior = &chars[i + 1..close];
                    out.push_str(&expand_one_class(interior));
                    i = close + 1;
                } else {
                    out.push('[');
                    i += 1;
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn expand_one_class(interior: &[char]) -> String {
    let usable = (interior.len() / 3) * 3;
    let mut alts = Vec::new();
    for chunk in interior[..usable].chunks_exact(3) {
        let (lo, dash, hi) = (chunk[0], chunk[1], chunk[2]);
        debug_assert_eq!(dash, '-');
        let (lo, hi) = (lo as u32, hi as u32);
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        for cp in lo..=hi {
            if let Some(c) = char::from_u32(cp) {
                alts.push(c);
            }
        }
    }
    if alts.is_empty() {
        String::new()
    } else {
        let mut s = String::from("(");
        for (idx, c) in alts.iter().enumerate() {
            if idx > 0 {
                s.push('|');
            }
            if "()∅|*+?\\#".contains(*c) {
                s.push('\\');
            }
            s.push(*c);
        }
        s.push(')');
        s
    }
}

/// Textually substitutes every defined name, parenthesized, into every
/// other body — to a fixed point — then retains only the names beginning
/// with `_` (helpers are dropped), with the leading underscore stripped
/// from the returned key. Substitution is a whole-word replace: a name is
/// only substituted where it isn't itself part of a longer identifier.
pub fn merge(defs: &[(&str, &str)]) -> Result<HashMap<String, String>, RegexError> {
    let mut bodies: HashMap<String, String> = defs
        .iter()
        .map(|(n, b)| (n.to_string(), b.to_string()))
        .collect();
    let names: Vec<String> = defs.iter().map(|(n, _)| n.to_string()).collect();

    let max_passes = names.len() + 1;
    let mut pass = 0;
    loop {
        let mut changed = false;
        for name in &names {
            let replacement = bodies[name].clone();
            for other in &names {
                if other == name {
                    continue;
                }
                let body = bodies.get_mut(other).unwrap();
                let substituted = substitute_word(body, name, &replacement);
                if substituted != *body {
                    *body = substituted;
                    changed = true;
                }
            }
        }
        pass += 1;
        if !changed {
            break;
        }
        if pass > max_passes {
            let culprit = names
                .iter()
                .find(|n| bodies[*n].contains(n.as_str()))
                .cloned()
                .unwrap_or_else(|| names[0].clone());
            return Err(RegexError::CyclicDefinition(culprit));
        }
    }

    Ok(bodies
        .into_iter()
        .filter_map(|(name, body)| name.strip_prefix('_').map(|rest| (rest.to_string(), body)))
        .collect())
}

fn substitute_word(haystack: &str, name: &str, replacement: &str) -> String {
    let chars: Vec<char> = haystack.chars().collect();
    let name_chars: Vec<char> = name.chars().collect();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let end = i + name_chars.len();
        let matches = end <= chars.len() && chars[i..end] == name_chars[..];
        let before_ok = i == 0 || !is_word(chars[i - 1]);
        let after_ok = end >= chars.len() || !is_word(chars[end]);
        if matches && before_ok && after_ok {
            out.push('(');
            out.push_str(replacement);
            out.push(')');
            i = end;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// One token of a regex body: an atom (one character, or an escaped pair
/// kept together), a parenthesis, or an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RTok {
    Atom(String),
    LParen,
    RParen,
    Op(char),
}

fn tokenize(body: &str) -> Vec<RTok> {
    let mut out = Vec::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(RTok::Atom(format!("\\{next}")));
                }
            }
            '(' => out.push(RTok::LParen),
            ')' => out.push(RTok::RParen),
            '|' | '*' | '+' | '?' => out.push(RTok::Op(c)),
            other => out.push(RTok::Atom(other.to_string())),
        }
    }
    out
}

fn is_atom_end(tok: &RTok) -> bool {
    matches!(tok, RTok::Atom(_) | RTok::RParen | RTok::Op('*') | RTok::Op('+') | RTok::Op('?'))
}

fn is_atom_start(tok: &RTok) -> bool {
    matches!(tok, RTok::Atom(_) | RTok::LParen)
}

/// Inserts the explicit concatenation operator (internal token `Op('.')`)
/// between any two adjacent atoms
fn insert_concat(tokens: Vec<RTok>) -> Vec<RTok> {
    let mut out = Vec::with_capacity(tokens.len() * 2);
    let mut prev: Option<RTok> = None;
    for tok in tokens {
        if let Some(p) = &prev {
            if is_atom_end(p) && is_atom_start(&tok) {
                out.push(RTok::Op('.'));
            }
        }
        prev = Some(tok.clone());
        out.push(tok);
    }
    out
}

fn precedence(op: char) -> u8 {
    match op {
        '|' => 1,
        '.' => 2,
        '*' | '+' | '?' => 4,
        _ => 0,
    }
}

/// Shunting-yard: converts a token stream (parens/operators/atoms) to a
/// postfix string. Operators of equal-or-higher precedence are popped
/// before a new one is pushed (left-associative)
fn shunting_yard(tokens: Vec<RTok>) -> Result<String, RegexError> {
    let mut output = String::new();
    let mut ops: Vec<RTok> = Vec::new();
    for tok in tokens {
        match tok {
            RTok::Atom(a) => output.push_str(&a),
            RTok::LParen => ops.push(RTok::LParen),
            RTok::RParen => {
                loop {
                    match ops.pop() {
                        Some(RTok::LParen) => break,
                        Some(RTok::Op(o)) => output.push(o),
                        _ => return Err(RegexError::UnbalancedParens),
                    }
                }
            }
            RTok::Op(o) => {
                while let Some(RTok::Op(top)) = ops.last() {
                    if precedence(*top) >= precedence(o) {
                        output.push(*top);
                        ops.pop();
                    } else {
                        break;
                    }
                }
                ops.push(RTok::Op(o));
            }
        }
    }
    while let Some(tok) = ops.pop() {
        match tok {
            RTok::Op(o) => output.push(o),
            _ => return Err(RegexError::UnbalancedParens),
        }
    }
    Ok(output)
}

/// Runs concatenation-insertion then shunting-yard on a single regex body,
/// producing its postfix form.
pub fn to_postfix(body: &str) -> Result<String, RegexError> {
    shunting_yard(insert_concat(tokenize(body)))
}

/// Runs the full C1 pipeline over a definitions file: parse, expand
/// bracket classes, merge, then shunting-yard every exported (`_`-prefixed)
/// definition to postfix. Returns `(name, postfix)` pairs, name with the
/// leading underscore stripped, **in declaration order** — the scanner
/// emitter (C4) relies on that order to try keyword DFAs before identifier
/// DFAs, so this deliberately returns a `Vec` rather than the `HashMap`
/// [`merge`] uses internally for substitution.
pub fn compile(input: &str) -> Result<Vec<(String, String)>, RegexError> {
    let defs = parse_definitions(input)?;
    let expanded: Vec<(&str, String)> = defs
        .iter()
        .map(|(n, b)| (*n, expand_classes(b)))
        .collect();
    let expanded_refs: Vec<(&str, &str)> =
        expanded.iter().map(|(n, b)| (*n, b.as_str())).collect();
    let merged = merge(&expanded_refs)?;
    defs.iter()
        .filter_map(|(name, _)| name.strip_prefix('_').map(|rest| rest.to_string()))
        .filter_map(|name| merged.get(&name).cloned().map(|body| (name, body)))
        .map(|(name, body)| to_postfix(&body).map(|p| (name, p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_simple_range() {
        assert_eq!(expand_classes("[a-c]"), "(a|b|c)");
    }

    #[test]
    fn expands_multiple_ranges() {
        assert_eq!(expand_classes("[a-zA-Z]").starts_with('('), true);
        assert!(expand_classes("[a-zA-Z]").contains('Z'));
    }

    #[test]
    fn empty_bracket_is_dropped() {
        assert_eq!(expand_classes("x[]y"), "xy");
    }

    #[test]
    fn truncates_non_multiple_of_three() {
        // "ab" is 2 chars, not a full range, so it's truncated away entirely
        assert_eq!(expand_classes("[ab]"), "()");
    }

    #[test]
    fn lone_bracket_close_is_literal() {
        assert_eq!(expand_classes("a]b"), "a]b");
    }

    #[test]
    fn merge_substitutes_helper_into_export() {
        let defs = vec![("digit", "[0-9]"), ("_num", "digit+")];
        let expanded: Vec<(&str, String)> =
            defs.iter().map(|(n, b)| (*n, expand_classes(b))).collect();
        let refs: Vec<(&str, &str)> = expanded.iter().map(|(n, b)| (*n, b.as_str())).collect();
        let merged = merge(&refs).unwrap();
        assert_eq!(merged.len(), 1);
        assert!(merged.contains_key("num"));
        assert!(merged["num"].contains('0'));
    }

    #[test]
    fn cyclic_definition_is_rejected() {
        let defs = vec![("_a", "b"), ("b", "a")];
        assert!(matches!(merge(&defs), Err(RegexError::CyclicDefinition(_))));
    }

    #[test]
    fn compile_preserves_declaration_order_of_exported_names() {
        let src = "letter = [a-zA-Z]\ndigit = [0-9]\n_keyword = if|else\n_identifier = letter(letter|digit)*";
        let compiled = compile(src).unwrap();
        let names: Vec<&str> = compiled.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["keyword", "identifier"]);
    }

    #[test]
    fn postfix_inserts_concat_and_handles_precedence() {
        assert_eq!(to_postfix("ab").unwrap(), "ab.");
        assert_eq!(to_postfix("a|b").unwrap(), "ab|");
        assert_eq!(to_postfix("a*b").unwrap(), "a*b.");
        assert_eq!(to_postfix("(a|b)c").unwrap(), "ab|c.");
    }
}
