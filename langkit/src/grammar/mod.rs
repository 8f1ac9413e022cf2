//! # Grammar Analyzer (C5)
//!
//! Parses a context-free grammar (`A -> α1 | α2 | … | αn` lines), augments
//! its start symbol when needed, and computes FIRST/FOLLOW sets.
//!
//! Line parsing is staged as `Parsed*` structs validated into a `Grammar`
//! by `TryFrom`, keeping the parse/validate split clean; FIRST-of-a-symbol-
//! sequence is exposed as [`Grammar::first_of_seq`] for reuse by
//! [`crate::lr`]'s closure computation.

pub mod parse;

use parse::ParsedProduction;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

pub const EPSILON: &str = "@";
pub const END_MARKER: &str = "$";
const AUGMENTED_START: &str = "S'";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarParseError {
    #[error("line '{0}' is not of the form 'A -> a1 a2 ... | b1 b2 ...'")]
    Malformed(String),
}

/// One production `lhs -> rhs`. `rhs == ["@"]` denotes the empty production.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    pub lhs: Rc<str>,
    pub rhs: Vec<Rc<str>>,
}

impl Production {
    pub fn is_epsilon(&self) -> bool {
        self.rhs.len() == 1 && &*self.rhs[0] == EPSILON
    }

    /// The number of real symbols in this production's RHS: `0` for an
    /// epsilon production (whose RHS is the literal placeholder `@`, not a
    /// symbol to ever shift or close over), `rhs.len()` otherwise.
    pub fn core_len(&self) -> usize {
        if self.is_epsilon() {
            0
        } else {
            self.rhs.len()
        }
    }

    /// The symbol at RHS position `dot`, or `None` if `dot` is at or past
    /// the end of the production (always `None` for an epsilon production,
    /// which is complete at `dot == 0`).
    pub fn symbol_at(&self, dot: usize) -> Option<&Rc<str>> {
        if self.is_epsilon() {
            None
        } else {
            self.rhs.get(dot)
        }
    }
}

pub type SymbolSet = HashSet<Rc<str>>;
pub type FirstSets = HashMap<Rc<str>, SymbolSet>;
pub type FollowSets = HashMap<Rc<str>, SymbolSet>;

/// A context-free grammar: non-terminals in declaration order, a start
/// symbol, and a deduplicated production table . Reductions in
/// [`crate::lr`] reference a production by its index into
/// [`Grammar::productions`].
#[derive(Debug, Clone)]
pub struct Grammar {
    nonterminals: Vec<Rc<str>>,
    nonterminal_set: HashSet<Rc<str>>,
    start: Rc<str>,
    productions: Vec<Production>,
    by_lhs: HashMap<Rc<str>, Vec<usize>>,
}

impl Grammar {
    /// Parses and builds a grammar from `A -> α1 | α2 | … | αn` source
    /// text. Rejects unparseable lines before augmentation or FIRST/FOLLOW
    /// are attempted.
    pub fn parse(input: &str) -> Result<Grammar, GrammarParseError> {
        let mut order: Vec<String> = Vec::new();
        let mut alternatives: HashMap<String, Vec<Vec<String>>> = HashMap::new();

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let ParsedProduction { lhs, alternatives: alts } = parse::parse_line(line)
                .ok_or_else(|| GrammarParseError::Malformed(line.to_string()))?;
            if !alternatives.contains_key(lhs) {
                order.push(lhs.to_string());
            }
            alternatives
                .entry(lhs.to_string())
                .or_default()
                .extend(alts.into_iter().map(|alt| alt.into_iter().map(str::to_string).collect()));
        }

        if order.is_empty() {
            return Err(GrammarParseError::Malformed("<empty grammar>".to_string()));
        }

        let nonterminals: Vec<Rc<str>> = order.iter().map(|n| Rc::from(n.as_str())).collect();
        let nonterminal_set: HashSet<Rc<str>> = nonterminals.iter().cloned().collect();
        let start = nonterminals[0].clone();

        let mut productions = Vec::new();
        let mut by_lhs: HashMap<Rc<str>, Vec<usize>> = HashMap::new();
        for name in &order {
            let lhs: Rc<str> = Rc::from(name.as_str());
            for alt in &alternatives[name] {
                let rhs: Vec<Rc<str>> = alt.iter().map(|s| Rc::from(s.as_str())).collect();
                let prod = Production { lhs: lhs.clone(), rhs };
                if !productions.contains(&prod) {
                    by_lhs.entry(lhs.clone()).or_default().push(productions.len());
                    productions.push(prod);
                }
            }
        }

        let mut grammar = Grammar {
            nonterminals,
            nonterminal_set,
            start,
            productions,
            by_lhs,
        };
        grammar.augment();
        Ok(grammar)
    }

    /// Adds `S' -> S` and makes `S'` the start symbol, unconditionally. §4.6's
    /// initial item is always `(S' -> .S, {$})`, so the augmented production
    /// is needed even when `S` itself has a single alternative — the dragon-
    /// book LR(1)/LALR(1) state counts (scenario S4's 10 canonical states
    /// collapsing to 7) are only correct relative to that extra top-level
    /// production, not to `S` itself as the accepting production.
    fn augment(&mut self) {
        let augmented_start: Rc<str> = Rc::from(AUGMENTED_START);
        let idx = self.productions.len();
        self.productions.push(Production {
            lhs: augmented_start.clone(),
            rhs: vec![self.start.clone()],
        });
        self.by_lhs.insert(augmented_start.clone(), vec![idx]);
        self.nonterminals.insert(0, augmented_start.clone());
        self.nonterminal_set.insert(augmented_start.clone());
        self.start = augmented_start;
    }

    pub fn start(&self) -> &Rc<str> {
        &self.start
    }

    pub fn nonterminals(&self) -> &[Rc<str>] {
        &self.nonterminals
    }

    pub fn is_nonterminal(&self, symbol: &str) -> bool {
        self.nonterminal_set.contains(symbol)
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, idx: usize) -> &Production {
        &self.productions[idx]
    }

    /// Indices of the productions whose LHS is `name`, in declaration order.
    pub fn productions_for(&self, name: &str) -> &[usize] {
        self.by_lhs.get(name).map_or(&[], Vec::as_slice)
    }

    /// FIRST sets : `FIRST(t) = {t}` for terminals, computed
    /// to a fixed point for non-terminals. `@` may appear in a
    /// non-terminal's set if it derives the empty string.
    pub fn first_sets(&self) -> FirstSets {
        let mut first: FirstSets = HashMap::new();
        loop {
            let mut changed = false;
            for prod in &self.productions {
                let rhs_first = self.first_of_seq(&prod.rhs, &first);
                let entry = first.entry(prod.lhs.clone()).or_default();
                let before = entry.len();
                entry.extend(rhs_first);
                changed |= entry.len() != before;
            }
            if !changed {
                break;
            }
        }
        first
    }

    /// `FIRST` of a single symbol: the literal singleton `{t}` for a
    /// terminal (including `@` and `$`, which are their own FIRST), or the
    /// accumulated set for a non-terminal.
    fn first_of_symbol(&self, symbol: &Rc<str>, first: &FirstSets) -> SymbolSet {
        if self.is_nonterminal(symbol) {
            first.get(symbol).cloned().unwrap_or_default()
        } else {
            SymbolSet::from([symbol.clone()])
        }
    }

    /// `FIRST` of a symbol sequence `β`: walks symbols left to right,
    /// accumulating each one's FIRST set and stopping as soon as one doesn't
    /// derive `@`. An empty sequence's FIRST is `{@}`. Shared with
    /// [`crate::lr`]'s CLOSURE, which needs `FIRST(βL)` for a lookahead
    /// terminal `L` appended after `β`.
    pub fn first_of_seq(&self, seq: &[Rc<str>], first: &FirstSets) -> SymbolSet {
        let mut out = SymbolSet::new();
        if seq.len() == 1 && &*seq[0] == EPSILON {
            out.insert(Rc::from(EPSILON));
            return out;
        }
        let mut all_nullable = true;
        for sym in seq {
            let sym_first = self.first_of_symbol(sym, first);
            out.extend(sym_first.iter().filter(|s| &***s != EPSILON).cloned());
            if !sym_first.contains(EPSILON) {
                all_nullable = false;
                break;
            }
        }
        if all_nullable {
            out.insert(Rc::from(EPSILON));
        }
        out
    }

    /// FOLLOW sets : `FOLLOW(start) ⊇ {$}`, then fixed-point
    /// over every production.
    pub fn follow_sets(&self, first: &FirstSets) -> FollowSets {
        let mut follow: FollowSets = HashMap::new();
        follow
            .entry(self.start.clone())
            .or_default()
            .insert(Rc::from(END_MARKER));

        loop {
            let mut changed = false;
            for prod in &self.productions {
                for (i, sym) in prod.rhs.iter().enumerate() {
                    if &**sym == EPSILON || !self.is_nonterminal(sym) {
                        continue;
                    }
                    let beta = &prod.rhs[i + 1..];
                    let beta_first = self.first_of_seq(beta, first);

                    let add: SymbolSet = beta_first.iter().filter(|s| &***s != EPSILON).cloned().collect();
                    let entry = follow.entry(sym.clone()).or_default();
                    let before = entry.len();
                    entry.extend(add);
                    changed |= entry.len() != before;

                    if beta.is_empty() || beta_first.contains(EPSILON) {
                        let lhs_follow = follow.get(&prod.lhs).cloned().unwrap_or_default();
                        let entry = follow.entry(sym.clone()).or_default();
                        let before = entry.len();
                        entry.extend(lhs_follow);
                        changed |= entry.len() != before;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        follow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_always_augmented() {
        let g = Grammar::parse("S -> a S | b").unwrap();
        assert_eq!(&**g.start(), "S'");
        assert_eq!(g.productions_for("S'").len(), 1);
    }

    #[test]
    fn single_alternative_start_is_still_augmented() {
        let g = Grammar::parse("S -> a B\nB -> b | c").unwrap();
        assert_eq!(&**g.start(), "S'");
        assert_eq!(g.productions_for("S").len(), 1);
    }

    #[test]
    fn lalr_merge_grammar_first_follow() {
        // S -> C C, C -> c C | d
        let g = Grammar::parse("S -> C C\nC -> c C | d").unwrap();
        assert_eq!(&**g.start(), "S'");

        let first = g.first_sets();
        assert_eq!(first["C"], SymbolSet::from([Rc::from("c"), Rc::from("d")]));

        let follow = g.follow_sets(&first);
        assert!(follow["S"].contains("$"));
        assert!(follow["C"].contains("$"));
        assert!(follow["C"].contains("c"));
        assert!(follow["C"].contains("d"));
    }

    #[test]
    fn malformed_line_is_rejected() {
        assert!(matches!(
            Grammar::parse("this is not a production"),
            Err(GrammarParseError::Malformed(_))
        ));
    }

    #[test]
    fn epsilon_production_contributes_to_first() {
        let g = Grammar::parse("S -> a M b\nM -> @").unwrap();
        let first = g.first_sets();
        assert!(first["M"].contains("@"));
    }
}
