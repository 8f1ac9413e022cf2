//! # LR automaton builder
//!
//! Canonical LR(1) item sets, CLOSURE/GOTO, the LALR(1) same-core merge, and
//! the resulting ACTION/GOTO table.
//!
//! CLOSURE's lookahead recurrence reuses [`crate::grammar::Grammar::first_of_seq`]
//! for `FIRST(βL)`, and the LALR(1) merge is a union-find over same-core
//! canonical states. States and edges live in dense `Vec`s indexed by
//! `usize`, the same no-pointers, no-`Rc`-cycles shape as [`crate::dfa::Dfa`].

use crate::grammar::{FirstSets, Grammar, EPSILON, END_MARKER};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use thiserror::Error;

/// A canonical LR(1) item: `(production, dot, lookaheads)`. Two items are
/// equal only when their lookahead sets also match too — this
/// lookahead-inclusive equality is what canonical LR(1) state identity
/// relies on; [`Item::core`] gives the lookahead-independent projection
/// used for LALR(1) merging.
#[derive(Debug, Clone)]
pub struct Item {
    pub production: usize,
    pub dot: usize,
    pub lookaheads: HashSet<Rc<str>>,
}

impl Item {
    /// `(production, dot)`, ignoring lookaheads — the "same core" key two
    /// canonical states are merged on for LALR(1) .
    pub fn core(&self) -> (usize, usize) {
        (self.production, self.dot)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.production == other.production && self.dot == other.dot && self.lookaheads == other.lookaheads
    }
}
impl Eq for Item {}

/// Inserts `item` into `items`, merging its lookaheads into an existing
/// same-core item rather than duplicating it. Returns whether `items`
/// changed (new item, or a lookahead the existing item didn't have yet) —
/// the termination signal for the CLOSURE fixed-point.
fn merge_same_core(items: &mut Vec<Item>, item: Item) -> bool {
    if item.lookaheads.is_empty() {
        return false;
    }
    if let Some(existing) = items.iter_mut().find(|it| it.core() == item.core()) {
        let before = existing.lookaheads.len();
        existing.lookaheads.extend(item.lookaheads);
        existing.lookaheads.len() != before
    } else {
        items.push(item);
        true
    }
}

/// CLOSURE : for every item `(A -> α.Bβ, L)` with `B` a
/// non-terminal, and every production `B -> γ`, adds `(B -> .γ, FIRST(βL))`
/// — where `FIRST(βL)` is the union, over each lookahead terminal `l` in
/// `L`, of `FIRST(β·l)` (`β` followed by the single terminal `l`). Iterates
/// to a fixed point since closing one item can introduce another
/// non-terminal at the dot.
pub fn closure(grammar: &Grammar, first: &FirstSets, seed: Vec<Item>) -> Vec<Item> {
    let mut items = seed;
    loop {
        let mut additions = Vec::new();
        for item in &items {
            let prod = grammar.production(item.production);
            let Some(b) = prod.symbol_at(item.dot) else {
                continue;
            };
            if !grammar.is_nonterminal(b) {
                continue;
            }
            let beta = if item.dot + 1 < prod.core_len() {
                &prod.rhs[item.dot + 1..]
            } else {
                &[][..]
            };

            let mut lookaheads = HashSet::new();
            for l in &item.lookaheads {
                let mut seq: Vec<Rc<str>> = beta.to_vec();
                seq.push(l.clone());
                lookaheads.extend(grammar.first_of_seq(&seq, first).into_iter().filter(|s| &**s != EPSILON));
            }

            for &prod_idx in grammar.productions_for(b) {
                additions.push(Item {
                    production: prod_idx,
                    dot: 0,
                    lookaheads: lookaheads.clone(),
                });
            }
        }
        let mut changed = false;
        for item in additions {
            changed |= merge_same_core(&mut items, item);
        }
        if !changed {
            break;
        }
    }
    items
}

/// GOTO(I, X) : every item that can advance its dot over `X`,
/// advanced, then closed.
pub fn goto(grammar: &Grammar, first: &FirstSets, items: &[Item], symbol: &str) -> Vec<Item> {
    let mut moved = Vec::new();
    for item in items {
        let prod = grammar.production(item.production);
        if prod.symbol_at(item.dot).map(|s| &**s) == Some(symbol) {
            merge_same_core(
                &mut moved,
                Item {
                    production: item.production,
                    dot: item.dot + 1,
                    lookaheads: item.lookaheads.clone(),
                },
            );
        }
    }
    if moved.is_empty() {
        return moved;
    }
    closure(grammar, first, moved)
}

/// Canonical key for a whole item set, including lookaheads: a sorted
/// `Vec` so two [`HashMap`]-friendly keys compare equal regardless of
/// build order. Used to detect when GOTO has revisited an already
/// constructed canonical LR(1) state: states are memoized by content rather
/// than recomputed, keeping construction from blowing up exponentially on
/// grammars whose item sets recur.
fn canonical_key(items: &[Item]) -> Vec<((usize, usize), Vec<Rc<str>>)> {
    let mut key: Vec<_> = items
        .iter()
        .map(|it| {
            let mut las: Vec<Rc<str>> = it.lookaheads.iter().cloned().collect();
            las.sort();
            (it.core(), las)
        })
        .collect();
    key.sort();
    key
}

/// Same-core key for a whole item set (lookaheads dropped): two canonical
/// LR(1) states with the same cores are merge candidates under LALR(1).
fn same_core_key(items: &[Item]) -> Vec<(usize, usize)> {
    let mut key: Vec<(usize, usize)> = items.iter().map(Item::core).collect();
    key.sort();
    key.dedup();
    key
}

/// The distinct symbols at some item's dot, in first-seen order (closing
/// over `@` never happens, since [`crate::grammar::Production::symbol_at`]
/// is always `None` for an epsilon production).
fn symbols_after_dot(grammar: &Grammar, items: &[Item]) -> Vec<Rc<str>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let prod = grammar.production(item.production);
        if let Some(sym) = prod.symbol_at(item.dot) {
            if seen.insert(sym.clone()) {
                out.push(sym.clone());
            }
        }
    }
    out
}

/// An LR automaton: states are each a canonical item set, `edges[i][X]` is
/// `GOTO(state i, X)`'s target state.
#[derive(Debug, Clone)]
pub struct Automaton {
    pub states: Vec<Vec<Item>>,
    pub edges: Vec<HashMap<Rc<str>, usize>>,
}

/// The index of the grammar's synthetic top-level `S' -> S` production —
/// [`Grammar::parse`](crate::grammar::Grammar) always augments, so the start
/// symbol always has exactly one production, and this is always well-defined.
fn accept_production(grammar: &Grammar) -> usize {
    grammar.productions_for(grammar.start())[0]
}

/// Builds the canonical LR(1) automaton via BFS from the initial item
/// `(S'-acceptance-production -> .S, {$})`, memoizing already-seen
/// item sets by their full content.
pub fn canonical(grammar: &Grammar) -> Automaton {
    let first = grammar.first_sets();
    let initial = Item {
        production: accept_production(grammar),
        dot: 0,
        lookaheads: HashSet::from([Rc::from(END_MARKER)]),
    };
    let start_items = closure(grammar, &first, vec![initial]);

    let mut states = vec![start_items.clone()];
    let mut edges = vec![HashMap::new()];
    let mut seen: HashMap<_, usize> = HashMap::from([(canonical_key(&start_items), 0)]);
    let mut queue = VecDeque::from([0usize]);

    while let Some(id) = queue.pop_front() {
        let items = states[id].clone();
        for symbol in symbols_after_dot(grammar, &items) {
            let goto_items = goto(grammar, &first, &items, &symbol);
            if goto_items.is_empty() {
                continue;
            }
            let key = canonical_key(&goto_items);
            let target = *seen.entry(key).or_insert_with(|| {
                states.push(goto_items);
                edges.push(HashMap::new());
                queue.push_back(states.len() - 1);
                states.len() - 1
            });
            edges[id].insert(symbol, target);
        }
    }

    Automaton { states, edges }
}

/// Collapses a canonical LR(1) automaton to LALR(1) by union-find over
/// same-core states, merging each group's items (union of lookaheads per
/// shared core) and remapping edges to the merged state ids. Returns the
/// merged automaton and the number of canonical (pre-merge) states, for
/// diagnostics.
pub fn collapse_to_lalr(canonical: &Automaton) -> (Automaton, usize) {
    let n = canonical.states.len();
    let mut parent: Vec<usize> = (0..n).collect();
    fn find(parent: &mut [usize], x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }

    let keys: Vec<_> = canonical.states.iter().map(|s| same_core_key(s)).collect();
    let mut by_key: HashMap<&Vec<(usize, usize)>, usize> = HashMap::new();
    for (idx, key) in keys.iter().enumerate() {
        match by_key.get(key) {
            Some(&rep) => {
                let (a, b) = (find(&mut parent, idx), find(&mut parent, rep));
                if a != b {
                    parent[a] = b;
                }
            }
            None => {
                by_key.insert(key, idx);
            }
        }
    }

    let mut new_id_of = vec![0usize; n];
    let mut next_id = 0usize;
    let mut rep_to_new: HashMap<usize, usize> = HashMap::new();
    for i in 0..n {
        let rep = find(&mut parent, i);
        let id = *rep_to_new.entry(rep).or_insert_with(|| {
            let id = next_id;
            next_id += 1;
            id
        });
        new_id_of[i] = id;
    }

    let mut merged_items: Vec<Vec<Item>> = vec![Vec::new(); next_id];
    for (i, state) in canonical.states.iter().enumerate() {
        let target = &mut merged_items[new_id_of[i]];
        for item in state {
            merge_same_core(target, item.clone());
        }
    }

    let mut merged_edges: Vec<HashMap<Rc<str>, usize>> = vec![HashMap::new(); next_id];
    for (i, edges) in canonical.edges.iter().enumerate() {
        let target = &mut merged_edges[new_id_of[i]];
        for (symbol, &dest) in edges {
            target.insert(symbol.clone(), new_id_of[dest]);
        }
    }

    (
        Automaton {
            states: merged_items,
            edges: merged_edges,
        },
        n,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(usize),
    Reduce(usize),
    Accept,
}

/// A resolved shift/reduce conflict: shift wins, but the resolution is
/// reported. Reduce/reduce conflicts have no such resolution and are a
/// hard [`LrError`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftReduceWarning {
    pub state: usize,
    pub terminal: Rc<str>,
    pub shift_to: usize,
    pub reduce_production: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LrError {
    #[error("reduce/reduce conflict in state {state} on lookahead '{terminal}' between productions {first} and {second}")]
    ReduceReduce {
        state: usize,
        terminal: String,
        first: usize,
        second: usize,
    },
}

/// The ACTION/GOTO table: ACTION indexed by `(state,
/// terminal)`, GOTO indexed by `(state, non-terminal)`.
#[derive(Debug, Clone, Default)]
pub struct Table {
    action: HashMap<(usize, Rc<str>), Action>,
    goto: HashMap<(usize, Rc<str>), usize>,
}

impl Table {
    pub fn action(&self, state: usize, terminal: &str) -> Option<Action> {
        self.action.get(&(state, Rc::from(terminal))).copied()
    }

    pub fn goto(&self, state: usize, nonterminal: &str) -> Option<usize> {
        self.goto.get(&(state, Rc::from(nonterminal))).copied()
    }
}

/// Builds the ACTION/GOTO table from an automaton's states and edges
/// (canonical LR(1) or already-merged LALR(1) — the construction is the
/// same either way). Conflict policy: shift/reduce always
/// resolves to shift, collecting a [`ShiftReduceWarning`]; reduce/reduce
/// between two different productions is an [`LrError`].
pub fn build_table(grammar: &Grammar, automaton: &Automaton) -> Result<(Table, Vec<ShiftReduceWarning>), LrError> {
    let accept_prod = accept_production(grammar);
    let mut table = Table::default();
    let mut warnings = Vec::new();

    for (state, edges) in automaton.edges.iter().enumerate() {
        for (symbol, &target) in edges {
            if grammar.is_nonterminal(symbol) {
                table.goto.insert((state, symbol.clone()), target);
            } else {
                table.action.insert((state, symbol.clone()), Action::Shift(target));
            }
        }
    }

    for (state, items) in automaton.states.iter().enumerate() {
        for item in items {
            let prod = grammar.production(item.production);
            if prod.symbol_at(item.dot).is_some() {
                continue;
            }
            let is_accept = item.production == accept_prod;
            for la in &item.lookaheads {
                if is_accept && &**la == END_MARKER {
                    table.action.insert((state, la.clone()), Action::Accept);
                    continue;
                }
                match table.action.get(&(state, la.clone())) {
                    None => {
                        table.action.insert((state, la.clone()), Action::Reduce(item.production));
                    }
                    Some(Action::Shift(to)) => {
                        warnings.push(ShiftReduceWarning {
                            state,
                            terminal: la.clone(),
                            shift_to: *to,
                            reduce_production: item.production,
                        });
                    }
                    Some(Action::Reduce(other)) if *other != item.production => {
                        return Err(LrError::ReduceReduce {
                            state,
                            terminal: la.to_string(),
                            first: *other,
                            second: item.production,
                        });
                    }
                    Some(Action::Reduce(_)) | Some(Action::Accept) => {}
                }
            }
        }
    }

    Ok((table, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    #[test]
    fn lalr_merge_collapses_ten_states_to_seven() {
        let grammar = Grammar::parse("S -> C C\nC -> c C | d").unwrap();
        let canonical = canonical(&grammar);
        assert_eq!(canonical.states.len(), 10);

        let (lalr, canonical_count) = collapse_to_lalr(&canonical);
        assert_eq!(canonical_count, 10);
        assert_eq!(lalr.states.len(), 7);

        let (table, warnings) = build_table(&grammar, &lalr).unwrap();
        assert!(warnings.is_empty());
        assert!(table.action(0, "c").is_some());
        assert!(table.action(0, "d").is_some());
    }

    #[test]
    fn dangling_else_resolves_to_shift() {
        // classic dangling-else shift/reduce conflict, resolved by shift
        // (the innermost `if` binds the `else`).
        let grammar = Grammar::parse(
            "S -> if S E | i\nE -> else S | @",
        )
        .unwrap();
        let canonical = canonical(&grammar);
        let (lalr, _) = collapse_to_lalr(&canonical);
        let (_table, warnings) = build_table(&grammar, &lalr).unwrap();
        assert!(!warnings.is_empty());
        assert!(warnings.iter().all(|w| &*w.terminal == "else"));
    }

    #[test]
    fn reduce_reduce_conflict_is_an_error() {
        // Ambiguous: both A -> x and B -> x can reduce x under the same
        // lookahead with no way to tell LHS apart from a single token.
        let grammar = Grammar::parse("S -> A | B\nA -> x\nB -> x").unwrap();
        let canonical = canonical(&grammar);
        let (lalr, _) = collapse_to_lalr(&canonical);
        let result = build_table(&grammar, &lalr);
        assert!(matches!(result, Err(LrError::ReduceReduce { .. })));
    }

    #[test]
    fn accept_action_present_on_full_reduction() {
        let grammar = Grammar::parse("S -> a S | a").unwrap();
        let canonical = canonical(&grammar);
        let (lalr, _) = collapse_to_lalr(&canonical);
        let (table, _warnings) = build_table(&grammar, &lalr).unwrap();
        // Some state must accept on `$` once `a` has fully reduced back to S'.
        assert!((0..lalr.states.len()).any(|s| table.action(s, "$") == Some(Action::Accept)));
    }
}
