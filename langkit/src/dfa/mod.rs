//! # Deterministic finite automaton (C3)
//!
//! [`Dfa`] is built from an [`Nfa`](crate::nfa::Nfa) by subset construction
//! ([`Dfa::from_nfa`]) and reduced to its unique minimal form by Hopcroft
//! partition refinement ([`Dfa::minimize`]). States are numbered densely
//! from 0 in a single `Vec<DfaState>` — no raw pointer graphs; transitions
//! are total over the alphabet by construction — a label with no reachable
//! NFA state set is routed to a single non-accepting trap state, so every
//! `(state, label)` pair has a target without requiring `Option` at every
//! lookup site (states that can never again reach an accepting state all
//! collapse into the trap during minimization).
//!
//! Subset construction generalizes the usual ε-closure worklist from a
//! fixed pre-declared alphabet to one collected from whichever labels
//! actually occur in the source NFA; minimization is Hopcroft partition
//! refinement over the resulting states.

pub mod eval;

use crate::nfa::Nfa;
pub use eval::DfaEvaluator;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;

/// A state in a [`Dfa`]: whether it accepts, and its transition target for
/// each alphabet element (aligned by index with [`Dfa::alphabet`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DfaState {
    pub(crate) accepting: bool,
    pub(crate) transitions: Vec<usize>,
}

impl DfaState {
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Transition targets, one per alphabet element, in the DFA's alphabet order.
    pub fn transitions(&self) -> &[usize] {
        &self.transitions
    }
}

/// A deterministic finite automaton over a `Rc<str>` alphabet. See the
/// [module-level documentation](crate::dfa) for how it is constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dfa {
    pub(crate) alphabet: Rc<[Rc<str>]>,
    pub(crate) states: Vec<DfaState>,
    pub(crate) initial_state: usize,
    /// The index of the non-accepting sink state added to make transitions
    /// total, if subset construction needed one. `None` if every state
    /// already had a transition on every alphabet element.
    pub(crate) trap_state: Option<usize>,
}

impl Dfa {
    /// Subset construction : the start DFA state is the
    /// ε-closure of the NFA start state; a worklist explores unseen NFA
    /// state sets, one per alphabet label, closing each label-reachable set
    /// under ε before it becomes (or is matched to) a DFA state. A DFA
    /// state is accepting iff its underlying set contains the NFA accept
    /// state.
    pub fn from_nfa(nfa: &Nfa) -> Dfa {
        let alphabet: Rc<[Rc<str>]> = nfa.alphabet().iter().cloned().collect();

        let start_set = nfa.closure(nfa.start());
        let start_key: BTreeSet<usize> = start_set.iter().copied().collect();

        let mut id_of: HashMap<BTreeSet<usize>, usize> = HashMap::new();
        let mut sets: Vec<HashSet<usize>> = Vec::new();
        id_of.insert(start_key.clone(), 0);
        sets.push(start_set);

        let mut worklist: VecDeque<usize> = VecDeque::from([0]);
        let mut transition_table: Vec<Vec<Option<usize>>> = vec![vec![None; alphabet.len()]];

        while let Some(id) = worklist.pop_front() {
            let current = sets[id].clone();
            for (label_idx, label) in alphabet.iter().enumerate() {
                let moved = nfa.step_set(&current, label);
                if moved.is_empty() {
                    continue;
                }
                let closed = nfa.closure_set(&moved);
                let key: BTreeSet<usize> = closed.iter().copied().collect();
                let target = *id_of.entry(key.clone()).or_insert_with(|| {
                    sets.push(closed.clone());
                    transition_table.push(vec![None; alphabet.len()]);
                    worklist.push_back(sets.len() - 1);
                    sets.len() - 1
                });
                transition_table[id][label_idx] = Some(target);
            }
        }

        let needs_trap = transition_table.iter().any(|row| row.iter().any(Option::is_none));
        let trap_state = needs_trap.then_some(sets.len());

        let mut states: Vec<DfaState> = sets
            .iter()
            .zip(transition_table.into_iter())
            .map(|(set, row)| DfaState {
                accepting: set.contains(&nfa.accept()),
                transitions: row
                    .into_iter()
                    .map(|t| t.unwrap_or_else(|| trap_state.expect("trap allocated above")))
                    .collect(),
            })
            .collect();

        if let Some(trap) = trap_state {
            states.push(DfaState {
                accepting: false,
                transitions: vec![trap; alphabet.len()],
            });
        }

        Dfa {
            alphabet,
            states,
            initial_state: 0,
            trap_state,
        }
    }

    /// Whether `idx` names the trap state (never accepting, never worth
    /// continuing a maximal-munch scan into).
    pub fn is_trap(&self, idx: usize) -> bool {
        self.trap_state == Some(idx)
    }

    /// Minimizes this DFA: removes unreachable states, then merges
    /// non-distinguishable states. The result is the unique minimal DFA
    /// for the language — no two distinct states share a row-equivalence.
    pub fn minimize(&mut self) {
        self.remove_unreachable_states();
        self.merge_nondistinguishable_states();
    }

    /// Merges non-distinguishable states, one survivor per equivalence
    /// class. Which member of a class survives is unspecified.
    pub fn merge_nondistinguishable_states(&mut self) {
        let mapper = self
            .state_equivalence_classes_idx()
            .into_iter()
            .flat_map(|set| {
                debug_assert!(!set.is_empty(), "equivalence classes are never empty");
                let mut iter = set.into_iter();
                let keep = iter.next();
                iter.map(move |old| (old, keep.expect("class has at least one member")))
            })
            .collect::<HashMap<_, _>>();
        let map = |idx| mapper.get(&idx).copied();
        self.remap_transitions(map);
        if let Some(new_initial) = map(self.initial_state) {
            self.initial_state = new_initial;
        }
        if let Some(trap) = self.trap_state {
            self.trap_state = Some(map(trap).unwrap_or(trap));
        }
        let to_remove = mapper.into_keys().collect();
        self.remove_states(to_remove);
    }

    /// The equivalence classes (sets of non-distinguishable states) of this
    /// DFA, by state index. Hopcroft partition refinement: start from
    /// `{accepting, non-accepting}` and repeatedly split a block whenever
    /// members disagree on which block their successor (for some alphabet
    /// symbol) lands in.
    pub fn state_equivalence_classes_idx(&self) -> Vec<HashSet<usize>> {
        let (finals, nonfinals): (HashSet<usize>, HashSet<usize>) =
            (0..self.states.len()).partition(|&idx| self.states[idx].accepting);
        if finals.is_empty() {
            return vec![nonfinals];
        } else if nonfinals.is_empty() {
            return vec![finals];
        }
        let mut p = vec![finals, nonfinals];
        let mut w = p.clone();

        while let Some(a) = w.pop() {
            for c in 0..self.alphabet.len() {
                let x: HashSet<usize> = self
                    .states
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| a.contains(&s.transitions[c]))
                    .map(|(i, _)| i)
                    .collect();
                p = p
                    .into_iter()
                    .flat_map(|y| {
                        let inters: HashSet<usize> = x.intersection(&y).copied().collect();
                        let diff: HashSet<usize> = y.difference(&x).copied().collect();
                        if !inters.is_empty() && !diff.is_empty() {
                            if let Some(idx) = w.iter().position(|hs| hs == &y) {
                                w.swap_remove(idx);
                                w.push(inters.clone());
                                w.push(diff.clone());
                            } else if inters.len() <= diff.len() {
                                w.push(inters.clone());
                            } else {
                                w.push(diff.clone());
                            }
                            vec![inters, diff].into_iter()
                        } else {
                            vec![y].into_iter()
                        }
                    })
                    .collect()
            }
        }
        p
    }

    /// Removes states that are unreachable from the initial state.
    pub fn remove_unreachable_states(&mut self) {
        let states = self.unreachable_state_idx().into_iter().collect();
        self.remove_states(states);
    }

    /// The indices of states unreachable from the initial state.
    pub fn unreachable_state_idx(&self) -> HashSet<usize> {
        let reachables = self.reachable_state_idx();
        (0..self.states.len())
            .filter(|x| !reachables.contains(x))
            .collect()
    }

    /// The indices of states reachable from the initial state.
    pub fn reachable_state_idx(&self) -> HashSet<usize> {
        let mut reachables = HashSet::from([self.initial_state]);
        let mut new_states = reachables.clone();
        while !new_states.is_empty() {
            new_states = new_states
                .drain()
                .flat_map(|state| self.states[state].transitions.iter().copied())
                .filter(|&state| reachables.insert(state))
                .collect();
        }
        reachables
    }

    fn remap_transitions(&mut self, mapper: impl Fn(usize) -> Option<usize>) {
        self.states.iter_mut().for_each(|state| {
            state
                .transitions
                .iter_mut()
                .for_each(|trans| *trans = mapper(*trans).unwrap_or(*trans))
        })
    }

    /// Removes the states at the given indices, remapping every remaining
    /// transition. The initial state can never be among them.
    fn remove_states(&mut self, mut to_remove: Vec<usize>) {
        let mut old_state_idx = (0..self.states.len()).collect::<Vec<_>>();

        to_remove.sort_unstable();
        to_remove.dedup();
        if let Err(less_than) = to_remove.binary_search(&self.initial_state) {
            self.initial_state -= less_than;
        } else {
            panic!("cannot remove the initial state");
        }
        if let Some(trap) = self.trap_state {
            if let Err(less_than) = to_remove.binary_search(&trap) {
                self.trap_state = Some(trap - less_than);
            }
        }

        to_remove.iter().rev().for_each(|&idx| {
            self.states.remove(idx);
            old_state_idx.remove(idx);
        });

        let map = |idx| {
            let res = old_state_idx.binary_search(&idx);
            if cfg!(debug_assertions) {
                Some(res.expect("no transitions should target a removed state"))
            } else {
                res.ok()
            }
        };
        self.remap_transitions(map);
    }

    /// Whether this automaton accepts `string`.
    pub fn accepts(&self, string: &[&str]) -> bool {
        let mut eval = self.evaluator();
        eval.step_multiple(string);
        eval.is_accepting()
    }

    /// An evaluator for stepping through this DFA one element at a time.
    pub fn evaluator(&self) -> DfaEvaluator<'_> {
        self.into()
    }

    pub fn alphabet(&self) -> &[Rc<str>] {
        &self.alphabet
    }

    pub fn states(&self) -> &[DfaState] {
        self.states.as_slice()
    }

    pub fn initial_state(&self) -> &DfaState {
        &self.states[self.initial_state]
    }

    pub fn initial_state_index(&self) -> usize {
        self.initial_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::thompson::build;
    use crate::regex::prep::to_postfix;

    fn dfa_for(pattern: &str) -> Dfa {
        let postfix = to_postfix(pattern).unwrap();
        let nfa = build(&postfix).unwrap();
        Dfa::from_nfa(&nfa)
    }

    #[test]
    fn subset_construction_matches_nfa_language() {
        let postfix = to_postfix("a(b|c)*").unwrap();
        let nfa = build(&postfix).unwrap();
        let dfa = Dfa::from_nfa(&nfa);
        assert!(dfa.accepts(&["a"]));
        assert!(dfa.accepts(&["a", "b", "c", "b"]));
        assert!(!dfa.accepts(&["b"]));
        assert!(!dfa.accepts(&[]));
    }

    #[test]
    fn minimize_preserves_language() {
        let mut dfa = dfa_for("(a|b)*abb");
        let before_states = dfa.states().len();
        dfa.minimize();
        assert!(dfa.states().len() <= before_states);
        assert!(dfa.accepts(&["a", "b", "b"]));
        assert!(dfa.accepts(&["b", "a", "b", "b"]));
        assert!(!dfa.accepts(&["a", "b"]));
    }

    #[test]
    fn minimize_has_no_duplicate_row_equivalence() {
        let mut dfa = dfa_for("(a|b)*abb");
        dfa.minimize();
        let classes = dfa.state_equivalence_classes_idx();
        assert_eq!(classes.len(), dfa.states().len());
    }

    #[test]
    fn trap_state_rejects_unexpected_symbol() {
        let dfa = dfa_for("ab");
        assert!(!dfa.accepts(&["a", "a"]));
        assert!(!dfa.accepts(&["a", "b", "c"]));
    }
}
