//! Property tests for three invariants the regex-to-scanner pipeline must
//! hold for every input: NFA, DFA, and minimized-DFA acceptance must agree;
//! a minimized DFA has no two states with identical row-equivalence; and a
//! back-patch chain always terminates.
//!
//! Regexes are generated over a small fixed alphabet so an independently
//! implemented regex engine can be used as an acceptance oracle alongside
//! the hand-rolled pipeline.

use crate::dfa::Dfa;
use crate::driver::quad::QuadrupleTable;
use crate::nfa::thompson::build;
use crate::regex::prep::to_postfix;
use ::regex::Regex as LibRegex;
use proptest::prelude::*;
use rand::prelude::*;

/// A small recursive regex generator over the literal alphabet `a`-`d`,
/// covering alternation, concatenation, and all three postfix repetition
/// operators this crate's shunting-yard supports (`*`, `+`, `?`).
fn random_regex() -> impl Strategy<Value = String> {
    prop::char::range('a', 'd').prop_map(|c| c.to_string()).prop_recursive(6, 64, 8, |inner| {
        prop_oneof![
            5 => prop::collection::vec(inner.clone(), 1..5)
                .prop_map(|parts| format!("({})", parts.join(""))),
            5 => prop::collection::vec(inner.clone(), 2..5)
                .prop_map(|parts| parts.join("|")),
            2 => inner.clone().prop_map(|r| format!("({r})*")),
            2 => inner.clone().prop_map(|r| format!("({r})+")),
            2 => inner.prop_map(|r| format!("({r})?")),
        ]
    })
}

fn test_strings() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-d]{0,6}", 10)
}

proptest! {
    /// The three stages of the regex→scanner pipeline must accept exactly
    /// the same strings at every stage: NFA, subset-constructed DFA, and
    /// Hopcroft-minimized DFA never disagree.
    #[test]
    fn nfa_dfa_minimized_dfa_agree_on_acceptance(regex_str in random_regex(), tests in test_strings()) {
        let postfix = to_postfix(&regex_str).unwrap();
        let nfa = build(&postfix).unwrap();
        let dfa = Dfa::from_nfa(&nfa);
        let mut minimized = dfa.clone();
        minimized.minimize();

        for test in &tests {
            let word: Vec<String> = test.chars().map(String::from).collect();
            let word_refs: Vec<&str> = word.iter().map(String::as_str).collect();
            let nfa_accepts = nfa.accepts(&word_refs);
            let dfa_accepts = dfa.accepts(&word_refs);
            let min_accepts = minimized.accepts(&word_refs);
            prop_assert_eq!(nfa_accepts, dfa_accepts, "NFA/DFA disagree on {:?} for /{}/", test, regex_str);
            prop_assert_eq!(dfa_accepts, min_accepts, "DFA/minimized-DFA disagree on {:?} for /{}/", test, regex_str);
        }
    }

    /// After minimization, no two states share a row-equivalence class:
    /// the equivalence-class count equals the state count.
    #[test]
    fn minimized_dfa_has_no_duplicate_row_equivalence(regex_str in random_regex()) {
        let postfix = to_postfix(&regex_str).unwrap();
        let nfa = build(&postfix).unwrap();
        let mut dfa = Dfa::from_nfa(&nfa);
        dfa.minimize();
        let classes = dfa.state_equivalence_classes_idx();
        prop_assert_eq!(classes.len(), dfa.states().len(), "minimize left non-distinguishable states for /{}/", regex_str);
    }

    /// Cross-checks the minimized DFA against an independently-implemented
    /// regex engine, over the same small alphabet.
    #[test]
    fn minimized_dfa_agrees_with_library_regex(regex_str in random_regex(), tests in test_strings()) {
        let postfix = to_postfix(&regex_str).unwrap();
        let nfa = build(&postfix).unwrap();
        let mut dfa = Dfa::from_nfa(&nfa);
        dfa.minimize();

        let lib_regex = LibRegex::new(&format!("^({regex_str})$")).unwrap();
        for test in &tests {
            let word: Vec<String> = test.chars().map(String::from).collect();
            let word_refs: Vec<&str> = word.iter().map(String::as_str).collect();
            prop_assert_eq!(
                dfa.accepts(&word_refs),
                lib_regex.is_match(test),
                "DFA and library regex disagree on {:?} for /{}/",
                test,
                regex_str
            );
        }
    }

    /// A back-patch chain of arbitrary length, built purely from `result`
    /// links terminated by `0`, always resolves: `back_patch` walks the
    /// whole chain and every link ends up rewritten to the patch target.
    #[test]
    fn back_patch_chain_always_terminates(chain_len in 1usize..30, patch_to in 1usize..1000) {
        let mut table = QuadrupleTable::new();
        let mut head = 0usize;
        for _ in 0..chain_len {
            head = table.gen("j<", "x", "y", head.to_string());
        }
        table.back_patch(head, patch_to);
        for q in table.quadruples() {
            prop_assert_eq!(&q.result, &patch_to.to_string());
        }
    }

    /// Splicing a shuffled set of independent chains together with `Merge`
    /// and then `BackPatch`-ing the result must still terminate and patch
    /// every chain, regardless of the order the chains were merged in.
    #[test]
    fn merge_then_back_patch_terminates_in_any_merge_order(num_chains in 1usize..8, patch_to in 1usize..1000) {
        let mut table = QuadrupleTable::new();
        let mut heads: Vec<usize> = (0..num_chains).map(|_| table.gen("j<", "x", "y", "0")).collect();
        heads.shuffle(&mut thread_rng());

        let merged = heads
            .into_iter()
            .reduce(|p1, p2| table.merge(p1, p2))
            .expect("num_chains >= 1");
        table.back_patch(merged, patch_to);
        for q in table.quadruples() {
            prop_assert_eq!(&q.result, &patch_to.to_string());
        }
    }
}
