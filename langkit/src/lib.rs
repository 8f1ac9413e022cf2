//! # langkit
//!
//! A compiler-construction core: regular expressions through Thompson NFA
//! construction, subset construction to a DFA, and Hopcroft minimization,
//! down to a table-driven maximal-munch scanner ([`regex`], [`nfa`],
//! [`dfa`], [`scanner`]); and a context-free grammar through FIRST/FOLLOW,
//! canonical LR(1) automaton construction, and LALR(1) same-core merging,
//! down to a shift-reduce driver that concurrently builds a parse
//! tree/AST and emits back-patched three-address quadruples ([`grammar`],
//! [`lr`], [`driver`]).
//!
//! ## Usage
//!
//! ```rust
//! use langkit::dfa::Dfa;
//! use langkit::nfa::thompson;
//! use langkit::regex::prep::to_postfix;
//!
//! let postfix = to_postfix("(a|b)*abb").unwrap();
//! let nfa = thompson::build(&postfix).unwrap();
//! let mut dfa = Dfa::from_nfa(&nfa);
//! dfa.minimize();
//! assert!(dfa.accepts(&["a", "b", "b"]));
//! assert!(!dfa.accepts(&["a", "b"]));
//! ```
//!
//! ## Pipeline
//!
//! * [Preprocessing](regex::prep) named regex definitions (bracket-class
//!   expansion, helper merging, shunting-yard to postfix).
//! * [Thompson construction](nfa::thompson) of an ε-NFA from postfix.
//! * [Subset construction and minimization](dfa::Dfa) to a DFA.
//! * [Emitting a maximal-munch scanner](scanner::ScannerSpec) from an
//!   ordered set of named, minimized DFAs.
//! * [Parsing a grammar and computing FIRST/FOLLOW](grammar::Grammar).
//! * [Building the canonical LR(1) automaton and collapsing it to
//!   LALR(1)](lr), then the [ACTION/GOTO table](lr::Table).
//! * [Driving a shift-reduce parse](driver::Driver) while concurrently
//!   building a [parse tree and AST](driver::tree) and [emitting
//!   back-patched quadruples](driver::quad).

pub mod dfa;
pub mod driver;
pub mod grammar;
pub mod lr;
pub mod nfa;
pub mod regex;
pub mod scanner;
mod table;

pub use table::Table as PrintTable;

#[cfg(test)]
mod proptests;

#[cfg(test)]
mod tests {
    use crate::dfa::Dfa;
    use crate::nfa::thompson::build;
    use crate::regex::prep::to_postfix;
    use crate::scanner::ScannerSpec;

    /// End-to-end smoke test of the whole regex→scanner pipeline: postfix
    /// to NFA to DFA to minimal DFA to an emitted scanner.
    #[test]
    fn identifier_pipeline_round_trips() {
        let postfix = to_postfix("(a|b)(a|b|0|1)*").unwrap();
        let nfa = build(&postfix).unwrap();
        let mut dfa = Dfa::from_nfa(&nfa);
        dfa.minimize();

        let mut spec = ScannerSpec::new();
        spec.push("identifier", dfa);
        let tokens = spec.tokenize("a1 b0").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "a1");
        assert_eq!(tokens[1].text, "b0");
    }
}
