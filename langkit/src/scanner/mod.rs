//! # Scanner emitter
//!
//! Materializes an ordered set of named, minimized DFAs into a maximal-munch
//! tokenizer. A [`ScannerSpec`] is the scanner specification itself — an
//! ordered mapping from token name to a minimized DFA — with
//! [`ScannerSpec::tokenize`] as the emitted scanner's behavior: keyword DFAs
//! are consulted before identifier DFAs by simply being pushed first.
//!
//! Drives each DFA attempt one character at a time via [`crate::dfa::eval::DfaEvaluator`],
//! tracking the longest prefix that lands on an accepting state across all
//! DFAs in the set, the way a generated keyword-before-identifier scanner
//! loop would.

use crate::dfa::Dfa;
use std::rc::Rc;
use thiserror::Error;

/// A single scanned token: its surface text and the name of the DFA that
/// matched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub name: Rc<str>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    /// No DFA matched at the current position: emit `<text> UNKNOWN` and
    /// halt. `text` is the single unrecognized character; `tokens` is every
    /// token recognized before the failure, which a caller must still emit
    /// — failure only terminates output after the valid prefix, it doesn't
    /// discard it.
    #[error("no token matches at position {pos}: '{text}' UNKNOWN")]
    Unknown { pos: usize, text: String, tokens: Vec<Token> },
}

/// An ordered name→DFA mapping. Order matters: keyword DFAs must be pushed
/// before identifier DFAs so they win length ties. Built by pushing named,
/// minimized DFAs in the order they should be tried.
#[derive(Debug, Clone, Default)]
pub struct ScannerSpec {
    entries: Vec<(Rc<str>, Dfa)>,
}

impl ScannerSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named DFA to the end of the ordered spec. Earlier entries
    /// are preferred on a length tie.
    pub fn push(&mut self, name: impl Into<Rc<str>>, dfa: Dfa) {
        self.entries.push((name.into(), dfa));
    }

    pub fn entries(&self) -> &[(Rc<str>, Dfa)] {
        &self.entries
    }

    /// Tokenizes the whole of `source`:
    ///
    /// 1. skip (ASCII) whitespace;
    /// 2. run every DFA in order from the cursor, tracking the longest
    ///    prefix that lands on an accepting state;
    /// 3. the longest match wins; ties go to whichever DFA was attempted
    ///    first;
    /// 4. emit `(text, name)` and advance past the match, or fail with
    ///    [`ScanError::Unknown`], which carries every token recognized
    ///    before the failure alongside it.
    ///
    /// Runs the scanner over the whole source up front rather than pulling
    /// one token at a time, returning the complete [`Vec<Token>`].
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, ScanError> {
        let chars: Vec<char> = source.chars().collect();
        let mut pos = 0;
        let mut tokens = Vec::new();

        while pos < chars.len() {
            if chars[pos].is_whitespace() {
                pos += 1;
                continue;
            }

            let mut best: Option<(usize, usize)> = None; // (len, entry idx)
            for (entry_idx, (_, dfa)) in self.entries.iter().enumerate() {
                let len = self.longest_accepting_run(dfa, &chars[pos..]);
                if let Some(len) = len {
                    let better = match best {
                        None => true,
                        Some((best_len, _)) => len > best_len,
                    };
                    if better {
                        best = Some((len, entry_idx));
                    }
                }
            }

            match best {
                Some((len, entry_idx)) if len > 0 => {
                    let text: String = chars[pos..pos + len].iter().collect();
                    tokens.push(Token {
                        text,
                        name: self.entries[entry_idx].0.clone(),
                    });
                    pos += len;
                }
                _ => {
                    let bad = chars[pos].to_string();
                    return Err(ScanError::Unknown { pos, text: bad, tokens });
                }
            }
        }

        Ok(tokens)
    }

    /// Runs `dfa` from its start state over `input`, returning the length
    /// of the longest prefix that ends in an accepting state (or `None` if
    /// no non-empty accepting prefix exists). Stops early once the DFA
    /// enters its trap state, since no further input can make it accept
    /// again.
    fn longest_accepting_run(&self, dfa: &Dfa, input: &[char]) -> Option<usize> {
        let mut state = dfa.initial_state_index();
        let mut best: Option<usize> = None;
        if dfa.states()[state].is_accepting() {
            best = Some(0);
        }

        let rev: Vec<(&str, usize)> = dfa
            .alphabet()
            .iter()
            .enumerate()
            .map(|(idx, s)| (s.as_ref(), idx))
            .collect();

        for (i, c) in input.iter().enumerate() {
            let label = c.to_string();
            let Some(&(_, label_idx)) = rev.iter().find(|(s, _)| *s == label) else {
                break;
            };
            state = dfa.states()[state].transitions()[label_idx];
            if dfa.is_trap(state) {
                break;
            }
            if dfa.states()[state].is_accepting() {
                best = Some(i + 1);
            }
        }
        best
    }
}
