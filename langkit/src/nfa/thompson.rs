//! Thompson construction: evaluates a postfix regex (as produced by
//! [`crate::regex::prep::to_postfix`]) into an [Nfa], one stack frame per
//! postfix atom Grounded on
//! `original_source/taskone/nfa.cpp`'s `nfaChange`/`nfaOr`/`nfaAnd`/
//! `nfaClosure`/`nfaPositiveClosure`/`nfaOption`, one method per postfix
//! operator acting on a stack of `(start, accept)` fragments.

use crate::nfa::{Nfa, NfaState};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NfaBuildError {
    #[error("postfix regex left {0} fragments on the stack, expected exactly 1")]
    UnbalancedStack(usize),
    #[error("operator '{0}' had too few operands on the stack")]
    StackUnderflow(char),
}

#[derive(Debug, Clone, Copy)]
struct Fragment {
    start: usize,
    accept: usize,
}

/// A single postfix token: a literal label, the epsilon atom (`#`), or an
/// operator. Escape sequences (`\c`) are retained as a single `Literal`
/// atom ("escape sequences retained as two-character
/// atoms" — the two characters collapse to one literal here).
#[derive(Debug, Clone, PartialEq, Eq)]
enum PostfixTok {
    Literal(Rc<str>),
    Epsilon,
    Op(char),
}

fn tokenize(postfix: &str) -> Vec<PostfixTok> {
    let mut out = Vec::new();
    let mut chars = postfix.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(PostfixTok::Literal(Rc::from(escaped.to_string())));
            }
        } else if c == '#' {
            out.push(PostfixTok::Epsilon);
        } else if matches!(c, '|' | '.' | '*' | '+' | '?') {
            out.push(PostfixTok::Op(c));
        } else {
            out.push(PostfixTok::Literal(Rc::from(c.to_string())));
        }
    }
    out
}

struct Builder {
    states: Vec<NfaState>,
    stack: Vec<Fragment>,
}

impl Builder {
    fn new() -> Self {
        Self {
            states: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn alloc(&mut self) -> usize {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    fn add_epsilon(&mut self, from: usize, to: usize) {
        self.states[from].epsilon_transitions.push(to);
    }

    fn add_transition(&mut self, from: usize, label: Rc<str>, to: usize) {
        self.states[from].transitions.push((label, to));
    }

    fn pop(&mut self, op: char) -> Result<Fragment, NfaBuildError> {
        self.stack.pop().ok_or(NfaBuildError::StackUnderflow(op))
    }

    fn atom(&mut self, label: Option<Rc<str>>) {
        let s = self.alloc();
        let t = self.alloc();
        match label {
            Some(label) => self.add_transition(s, label, t),
            None => self.add_epsilon(s, t),
        }
        self.stack.push(Fragment { start: s, accept: t });
    }

    fn alt(&mut self) -> Result<(), NfaBuildError> {
        let r = self.pop('|')?;
        let l = self.pop('|')?;
        let s = self.alloc();
        let t = self.alloc();
        self.add_epsilon(s, l.start);
        self.add_epsilon(s, r.start);
        self.add_epsilon(l.accept, t);
        self.add_epsilon(r.accept, t);
        self.stack.push(Fragment { start: s, accept: t });
        Ok(())
    }

    fn concat(&mut self) -> Result<(), NfaBuildError> {
        let r = self.pop('.')?;
        let l = self.pop('.')?;
        self.add_epsilon(l.accept, r.start);
        self.stack.push(Fragment {
            start: l.start,
            accept: r.accept,
        });
        Ok(())
    }

    fn star(&mut self) -> Result<(), NfaBuildError> {
        let x = self.pop('*')?;
        let s = self.alloc();
        let t = self.alloc();
        self.add_epsilon(s, x.start);
        self.add_epsilon(s, t);
        self.add_epsilon(x.accept, t);
        self.add_epsilon(x.accept, x.start);
        self.stack.push(Fragment { start: s, accept: t });
        Ok(())
    }

    fn plus(&mut self) -> Result<(), NfaBuildError> {
        let x = self.pop('+')?;
        let s = self.alloc();
        let t = self.alloc();
        self.add_epsilon(s, x.start);
        self.add_epsilon(x.accept, t);
        self.add_epsilon(x.accept, x.start);
        self.stack.push(Fragment { start: s, accept: t });
        Ok(())
    }

    fn opt(&mut self) -> Result<(), NfaBuildError> {
        let x = self.pop('?')?;
        let s = self.alloc();
        let t = self.alloc();
        self.add_epsilon(s, x.start);
        self.add_epsilon(x.accept, t);
        self.add_epsilon(x.start, x.accept);
        self.stack.push(Fragment { start: s, accept: t });
        Ok(())
    }
}

/// Builds an [Nfa] from a postfix regex string.
pub fn build(postfix: &str) -> Result<Nfa, NfaBuildError> {
    let mut b = Builder::new();
    for tok in tokenize(postfix) {
        match tok {
            PostfixTok::Literal(l) => b.atom(Some(l)),
            PostfixTok::Epsilon => b.atom(None),
            PostfixTok::Op('|') => b.alt()?,
            PostfixTok::Op('.') => b.concat()?,
            PostfixTok::Op('*') => b.star()?,
            PostfixTok::Op('+') => b.plus()?,
            PostfixTok::Op('?') => b.opt()?,
            PostfixTok::Op(other) => return Err(NfaBuildError::StackUnderflow(other)),
        }
    }
    if b.stack.len() != 1 {
        return Err(NfaBuildError::UnbalancedStack(b.stack.len()));
    }
    let frag = b.stack[0];
    let mut alphabet: Vec<Rc<str>> = Vec::new();
    for state in &b.states {
        for (label, _) in &state.transitions {
            if !alphabet.iter().any(|a| a == label) {
                alphabet.push(label.clone());
            }
        }
    }
    Ok(Nfa {
        states: b.states,
        alphabet,
        start: frag.start,
        accept: frag.accept,
    })
}
