//! `tables` subcommand: grammar source -> ACTION/GOTO table dump.
//!
//! Reads a grammar file, builds the canonical LR(1) automaton, collapses it
//! to LALR(1), builds the ACTION/GOTO table, and prints both as a
//! column-aligned grid via `langkit::PrintTable`.

use crate::TablesArgs;
use langkit::grammar::{Grammar, GrammarParseError};
use langkit::lr::{build_table, canonical, collapse_to_lalr, Action, LrError};
use langkit::PrintTable;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("error reading {0}: {1}")]
    File(PathBuf, std::io::Error),
    #[error("error parsing grammar: {0}")]
    Grammar(#[from] GrammarParseError),
    #[error("error building LALR(1) table: {0}")]
    Lr(#[from] LrError),
}

pub fn run(args: &TablesArgs) -> Result<(), Error> {
    let src = fs::read_to_string(&args.grammar).map_err(|e| Error::File(args.grammar.clone(), e))?;
    let grammar = Grammar::parse(&src)?;

    let canon = canonical(&grammar);
    let (lalr, canonical_count) = collapse_to_lalr(&canon);
    println!(
        "{} canonical LR(1) states collapsed to {} LALR(1) states",
        canonical_count,
        lalr.states.len()
    );

    let (table, warnings) = build_table(&grammar, &lalr)?;
    for warning in &warnings {
        eprintln!(
            "warning: shift/reduce conflict in state {} on '{}', resolved as shift to {} (reduce by production {} discarded)",
            warning.state, warning.terminal, warning.shift_to, warning.reduce_production
        );
    }

    let terminals = collect_terminals(&grammar);
    let mut out = PrintTable::default();
    let mut header: Vec<&str> = vec!["state"];
    header.extend(terminals.iter().map(String::as_str));
    header.extend(grammar.nonterminals().iter().map(|s| &**s));
    out.push_row(header);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for state in 0..lalr.states.len() {
        let mut row = vec![state.to_string()];
        for terminal in &terminals {
            row.push(match table.action(state, terminal) {
                Some(Action::Shift(j)) => format!("s{j}"),
                Some(Action::Reduce(p)) => format!("r{p}"),
                Some(Action::Accept) => "acc".to_string(),
                None => String::new(),
            });
        }
        for nonterminal in grammar.nonterminals() {
            row.push(match table.goto(state, nonterminal) {
                Some(j) => j.to_string(),
                None => String::new(),
            });
        }
        rows.push(row);
    }
    for row in &rows {
        out.push_row(row.iter().map(String::as_str).collect());
    }
    println!("{}", out.to_string(" | "));

    println!("\nproductions:");
    for (idx, prod) in grammar.productions().iter().enumerate() {
        let rhs: Vec<&str> = prod.rhs.iter().map(|s| &**s).collect();
        println!("  {idx}: {} -> {}", prod.lhs, rhs.join(" "));
    }

    Ok(())
}

/// Every terminal that appears in some production's RHS, plus the end
/// marker, in first-seen order.
fn collect_terminals(grammar: &Grammar) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for prod in grammar.productions() {
        for sym in &prod.rhs {
            if !grammar.is_nonterminal(sym) && &**sym != langkit::grammar::EPSILON && seen.insert(sym.clone()) {
                out.push(sym.to_string());
            }
        }
    }
    out.push(langkit::grammar::END_MARKER.to_string());
    out
}
