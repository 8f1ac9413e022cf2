//! `parse` subcommand: grammar + lex file (+ optional action files) -> parse
//! tree / AST / quadruples.
//!
//! Builds the LALR(1) table, loads any semantic-action tables supplied,
//! then drives `langkit::driver::Driver` over the lex tokens and prints
//! whichever of the parse tree, AST, and quadruple table it produced.

use crate::ParseArgs;
use langkit::driver::actions::{self, ActionParseError};
use langkit::driver::tree::{AstNode, ParseNode};
use langkit::driver::{parse_lex_tokens, Driver, DriveError};
use langkit::grammar::{Grammar, GrammarParseError};
use langkit::lr::{build_table, canonical, collapse_to_lalr, LrError};
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
    #[error("error parsing action file: {0}")]
    Action(#[from] ActionParseError),
    #[error("parse failed: {0}")]
    Drive(#[from] DriveError),
}

pub fn run(args: &ParseArgs) -> Result<(), Error> {
    let grammar_src = fs::read_to_string(&args.grammar).map_err(|e| Error::File(args.grammar.clone(), e))?;
    let lex_src = fs::read_to_string(&args.lex).map_err(|e| Error::File(args.lex.clone(), e))?;

    let grammar = Grammar::parse(&grammar_src)?;
    let canon = canonical(&grammar);
    let (lalr, _) = collapse_to_lalr(&canon);
    let (table, warnings) = build_table(&grammar, &lalr)?;
    for warning in &warnings {
        eprintln!(
            "warning: shift/reduce conflict in state {} on '{}', resolved as shift",
            warning.state, warning.terminal
        );
    }

    let syntax_actions = args
        .syntax_actions
        .as_ref()
        .map(|path| {
            let src = fs::read_to_string(path).map_err(|e| Error::File(path.clone(), e))?;
            actions::parse_syntax_actions(&src).map_err(Error::from)
        })
        .transpose()?;
    let intermediate_actions = args
        .intermediate_actions
        .as_ref()
        .map(|path| {
            let src = fs::read_to_string(path).map_err(|e| Error::File(path.clone(), e))?;
            actions::parse_intermediate_actions(&src).map_err(Error::from)
        })
        .transpose()?;

    let mut driver = Driver::new(&grammar, &table);
    if let Some(actions) = &syntax_actions {
        driver = driver.with_syntax_actions(actions);
    }
    if let Some(actions) = &intermediate_actions {
        driver = driver.with_intermediate_actions(actions);
    }

    let tokens = parse_lex_tokens(&lex_src);
    let output = driver.run(&tokens)?;

    println!("parse tree:");
    print_parse_tree(&output.parse_tree, 0);

    if let Some(ast) = &output.ast {
        println!("\nabstract syntax tree:");
        print_ast(ast, 0);
    }

    if !output.quadruples.quadruples().is_empty() {
        println!("\nquadruples:");
        print!("{}", output.quadruples);
    }

    Ok(())
}

fn print_parse_tree(node: &ParseNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match &node.token {
        Some(text) => println!("{indent}{} '{text}'", node.label),
        None => println!("{indent}{}", node.label),
    }
    for child in &node.children {
        print_parse_tree(child, depth + 1);
    }
}

fn print_ast(node: &AstNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match &node.token {
        Some(text) => println!("{indent}{} '{text}'", node.label),
        None => println!("{indent}{}", node.label),
    }
    for child in &node.children {
        print_ast(child, depth + 1);
    }
    for sibling in &node.siblings {
        print_ast(sibling, depth);
    }
}
