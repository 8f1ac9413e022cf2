mod parse;
mod scan;
mod tables;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// langkit: regex-to-scanner and grammar-to-LALR(1)-parser construction.
#[derive(Debug, Parser)]
#[command(name = "langkit", about = "A compiler-construction workbench: regex -> scanner, grammar -> LALR(1) parser")]
struct LangkitArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a set of named regex definitions into a scanner and tokenize a source file with it.
    Scan(ScanArgs),
    /// Parse a grammar + lex file, optionally driving the tree/AST builder and quadruple emitter.
    Parse(ParseArgs),
    /// Build and print the ACTION/GOTO table for a grammar.
    Tables(TablesArgs),
}

#[derive(Debug, Parser)]
struct ScanArgs {
    /// Path to the regex-definitions file (`name = body` per line).
    #[arg(long)]
    regex: PathBuf,
    /// Path to the source file to tokenize.
    #[arg(long)]
    source: PathBuf,
}

#[derive(Debug, Parser)]
struct ParseArgs {
    /// Path to the grammar source file.
    #[arg(long)]
    grammar: PathBuf,
    /// Path to the lex-file input (`<text> <token-name>` per line).
    #[arg(long)]
    lex: PathBuf,
    /// Path to the syntax-action file (tree-builder PROMOTE/CHILD/SIBLING vectors).
    #[arg(long)]
    syntax_actions: Option<PathBuf>,
    /// Path to the intermediate-code-action file (quadruple emitter opcodes).
    #[arg(long)]
    intermediate_actions: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct TablesArgs {
    /// Path to the grammar source file.
    #[arg(long)]
    grammar: PathBuf,
}

fn main() {
    let args = LangkitArgs::parse();
    let result = match &args.command {
        Command::Scan(args) => scan::run(args),
        Command::Parse(args) => parse::run(args),
        Command::Tables(args) => tables::run(args),
    };
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
