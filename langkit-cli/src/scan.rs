//! `scan` subcommand: regex definitions + source file -> tokenized output.
//!
//! Compiles the regex definitions to DFAs and hands them to
//! `langkit::scanner::ScannerSpec::tokenize`, which scans with longest
//! match, first-attempted wins ties, and halts on an unrecognized run —
//! emitting every token recognized before the failure, then the
//! `<text> UNKNOWN` line.

use crate::ScanArgs;
use langkit::dfa::Dfa;
use langkit::nfa::thompson;
use langkit::regex::prep;
use langkit::scanner::ScannerSpec;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("error reading {0}: {1}")]
    File(PathBuf, std::io::Error),
    #[error("error compiling regex definitions: {0}")]
    Regex(#[from] prep::RegexError),
    #[error("error building NFA for '{0}': {1}")]
    Nfa(String, langkit::nfa::thompson::NfaBuildError),
}

pub fn run(args: &ScanArgs) -> Result<(), Error> {
    let regex_src = fs::read_to_string(&args.regex).map_err(|e| Error::File(args.regex.clone(), e))?;
    let source = fs::read_to_string(&args.source).map_err(|e| Error::File(args.source.clone(), e))?;

    let compiled = prep::compile(&regex_src)?;

    let mut spec = ScannerSpec::new();
    for (name, postfix) in compiled {
        let nfa = thompson::build(&postfix).map_err(|e| Error::Nfa(name.clone(), e))?;
        let mut dfa = Dfa::from_nfa(&nfa);
        dfa.minimize();
        spec.push(name, dfa);
    }

    match spec.tokenize(&source) {
        Ok(tokens) => {
            for token in tokens {
                println!("{} {}", token.text, token.name);
            }
        }
        Err(langkit::scanner::ScanError::Unknown { text, tokens, .. }) => {
            for token in tokens {
                println!("{} {}", token.text, token.name);
            }
            println!("{text} UNKNOWN");
        }
    }
    Ok(())
}
