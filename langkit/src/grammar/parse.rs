//! `nom` line parser for the grammar source format:
//! `A -> α1 | α2 | … | αn`, symbols whitespace-separated, `@` denoting the
//! empty production. A small combinator per syntactic piece, composed
//! bottom-up.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_till1};
use nom::character::complete::space1;
use nom::multi::separated_list1;
use nom::sequence::{preceded, separated_pair};
use nom::IResult;

/// One parsed `A -> α1 | α2 | …` line: the LHS name and its ordered list
/// of alternatives, each itself an ordered list of symbol names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedProduction<'a> {
    pub lhs: &'a str,
    pub alternatives: Vec<Vec<&'a str>>,
}

fn symbol(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

fn alternative(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(space1, symbol)(input)
}

fn arrow(input: &str) -> IResult<&str, &str> {
    alt((tag("->"), tag("→")))(input)
}

fn production_line(input: &str) -> IResult<&str, ParsedProduction<'_>> {
    let (rest, (lhs, alternatives)) = separated_pair(
        symbol,
        preceded(space1, arrow),
        preceded(space1, separated_list1(preceded(space1, tag("|")), preceded(space1, alternative))),
    )(input)?;
    Ok((
        rest,
        ParsedProduction {
            lhs,
            alternatives,
        },
    ))
}

/// Parses one `A -> α1 | α2 | …` line in full (no trailing garbage
/// tolerated beyond what `.trim()` already removed at the call site).
pub(crate) fn parse_line(line: &str) -> Option<ParsedProduction<'_>> {
    match production_line(line) {
        Ok(("", parsed)) => Some(parsed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_alternative() {
        let p = parse_line("S -> a B c").unwrap();
        assert_eq!(p.lhs, "S");
        assert_eq!(p.alternatives, vec![vec!["a", "B", "c"]]);
    }

    #[test]
    fn parses_multiple_alternatives() {
        let p = parse_line("C -> c C | d").unwrap();
        assert_eq!(p.lhs, "C");
        assert_eq!(p.alternatives, vec![vec!["c", "C"], vec!["d"]]);
    }

    #[test]
    fn parses_epsilon_alternative() {
        let p = parse_line("M -> @").unwrap();
        assert_eq!(p.alternatives, vec![vec!["@"]]);
    }

    #[test]
    fn rejects_missing_arrow() {
        assert!(parse_line("S a B c").is_none());
    }
}
