use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lazy_static::lazy_static;
use langkit::dfa::Dfa;
use langkit::grammar::Grammar;
use langkit::lr::{build_table, canonical, collapse_to_lalr};
use langkit::nfa::thompson;
use langkit::regex::prep;

lazy_static! {
    static ref IDENTIFIER_REGEX: String =
        "(a|b|c|d|e|f|g|h|i|j|k|l|m|n|o|p|q|r|s|t|u|v|w|x|y|z)\
         ((a|b|c|d|e|f|g|h|i|j|k|l|m|n|o|p|q|r|s|t|u|v|w|x|y|z)\
         |(0|1|2|3|4|5|6|7|8|9))*"
            .to_string();
    static ref REGEX_DEFS: String = "letter = [a-zA-Z]\n\
         digit = [0-9]\n\
         _keyword = if|else|while|return|int|float\n\
         _identifier = letter(letter|digit)*\n\
         _number = digit+(\\.digit+)?"
        .to_string();
    static ref DANGLING_ELSE_GRAMMAR: String =
        "S -> if E then S else S | if E then S | a\nE -> b".to_string();
    static ref LIST_GRAMMAR: String = "S -> C C\nC -> c C | d".to_string();
}

/// Benchmarks the C1-C3 pipeline: postfix conversion, Thompson
/// construction, subset construction, and Hopcroft minimization for a
/// moderately-sized identifier regex.
pub fn regex_compile(c: &mut Criterion) {
    c.bench_function("postfix conversion", |b| {
        b.iter(|| prep::to_postfix(black_box(&IDENTIFIER_REGEX)).unwrap())
    });

    let postfix = prep::to_postfix(&IDENTIFIER_REGEX).unwrap();
    c.bench_function("thompson construction", |b| {
        b.iter(|| thompson::build(black_box(&postfix)).unwrap())
    });

    let nfa = thompson::build(&postfix).unwrap();
    c.bench_function("subset construction", |b| {
        b.iter(|| Dfa::from_nfa(black_box(&nfa)))
    });

    c.bench_function("subset construction + minimization", |b| {
        b.iter(|| {
            let mut dfa = Dfa::from_nfa(black_box(&nfa));
            dfa.minimize();
            dfa
        })
    });
}

/// Benchmarks the full C1 pipeline (class expansion, merging, concatenation
/// insertion, shunting-yard) over a multi-definition regex file.
pub fn regex_preprocess(c: &mut Criterion) {
    c.bench_function("regex preprocessor compile", |b| {
        b.iter(|| prep::compile(black_box(&REGEX_DEFS)).unwrap())
    });
}

/// Benchmarks DFA evaluation (maximal-munch scanning) once the scanner is
/// built, holding construction cost out of the measured loop.
pub fn dfa_eval(c: &mut Criterion) {
    let postfix = prep::to_postfix(&IDENTIFIER_REGEX).unwrap();
    let nfa = thompson::build(&postfix).unwrap();
    let mut dfa = Dfa::from_nfa(&nfa);
    dfa.minimize();

    let word: Vec<String> = "someFairlyLongIdentifier123".chars().map(String::from).collect();
    let word_refs: Vec<&str> = word.iter().map(String::as_str).collect();

    c.bench_function("dfa accepts (27-char identifier)", |b| {
        b.iter(|| dfa.accepts(black_box(&word_refs)))
    });
}

/// Benchmarks the canonical LR(1) automaton construction and LALR(1)
/// collapse for a dangling-else grammar and a small left-recursive list
/// grammar, two classic sources of shift/reduce and same-core-merge work.
pub fn lr_automaton(c: &mut Criterion) {
    let dangling_else = Grammar::parse(&DANGLING_ELSE_GRAMMAR).unwrap();
    c.bench_function("canonical LR(1) automaton (dangling-else)", |b| {
        b.iter(|| canonical(black_box(&dangling_else)))
    });

    let list_grammar = Grammar::parse(&LIST_GRAMMAR).unwrap();
    let canon = canonical(&list_grammar);
    c.bench_function("LALR(1) same-core collapse (C-list)", |b| {
        b.iter(|| collapse_to_lalr(black_box(&canon)))
    });

    let (lalr, _) = collapse_to_lalr(&canon);
    c.bench_function("ACTION/GOTO table construction (C-list)", |b| {
        b.iter(|| build_table(black_box(&list_grammar), black_box(&lalr)).unwrap())
    });
}

criterion_group!(benches, regex_compile, regex_preprocess, dfa_eval, lr_automaton);
criterion_main!(benches);
