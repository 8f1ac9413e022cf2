//! Regex preprocessing (C1): see [`prep`] for the bracket-class expansion,
//! merging, and shunting-yard pipeline that turns named regex definitions
//! into postfix strings ready for [`crate::nfa::thompson::build`].

pub mod prep;
