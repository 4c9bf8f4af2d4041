//! Boundsyn is a bounded synthesis tool for specifications given as universal co-Büchi automata.
//!
//! Given an automaton over input and output propositions, it searches for the smallest
//! Mealy or Moore transition system whose runs are all accepted by the automaton.
//! For each candidate number of states, the existence of such a system is encoded
//! as a SAT, QBF or dependency-QBF instance, and a solution is extracted from the answer of the solver.
//!
//! The main entry point is [`synthesis::BoundedSynthesis`].

#![warn(missing_docs)]

pub mod automaton;

pub mod encodings;

mod error;
pub use error::SynthesisError;

pub mod io;

pub mod logic;

pub mod qbf;

pub mod sat;

pub mod scenarios;

pub mod specification;

pub mod synthesis;
