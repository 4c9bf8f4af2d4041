//! Names of the propositions introduced by the encodings.
//!
//! Brackets cannot occur in the names read from input files, so these names never collide with the inputs and outputs.

use crate::{automaton::StateId, logic::Proposition, scenarios::NodeId};

pub(crate) fn lambda(s: usize, q: StateId) -> Proposition {
    Proposition::new(format!("λ[{},{}]", s, q))
}

pub(crate) fn lambda_ranking(s: usize, q: StateId) -> Proposition {
    Proposition::new(format!("λ#[{},{}]", s, q))
}

pub(crate) fn coverage(s: usize, node: NodeId) -> Proposition {
    Proposition::new(format!("c[{},{}]", s, node))
}

pub(crate) fn transition(s: usize, t: usize) -> Proposition {
    Proposition::new(format!("τ[{},{}]", s, t))
}

pub(crate) fn transition_under(s: usize, input_bits: &str, t: usize) -> Proposition {
    Proposition::new(format!("τ[{},{},{}]", s, input_bits, t))
}

pub(crate) fn moore_output(output: &Proposition, s: usize) -> Proposition {
    Proposition::new(format!("{}[{}]", output, s))
}

pub(crate) fn mealy_output(output: &Proposition, s: usize, input_bits: &str) -> Proposition {
    Proposition::new(format!("{}[{},{}]", output, s, input_bits))
}

pub(crate) fn state_bit(k: usize) -> Proposition {
    Proposition::new(format!("s[{}]", k))
}

pub(crate) fn next_state_bit(k: usize) -> Proposition {
    Proposition::new(format!("sp[{}]", k))
}

pub(crate) fn automaton_state(q: StateId) -> Proposition {
    Proposition::new(format!("q[{}]", q))
}

pub(crate) fn next_automaton_state(q: StateId) -> Proposition {
    Proposition::new(format!("qp[{}]", q))
}

pub(crate) fn transition_bit_family(k: usize) -> Proposition {
    Proposition::new(format!("τ[{}]", k))
}

pub(crate) fn lambda_family() -> Proposition {
    Proposition::new("λ")
}

pub(crate) fn lambda_ranking_family() -> Proposition {
    Proposition::new("λ#")
}
