use crate::{
    automaton::{Automaton, StateId},
    logic::{Comparison, Formula},
};

/// Returns the number of bits used by the ranking values, enough to count `bound` times the number of automaton states.
pub(crate) fn ranking_bits(automaton: &Automaton, bound: usize) -> usize {
    let n_product_states = bound * automaton.n_states();
    usize::max(1, (usize::BITS - n_product_states.leading_zeros()) as usize)
}

/// Returns the comparison the rankings must satisfy along an automaton transition, if any.
///
/// A comparison is required only when both states lie in the same SCC and this SCC contains rejecting states.
/// The target ranking must be strictly lower when entering a rejecting state, and lower or equal otherwise.
pub(crate) fn ranking_comparison(
    automaton: &Automaton,
    q: StateId,
    q_prime: StateId,
) -> Option<Comparison> {
    if automaton.is_in_non_rejecting_scc(q)
        || automaton.is_in_non_rejecting_scc(q_prime)
        || !automaton.is_in_same_scc(q, q_prime)
    {
        return None;
    }
    if automaton.is_rejecting(q_prime) {
        Some(Comparison::Less)
    } else {
        Some(Comparison::LessOrEqual)
    }
}

/// Builds the requirement on a successor pair: its acceptance witness holds and, when needed, its ranking decreases.
///
/// The rankings are given as indexed terms.
pub(crate) fn successor_requirement(
    automaton: &Automaton,
    q: StateId,
    q_prime: StateId,
    target_witness: Formula,
    source_ranking: &Formula,
    target_ranking: Formula,
) -> Formula {
    match ranking_comparison(automaton, q, q_prime) {
        Some(op) => Formula::and([
            target_witness,
            Formula::compare(op, target_ranking, source_ranking.clone()),
        ]),
        None => target_witness,
    }
}
