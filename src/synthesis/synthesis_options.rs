use crate::encodings::EncodingKind;
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// What a bound search does when a solver answers "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum UnknownPolicy {
    /// Stop the search and report the bound which could not be decided.
    Abort,
    /// Try the next bound.
    Advance,
}

/// The parameters of a bound search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// The encoding used at each bound.
    pub encoding: EncodingKind,
    /// The first bound to try (at least 1).
    pub min_bound: usize,
    /// The last bound to try, if any.
    pub max_bound: Option<usize>,
    /// Whether a solution must be extracted, or only the realizability is checked.
    pub synthesize: bool,
    /// The behavior on "unknown" answers.
    pub unknown_policy: UnknownPolicy,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            encoding: EncodingKind::Explicit,
            min_bound: 1,
            max_bound: None,
            synthesize: true,
            unknown_policy: UnknownPolicy::Abort,
        }
    }
}
