//! Encodings of bounded synthesis problems into quantified Boolean formulas.

mod explicit;
pub use explicit::ExplicitEncoder;

mod input_symbolic;
pub use input_symbolic::InputSymbolicEncoder;

pub(crate) mod naming;

pub(crate) mod ranking;

mod specs;
pub use specs::new_encoder;
pub use specs::EncodingKind;
pub use specs::SynthesisEncoder;

mod symbolic;
pub use symbolic::SymbolicEncoder;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        automaton::AutomatonBuilder,
        logic::Formula,
        specification::{Semantics, Specification},
    };
    use strum::IntoEnumIterator;

    fn request_grant(semantics: Semantics) -> Specification {
        let mut builder = AutomatonBuilder::new(vec!["r".into()], vec!["g".into()]);
        builder.new_state("q0").unwrap();
        builder.new_state("q1").unwrap();
        builder.set_initial("q0").unwrap();
        builder.set_rejecting("q1").unwrap();
        builder.new_transition("q0", "q0", Formula::TRUE).unwrap();
        builder.new_transition("q0", "q1", Formula::atom("r")).unwrap();
        builder
            .new_transition("q1", "q1", Formula::not(Formula::atom("g")))
            .unwrap();
        builder
            .add_safety_condition(
                "q0",
                Formula::not(Formula::and([Formula::atom("r"), Formula::atom("g")])),
            )
            .unwrap();
        Specification::new(builder.build(), semantics)
    }

    macro_rules! test_boundedness_for_encoding {
        ($kind:expr, $suffix:literal) => {
            paste::item! {
    #[test]
    fn [< test_boundedness_ $suffix >] () {
        for semantics in Semantics::iter() {
            let specification = request_grant(semantics);
            let encoder = new_encoder($kind, &specification);
            assert_eq!($kind, encoder.kind());
            for bound in 1..=5 {
                assert!(encoder.encode(bound).unwrap().is_bounded());
            }
        }
    }
            }
        };
    }

    test_boundedness_for_encoding!(EncodingKind::Explicit, "explicit");
    test_boundedness_for_encoding!(EncodingKind::Symbolic, "symbolic");
    test_boundedness_for_encoding!(EncodingKind::InputSymbolic, "input_symbolic");
}
