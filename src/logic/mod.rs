//! Formulas, valuations and the translations needed to feed solvers.

mod cnf;
pub use cnf::CnfBlock;
pub use cnf::QuantifiedCnf;

mod formula;
pub use formula::ranking_bit;
pub use formula::Comparison;
pub use formula::Formula;
pub use formula::Proposition;
pub use formula::QuantifierKind;

mod prenex;
pub use prenex::application_name;
pub use prenex::PrenexFormula;
pub use prenex::QuantifierBlock;

mod valuation;
pub use valuation::bit_string;
pub use valuation::minterm_of_index;
pub use valuation::valuation_of_index;
pub use valuation::Valuation;
