//! QBF and dependency-QBF solver interfaces used by the symbolic encodings.

mod aiger_certificate;

mod external_qbf_preprocessor;
pub use external_qbf_preprocessor::ExternalQbfPreprocessor;

mod external_qbf_solver;
pub use external_qbf_solver::ExternalQbfSolver;
pub use external_qbf_solver::QbfSolvingFn;

mod qbf_solver;
pub use qbf_solver::QbfPreprocessor;
pub use qbf_solver::QbfSolver;
pub use qbf_solver::QbfSolvingResult;
