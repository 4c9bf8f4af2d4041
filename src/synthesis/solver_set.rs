use crate::{
    qbf::{QbfPreprocessor, QbfSolver},
    sat::{DefaultSatSolverFactory, SatSolverFactory},
};

/// The solvers available to a bound search, one per role.
///
/// SAT solvers are built on demand by a factory since each bound gets a fresh instance.
/// The other roles are optional; a search fails if the selected encoding needs a missing one.
pub struct SolverSet {
    sat_solver_factory: Box<dyn SatSolverFactory>,
    qbf_solver: Option<Box<dyn QbfSolver>>,
    dqbf_solver: Option<Box<dyn QbfSolver>>,
    qbf_certifier: Option<Box<dyn QbfSolver>>,
    qbf_preprocessor: Option<Box<dyn QbfPreprocessor>>,
}

impl Default for SolverSet {
    fn default() -> Self {
        Self::new(Box::new(DefaultSatSolverFactory))
    }
}

impl SolverSet {
    /// Builds a solver set with the given SAT solver factory and no QBF solvers.
    pub fn new(sat_solver_factory: Box<dyn SatSolverFactory>) -> Self {
        Self {
            sat_solver_factory,
            qbf_solver: None,
            dqbf_solver: None,
            qbf_certifier: None,
            qbf_preprocessor: None,
        }
    }

    /// Sets the solver used for QBF instances.
    pub fn with_qbf_solver(mut self, solver: Box<dyn QbfSolver>) -> Self {
        self.qbf_solver = Some(solver);
        self
    }

    /// Sets the solver used for dependency-QBF instances.
    pub fn with_dqbf_solver(mut self, solver: Box<dyn QbfSolver>) -> Self {
        self.dqbf_solver = Some(solver);
        self
    }

    /// Sets the solver used to compute the certificates of QBF instances.
    pub fn with_qbf_certifier(mut self, solver: Box<dyn QbfSolver>) -> Self {
        self.qbf_certifier = Some(solver);
        self
    }

    /// Sets the preprocessor applied before the first call to the QBF solver.
    pub fn with_qbf_preprocessor(mut self, preprocessor: Box<dyn QbfPreprocessor>) -> Self {
        self.qbf_preprocessor = Some(preprocessor);
        self
    }

    pub(crate) fn sat_solver_factory(&self) -> &dyn SatSolverFactory {
        self.sat_solver_factory.as_ref()
    }

    pub(crate) fn qbf_solver(&self) -> Option<&dyn QbfSolver> {
        self.qbf_solver.as_deref()
    }

    pub(crate) fn dqbf_solver(&self) -> Option<&dyn QbfSolver> {
        self.dqbf_solver.as_deref()
    }

    pub(crate) fn qbf_certifier(&self) -> Option<&dyn QbfSolver> {
        self.qbf_certifier.as_deref()
    }

    pub(crate) fn qbf_preprocessor(&self) -> Option<&dyn QbfPreprocessor> {
        self.qbf_preprocessor.as_deref()
    }
}
