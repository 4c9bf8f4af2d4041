use super::{Assignment, Literal, SatSolver, SolvingListener, SolvingResult};
use anyhow::Result;
use cadical::Solver as CadicalCSolver;

/// A wrapper around the Cadical SAT solver.
#[derive(Default)]
pub struct CadicalSolver {
    solver: CadicalCSolver,
    n_reserved: usize,
    n_clauses: usize,
    listeners: Vec<Box<dyn SolvingListener>>,
}

impl SatSolver for CadicalSolver {
    fn add_clause(&mut self, cl: Vec<Literal>) {
        self.n_clauses += 1;
        self.solver
            .add_clause(cl.into_iter().map(|l| isize::from(l) as i32))
    }

    fn solve(&mut self) -> Result<SolvingResult> {
        self.solve_under_assumptions(&[])
    }

    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> Result<SolvingResult> {
        self.listeners
            .iter()
            .for_each(|l| l.solving_start(self.n_vars(), self.n_clauses));
        let result = match self
            .solver
            .solve_with(assumptions.iter().map(|l| isize::from(*l) as i32))
        {
            Some(true) => {
                let max_variable = self.solver.max_variable();
                let mut values = (1..=max_variable)
                    .map(|i| self.solver.value(i))
                    .collect::<Vec<Option<bool>>>();
                values.resize(self.n_vars(), None);
                SolvingResult::Satisfiable(Assignment::new(values))
            }
            Some(false) => SolvingResult::Unsatisfiable,
            None => SolvingResult::Unknown,
        };
        self.listeners.iter().for_each(|l| l.solving_end(&result));
        Ok(result)
    }

    fn n_vars(&self) -> usize {
        usize::max(self.solver.max_variable() as usize, self.n_reserved)
    }

    fn add_listener(&mut self, listener: Box<dyn SolvingListener>) {
        self.listeners.push(listener);
    }

    fn reserve(&mut self, new_max_id: usize) {
        self.n_reserved = usize::max(self.n_reserved, new_max_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause;

    #[test]
    fn test_sat() {
        let mut s = CadicalSolver::default();
        s.add_clause(clause![-1, 2]);
        let assignment = s.solve().unwrap().unwrap_model().unwrap();
        assert!(assignment.value_of(1) == Some(false) || assignment.value_of(2) == Some(true))
    }

    #[test]
    fn test_unsat() {
        let mut s = CadicalSolver::default();
        s.add_clause(clause![-1, 2]);
        s.add_clause(clause![-1, -2]);
        s.add_clause(clause![1]);
        assert!(s.solve().unwrap().unwrap_model().is_none());
    }

    #[test]
    fn test_iterative() {
        let mut s = CadicalSolver::default();
        s.add_clause(clause![-1, 2]);
        s.solve().unwrap().unwrap_model().unwrap();
        s.add_clause(clause![1, 3]);
        s.add_clause(clause![-2, 3]);
        let assignment = s.solve().unwrap().unwrap_model().unwrap();
        assert!(assignment.value_of(3) == Some(true));
        s.add_clause(clause![-3]);
        assert!(s.solve().unwrap().unwrap_model().is_none());
    }

    #[test]
    fn test_solve_under_assumptions() {
        let mut s = CadicalSolver::default();
        s.add_clause(clause![1]);
        assert!(s
            .solve_under_assumptions(&[Literal::from(-1)])
            .unwrap()
            .unwrap_model()
            .is_none());
    }

    #[test]
    fn test_reserve() {
        let mut s = CadicalSolver::default();
        s.add_clause(clause![1]);
        s.reserve(3);
        assert_eq!(3, s.n_vars());
        let assignment = s.solve().unwrap().unwrap_model().unwrap();
        assert_eq!(3, assignment.len());
        assert_eq!(Some(true), assignment.value_of(1));
    }
}
