//! Semidefinite program interface
//!
//! <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
//! <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
//!
//! A compiled performance estimation problem is
//! \\[
//! \begin{array}{ll}
//! {\rm maximize\ or\ minimize} & \ell_0(F, G) \\\\
//! {\rm subject \ to} & \ell_i(F, G) \le 0 \ {\rm or} \ = 0, \quad i = 1, \ldots, m \\\\
//! & M_j(F, G) \succeq 0, \quad j = 1, \ldots, p \\\\
//! & G \succeq 0,
//! \end{array}
//! \\]
//! where \\( F \in \mathbb{R}^n \\), \\( G \in \mathcal{S}^k \\),
//! every \\( \ell_i \\) is a [`LinearForm`] and every \\( M_j \\) is a symmetric matrix of them.

use crate::constraint::ConstraintKind;
use crate::linear_form::LinearForm;
use crate::PepError;

//

/// Direction of the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense
{
    Maximize,
    Minimize,
}

/// Linear matrix inequality block: a symmetric matrix of linear forms constrained PSD.
#[derive(Debug, Clone)]
pub struct LmiBlock
{
    pub order: usize,
    /// Entries in row-major order.
    pub entries: Vec<LinearForm>,
}

impl LmiBlock
{
    pub fn entry(&self, r: usize, c: usize) -> &LinearForm
    {
        &self.entries[r * self.order + c]
    }
}

/// Semidefinite program over a vector `F` and a PSD matrix `G`.
#[derive(Debug, Clone)]
pub struct SdpProgram
{
    pub vector_len: usize,
    pub gram_order: usize,
    pub sense: Sense,
    pub objective: LinearForm,
    pub constraints: Vec<(LinearForm, ConstraintKind)>,
    pub lmis: Vec<LmiBlock>,
}

/// Outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus
{
    Optimal,
    Infeasible,
    Unbounded,
    /// Stopped before reaching the tolerances; the solution is the last iterate.
    Inaccurate,
}

/// Solution of a [`SdpProgram`].
///
/// `vector`, `gram` and the duals are empty when `status` is
/// [`SolveStatus::Infeasible`] or [`SolveStatus::Unbounded`],
/// and also for [`SolveStatus::Inaccurate`] when the solver stopped without any usable iterate.
#[derive(Debug, Clone)]
pub struct SdpSolution
{
    pub status: SolveStatus,
    pub objective: f64,
    pub vector: Vec<f64>,
    /// Gram matrix in row-major order.
    pub gram: Vec<f64>,
    /// Nonnegative for inequalities, in the order of [`SdpProgram::constraints`].
    pub duals: Vec<f64>,
    /// Dual matrices in row-major order, in the order of [`SdpProgram::lmis`].
    pub lmi_duals: Vec<Vec<f64>>,
}

impl SdpSolution
{
    /// Solution without any value, for a status which certifies there is none.
    pub fn empty(status: SolveStatus) -> Self
    {
        let objective = match status {
            SolveStatus::Infeasible => f64::NEG_INFINITY,
            SolveStatus::Unbounded => f64::INFINITY,
            _ => f64::NAN,
        };

        SdpSolution {
            status,
            objective,
            vector: Vec::new(),
            gram: Vec::new(),
            duals: Vec::new(),
            lmi_duals: Vec::new(),
        }
    }

    pub fn has_values(&self) -> bool
    {
        matches!(self.status, SolveStatus::Optimal | SolveStatus::Inaccurate) && self.objective.is_finite()
    }

    /// Checks that the sizes of this solution fit `prog`.
    ///
    /// Returns `Err` with [`PepError::MalformedSolution`] naming the first mismatch.
    pub fn check_size(&self, prog: &SdpProgram) -> Result<(), PepError>
    {
        let k = prog.gram_order;
        let check = |what: &'static str, expected: usize, len: usize| {
            if expected == len {
                Ok(())
            }
            else {
                Err(PepError::MalformedSolution {what, expected, len})
            }
        };

        check("vector", prog.vector_len, self.vector.len())?;
        check("gram", k * k, self.gram.len())?;
        check("duals", prog.constraints.len(), self.duals.len())?;
        check("lmi_duals", prog.lmis.len(), self.lmi_duals.len())?;
        for (lmi, d) in prog.lmis.iter().zip(self.lmi_duals.iter()) {
            check("lmi dual", lmi.order * lmi.order, d.len())?;
        }

        Ok(())
    }
}

//

/// SDP solver trait
///
/// The narrow interface between the problem orchestrator and a numerical solver.
pub trait SdpSolver
{
    /// Solves a program.
    ///
    /// Returns `Ok` with a solution, whose status tells optimality, infeasibility, unboundedness or inaccuracy,
    /// or `Err` if the solver could not run at all.
    fn solve(&self, prog: &SdpProgram) -> Result<SdpSolution, PepError>;
}
