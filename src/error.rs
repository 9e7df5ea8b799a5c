use totsu_core::solver::SolverError;

/// Errors of formulating and solving a performance estimation problem.
#[derive(Debug, Clone, PartialEq)]
pub enum PepError
{
    /// Product of two expressions which both contain non-constant atoms.
    NonLinearProduct,
    /// Power of an expression which contains non-constant atoms.
    NonConstantPower,
    /// Dimension reduction heuristic other than `trace`.
    UnsupportedHeuristic(String),
    /// Constraint kind other than `equality` or `inequality`.
    MalformedConstraintKind(String),
    /// Matrix of expressions which is not square.
    NotSquare,
    /// Matrix of expressions which is not symmetric at the given entry.
    NotSymmetric { row: usize, col: usize },
    /// Object created within another problem.
    ForeignBasis,
    /// Solving without any performance metric.
    NoPerformanceMetric,
    /// Side condition on a combination whose weights all cancel, which has no function to hold it.
    EmptyCombination,

    /// Function class parameter not given.
    MissingParameter { class: String, name: String },
    /// Function class parameter out of its valid range.
    InvalidParameter { class: String, name: String, value: f64 },
    /// Function class name not registered.
    UnknownFunctionClass(String),

    /// Failure of the SDP solver which yields no solution.
    Solver(SolverError),
    /// The Gram matrix has an eigenvalue below the hard threshold.
    NegativeEigenvalue(f64),
    /// Solution from a [`crate::SdpSolver`] whose size does not fit the program.
    MalformedSolution { what: &'static str, expected: usize, len: usize },
}

impl core::fmt::Display for PepError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self {
            PepError::NonLinearProduct =>
                write!(f, "NonLinearProduct: expressions are linear in function values and inner products, multiply by a constant only"),
            PepError::NonConstantPower =>
                write!(f, "NonConstantPower: only a constant expression can be raised to a power"),
            PepError::UnsupportedHeuristic(name) =>
                write!(f, "UnsupportedHeuristic: dimension reduction heuristic must be 'trace', got '{}'", name),
            PepError::MalformedConstraintKind(name) =>
                write!(f, "MalformedConstraintKind: must be 'equality' or 'inequality', got '{}'", name),
            PepError::NotSquare =>
                write!(f, "NotSquare: matrix of expressions must be square"),
            PepError::NotSymmetric { row, col } =>
                write!(f, "NotSymmetric: entries ({}, {}) and ({}, {}) differ", row, col, col, row),
            PepError::ForeignBasis =>
                write!(f, "ForeignBasis: object does not belong to this problem"),
            PepError::NoPerformanceMetric =>
                write!(f, "NoPerformanceMetric: set at least one performance metric before solving"),
            PepError::EmptyCombination =>
                write!(f, "EmptyCombination: combination of functions has no leaf to hold the constraint"),
            PepError::MissingParameter { class, name } =>
                write!(f, "MissingParameter: function class '{}' requires parameter '{}'", class, name),
            PepError::InvalidParameter { class, name, value } =>
                write!(f, "InvalidParameter: function class '{}' got {} = {}", class, name, value),
            PepError::UnknownFunctionClass(name) =>
                write!(f, "UnknownFunctionClass: '{}' is not registered", name),
            PepError::Solver(e) =>
                write!(f, "Solver: {}", e),
            PepError::NegativeEigenvalue(e) =>
                write!(f, "NegativeEigenvalue: smallest eigenvalue of the Gram matrix is {:.3e}", e),
            PepError::MalformedSolution { what, expected, len } =>
                write!(f, "MalformedSolution: {} has length {}, expected {}", what, len, expected),
        }
    }
}

impl std::error::Error for PepError {}

impl From<SolverError> for PepError
{
    fn from(e: SolverError) -> Self
    {
        PepError::Solver(e)
    }
}

//

#[test]
fn test_error_display()
{
    let e = PepError::UnsupportedHeuristic("logdet".to_string());
    assert!(e.to_string().starts_with("UnsupportedHeuristic"));
    assert!(e.to_string().contains("logdet"));

    let e: PepError = SolverError::WorkShortage.into();
    assert_eq!(e, PepError::Solver(SolverError::WorkShortage));
}
