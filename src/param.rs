use core::str::FromStr;
use crate::PepError;

//

/// Heuristic of the dimension reduction, which looks for a low-rank worst-case instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionReduction
{
    /// Minimizes the trace of the Gram matrix.
    Trace,
}

impl FromStr for DimensionReduction
{
    type Err = PepError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s {
            "trace" => Ok(DimensionReduction::Trace),
            _ => Err(PepError::UnsupportedHeuristic(s.to_string())),
        }
    }
}

//

/// Parameters of [`crate::Pep::solve`].
#[derive(Debug, Clone, PartialEq)]
pub struct PepParam
{
    /// Dimension reduction after the main solve. `None` means no reduction.
    pub dimension_reduction: Option<DimensionReduction>,
    /// Eigenvalues of the Gram matrix above this count toward the dimension of the worst-case instance.
    pub eig_threshold: f64,
    /// Slack of the worst-case value allowed during the dimension reduction.
    pub tol_dimension_reduction: f64,
    /// Fails if the smallest eigenvalue of the Gram matrix is below the negative of this.
    /// `None` means only a warning, the negative eigenvalues being clamped to zero.
    pub eig_fail_threshold: Option<f64>,
    /// Keeps the compiled program and the raw solution in [`crate::PepSolution`].
    pub keep_program: bool,
}

impl Default for PepParam
{
    fn default() -> Self
    {
        PepParam {
            dimension_reduction: None,
            eig_threshold: 1e-5,
            tol_dimension_reduction: 1e-5,
            eig_fail_threshold: None,
            keep_program: false,
        }
    }
}

impl PepParam
{
    /// Changes parameters.
    ///
    /// Returns [`PepParam`] with its parameters changed.
    /// * `f` is a function to change parameters given by its argument.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut PepParam)
    {
        f(&mut self);
        self
    }
}

//

#[test]
fn test_heuristic_parse()
{
    assert_eq!("trace".parse::<DimensionReduction>().unwrap(), DimensionReduction::Trace);
    assert_eq!(
        "logdet".parse::<DimensionReduction>().unwrap_err(),
        PepError::UnsupportedHeuristic("logdet".to_string())
    );

    let p = PepParam::default().par(|p| {
        p.dimension_reduction = Some(DimensionReduction::Trace);
        p.eig_threshold = 1e-4;
    });
    assert_eq!(p.dimension_reduction, Some(DimensionReduction::Trace));
    assert_eq!(p.eig_threshold, 1e-4);
    assert_eq!(p.tol_dimension_reduction, 1e-5);
}
