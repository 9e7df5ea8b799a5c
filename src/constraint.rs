use core::str::FromStr;
use crate::expression::Expression;
use crate::PepError;

//

/// Sense of a [`Constraint`], comparing its expression to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind
{
    /// `expression == 0`
    Equality,
    /// `expression <= 0`
    Inequality,
}

impl FromStr for ConstraintKind
{
    type Err = PepError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s {
            "equality" => Ok(ConstraintKind::Equality),
            "inequality" => Ok(ConstraintKind::Inequality),
            _ => Err(PepError::MalformedConstraintKind(s.to_string())),
        }
    }
}

//

/// Constraint
///
/// An [`Expression`] compared to zero.
/// Holds its dual value once the problem containing it has been solved.
#[derive(Debug, Clone)]
pub struct Constraint
{
    expression: Expression,
    kind: ConstraintKind,
    dual: Option<f64>,
}

impl Constraint
{
    pub fn new(expression: Expression, kind: ConstraintKind) -> Self
    {
        Constraint {
            expression,
            kind,
            dual: None,
        }
    }

    pub fn expression(&self) -> &Expression
    {
        &self.expression
    }

    pub fn kind(&self) -> ConstraintKind
    {
        self.kind
    }

    /// Dual value of the last solve, `None` before any.
    pub fn dual(&self) -> Option<f64>
    {
        self.dual
    }

    pub(crate) fn set_dual(&mut self, dual: Option<f64>)
    {
        self.dual = dual;
    }
}

//

/// PSD matrix
///
/// A symmetric matrix of [`Expression`]s asserted to be positive semidefinite (a linear matrix inequality).
#[derive(Debug, Clone)]
pub struct PsdMatrix
{
    entries: Vec<Vec<Expression>>,
    dual: Option<Vec<f64>>,
}

impl PsdMatrix
{
    const EPS_SYMMETRY: f64 = 1e-12;

    /// Creates a PSD matrix from its rows.
    ///
    /// Returns `Err` with [`PepError::NotSquare`] or [`PepError::NotSymmetric`].
    pub fn new(entries: Vec<Vec<Expression>>) -> Result<Self, PepError>
    {
        let k = entries.len();
        if entries.iter().any(|row| row.len() != k) {
            return Err(PepError::NotSquare);
        }

        for r in 0.. k {
            for c in 0.. r {
                let diff = &entries[r][c] - &entries[c][r];
                if diff.decomposition().values().any(|v| v.abs() > Self::EPS_SYMMETRY) {
                    return Err(PepError::NotSymmetric { row: r, col: c });
                }
            }
        }

        Ok(PsdMatrix {
            entries,
            dual: None,
        })
    }

    /// Number of rows and columns.
    pub fn order(&self) -> usize
    {
        self.entries.len()
    }

    pub fn entry(&self, r: usize, c: usize) -> &Expression
    {
        &self.entries[r][c]
    }

    /// Dual matrix of the last solve in row-major order, `None` before any.
    pub fn dual(&self) -> Option<&[f64]>
    {
        self.dual.as_deref()
    }

    pub(crate) fn set_dual(&mut self, dual: Option<Vec<f64>>)
    {
        self.dual = dual;
    }
}

//

#[test]
fn test_constraint_kind_parse()
{
    assert_eq!("equality".parse::<ConstraintKind>().unwrap(), ConstraintKind::Equality);
    assert_eq!("inequality".parse::<ConstraintKind>().unwrap(), ConstraintKind::Inequality);
    assert_eq!(
        "lessthan".parse::<ConstraintKind>().unwrap_err(),
        PepError::MalformedConstraintKind("lessthan".to_string())
    );
}

#[test]
fn test_psd_matrix_checks()
{
    use crate::basis::Basis;

    let b = Basis::new();
    let f = Expression::leaf(&b);
    let g = Expression::leaf(&b);
    let one = Expression::constant(1.);

    let m = PsdMatrix::new(vec![
        vec![one.clone(), &f - &g],
        vec![-&g + &f, one.clone()],
    ]).unwrap();
    assert_eq!(m.order(), 2);
    assert!(m.dual().is_none());

    let e = PsdMatrix::new(vec![
        vec![one.clone(), f.clone()],
        vec![g.clone(), one.clone()],
    ]).unwrap_err();
    assert_eq!(e, PepError::NotSymmetric { row: 1, col: 0 });

    let e = PsdMatrix::new(vec![
        vec![one.clone(), f.clone()],
    ]).unwrap_err();
    assert_eq!(e, PepError::NotSquare);
}
