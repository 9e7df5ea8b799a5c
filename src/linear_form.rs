use std::collections::BTreeMap;
use crate::expression::{Atom, Expression};
use crate::PepError;

//

/// Linear form
///
/// An [`Expression`] compiled over the two variables of the semidefinite program:
/// the function value vector `F` and the symmetric Gram matrix `G`.
/// Its value is `sum(vector[i] * F[i]) + sum(gram[(r, c)] * G[r, c]) + constant`,
/// where each `gram` key has `r <= c` and stands for one entry of the upper triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearForm
{
    pub vector: BTreeMap<usize, f64>,
    pub gram: BTreeMap<(usize, usize), f64>,
    pub constant: f64,
}

impl LinearForm
{
    /// Compiles an expression.
    ///
    /// Returns `Err` with [`PepError::ForeignBasis`] if any leaf index is not below
    /// `vector_len` (function values) or `gram_order` (points).
    pub fn from_expression(expr: &Expression, vector_len: usize, gram_order: usize) -> Result<Self, PepError>
    {
        let mut form = LinearForm::default();

        for (atom, coef) in expr.decomposition().iter() {
            match atom {
                Atom::Constant => {
                    form.constant += coef;
                },
                Atom::Value(e) => {
                    if e.index() >= vector_len {
                        return Err(PepError::ForeignBasis);
                    }
                    *form.vector.entry(e.index()).or_insert(0.) += coef;
                },
                Atom::Inner(i, j) => {
                    let (r, c) = (i.index(), j.index());
                    if r >= gram_order || c >= gram_order {
                        return Err(PepError::ForeignBasis);
                    }
                    *form.gram.entry((r.min(c), r.max(c))).or_insert(0.) += coef;
                },
            }
        }

        Ok(form)
    }

    /// Coefficient matrix `W` of the Gram part in row-major order,
    /// such that `sum(W[r, c] * G[r, c])` over all entries equals the Gram part.
    ///
    /// Off-diagonal coefficients are split evenly between `(r, c)` and `(c, r)`.
    pub fn gram_dense(&self, order: usize) -> Vec<f64>
    {
        let mut w = vec![0.; order * order];

        for (&(r, c), &v) in self.gram.iter() {
            if r == c {
                w[r * order + c] += v;
            }
            else {
                w[r * order + c] += 0.5 * v;
                w[c * order + r] += 0.5 * v;
            }
        }

        w
    }

    /// Value at `vector` and a row-major Gram matrix `gram` of order `order`.
    pub fn eval(&self, vector: &[f64], gram: &[f64], order: usize) -> f64
    {
        let v: f64 = self.vector.iter().map(|(&i, c)| c * vector[i]).sum();
        let g: f64 = self.gram.iter().map(|(&(r, c), w)| w * gram[r * order + c]).sum();

        v + g + self.constant
    }

    /// Number of nonzero coefficients, the constant excluded.
    pub fn nnz(&self) -> usize
    {
        self.vector.len() + self.gram.len()
    }
}

//

#[test]
fn test_zero_form()
{
    let f = LinearForm::from_expression(&Expression::zero(), 0, 0).unwrap();

    assert_eq!(f, LinearForm::default());
    assert_eq!(f.nnz(), 0);
    assert_eq!(f.eval(&[], &[], 0), 0.);
}

#[test]
fn test_form_compile_eval()
{
    use float_eq::assert_float_eq;
    use crate::basis::Basis;
    use crate::Point;

    let b = Basis::new();
    let x = Point::leaf(&b);
    let g = Point::leaf(&b);
    let f = Expression::leaf(&b);

    // 2 f - <x, g> + 3 ||x||^2 + 1
    let e = 2. * &f - &x * &g + 3. * x.sqnorm() + 1.;
    let form = LinearForm::from_expression(&e, b.expr_count(), b.point_count()).unwrap();

    assert_eq!(form.vector[&0], 2.);
    assert_eq!(form.gram[&(0, 1)], -1.);
    assert_eq!(form.gram[&(0, 0)], 3.);
    assert_eq!(form.constant, 1.);

    // x = (1, 0), g = (2, 1), f = 0.5
    let gram = [
        1., 2.,
        2., 5.,
    ];
    let v = form.eval(&[0.5], &gram, 2);
    assert_float_eq!(v, 1. - 2. + 3. + 1., abs <= 1e-12);

    let w = form.gram_dense(2);
    let wg: f64 = w.iter().zip(gram.iter()).map(|(a, b)| a * b).sum();
    assert_float_eq!(wg + 1. + 2. * 0.5, v, abs <= 1e-12);
}

#[test]
fn test_form_foreign()
{
    use crate::basis::Basis;
    use crate::Point;

    let b = Basis::new();
    let other = Basis::new();
    let _ = Point::leaf(&other);
    let y = Point::leaf(&other);

    assert_eq!(
        LinearForm::from_expression(&y.sqnorm(), b.expr_count(), b.point_count()).unwrap_err(),
        PepError::ForeignBasis
    );
}
