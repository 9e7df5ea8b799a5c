use core::cell::Cell;
use totsu_core::{LinAlgEx, FloatGeneric};
use crate::basis::{ExprId, PointId};

type La = FloatGeneric<f64>;

//

/// Valuation
///
/// Concrete values of all leaf points and leaf expressions of a solved problem:
/// an explicit worst-case instance.
/// Values of composite objects are computed on demand by [`crate::Point::eval`] and [`crate::Expression::eval`].
#[derive(Debug, Clone, Default)]
pub struct Valuation
{
    dim: usize,
    points: Vec<Vec<f64>>,
    values: Vec<f64>,
}

impl Valuation
{
    pub(crate) fn new(dim: usize, points: Vec<Vec<f64>>, values: Vec<f64>) -> Self
    {
        Valuation {
            dim,
            points,
            values,
        }
    }

    /// Dimension of the vectors representing points.
    pub fn dimension(&self) -> usize
    {
        self.dim
    }

    /// Coordinates of a leaf point.
    pub fn point(&self, id: PointId) -> Option<&[f64]>
    {
        self.points.get(id.index()).map(|v| v.as_slice())
    }

    /// Value of a leaf expression.
    pub fn value(&self, id: ExprId) -> Option<f64>
    {
        self.values.get(id.index()).copied()
    }
}

//

/// Eigenvalue summary and factorization of a solved Gram matrix.
#[derive(Debug, Clone)]
pub(crate) struct GramFactor
{
    /// Smallest eigenvalue, before clamping.
    pub min_eig: f64,
    /// Number of eigenvalues above the threshold.
    pub rank: usize,
    /// Coordinates of each leaf point, `R^T R` reproducing the clamped Gram matrix.
    pub columns: Vec<Vec<f64>>,
}

fn pack_sym(gram: &[f64], k: usize) -> Vec<f64>
{
    let mut packed = Vec::with_capacity(k * (k + 1) / 2);
    for c in 0.. k {
        for r in 0..= c {
            packed.push(0.5 * (gram[r * k + c] + gram[c * k + r]));
        }
    }
    packed
}

fn unpack_sym(packed: &[f64], k: usize) -> Vec<f64>
{
    let mut dense = vec![0.; k * k];
    let mut i = 0;
    for c in 0.. k {
        for r in 0..= c {
            dense[r * k + c] = packed[i];
            dense[c * k + r] = packed[i];
            i += 1;
        }
    }
    dense
}

/// Upper-triangular factor of a Householder QR decomposition of a row-major square matrix.
fn qr_r(mut a: Vec<f64>, k: usize) -> Vec<f64>
{
    for j in 0.. k {
        let norm = (j.. k).map(|i| a[i * k + j] * a[i * k + j]).sum::<f64>().sqrt();
        if norm == 0. {
            continue;
        }

        let alpha = if a[j * k + j] > 0. {-norm} else {norm};
        let mut v: Vec<f64> = (j.. k).map(|i| a[i * k + j]).collect();
        v[0] -= alpha;
        let vv = v.iter().map(|e| e * e).sum::<f64>();
        if vv == 0. {
            continue;
        }

        for c in j.. k {
            let s = (j.. k).map(|i| v[i - j] * a[i * k + c]).sum::<f64>();
            let f = 2. * s / vv;
            for i in j.. k {
                a[i * k + c] -= f * v[i - j];
            }
        }

        for i in (j + 1).. k {
            a[i * k + j] = 0.;
        }
    }
    a
}

/// Factors a (nearly) positive semidefinite Gram matrix given in row-major order.
///
/// Negative eigenvalues are clamped to zero, and the square-root-scaled eigenvector factorization
/// is reduced by QR so that point `i` is represented by column `i` of the triangular factor.
pub(crate) fn factor(gram: &[f64], k: usize, eig_threshold: f64, eps_zero: f64) -> GramFactor
{
    assert_eq!(gram.len(), k * k);

    if k == 0 {
        return GramFactor {
            min_eig: 0.,
            rank: 0,
            columns: Vec::new(),
        };
    }

    let min_eig = Cell::new(f64::INFINITY);
    let rank = Cell::new(0);

    let mut packed = pack_sym(gram, k);
    let mut work = vec![0.; La::map_eig_worklen(k)];
    La::map_eig(&mut packed[..], None, eps_zero, &mut work[..], |e| {
        min_eig.set(min_eig.get().min(e));
        if e > eig_threshold {
            rank.set(rank.get() + 1);
        }

        if e > 0. {
            Some(e.sqrt())
        }
        else {
            Some(0.)
        }
    });

    let r = qr_r(unpack_sym(&packed, k), k);
    let columns = (0.. k).map(|c| {
        (0.. k).map(|i| r[i * k + c]).collect()
    }).collect();

    GramFactor {
        min_eig: min_eig.get(),
        rank: rank.get(),
        columns,
    }
}

//

#[test]
fn test_gram_factor_reproduces()
{
    use float_eq::assert_float_eq;

    // rank-2 Gram matrix of (1, 0), (1, 1), (0, 2)
    let g = [
        1., 1., 0.,
        1., 2., 2.,
        0., 2., 4.,
    ];
    let f = factor(&g, 3, 1e-5, 1e-12);

    assert_eq!(f.rank, 2);
    assert_float_eq!(f.min_eig, 0., abs <= 1e-8);

    for i in 0.. 3 {
        for j in 0.. 3 {
            let ip: f64 = f.columns[i].iter().zip(&f.columns[j]).map(|(u, v)| u * v).sum();
            assert_float_eq!(ip, g[i * 3 + j], abs <= 1e-6);
        }
    }
}

#[test]
fn test_gram_factor_clamps_negative()
{
    use float_eq::assert_float_eq;

    let g = [
        1., 0.,
        0., -1e-3,
    ];
    let f = factor(&g, 2, 1e-5, 1e-12);

    assert_float_eq!(f.min_eig, -1e-3, abs <= 1e-9);
    assert_eq!(f.rank, 1);
    let n1: f64 = f.columns[1].iter().map(|u| u * u).sum();
    assert_float_eq!(n1, 0., abs <= 1e-12);
}
