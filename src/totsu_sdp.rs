use core::marker::PhantomData;
use core::fmt::{Debug, LowerExp};
use num_traits::{Float, Zero};
use totsu_core::solver::{Solver, SolverError, SolverParam, Cone, SliceLike};
use totsu_core::{LinAlgEx, MatType, MatOp, ConePSD, ConeZero, ConeRPos, FloatGeneric, splitm_mut};
use crate::constraint::ConstraintKind;
use crate::linear_form::LinearForm;
use crate::sdp::{SdpProgram, SdpSolution, SdpSolver, SolveStatus, Sense};
use crate::PepError;

//

/// Index of `(r, c)`, `r <= c`, in the packed form (the upper-triangular part in column-wise).
fn packed_idx(r: usize, c: usize) -> usize
{
    debug_assert!(r <= c);
    c * (c + 1) / 2 + r
}

fn packed_len(k: usize) -> usize
{
    k * (k + 1) / 2
}

fn packed_scale(r: usize, c: usize) -> f64
{
    if r == c {1.} else {core::f64::consts::SQRT_2}
}

fn to_float<F: Float>(v: f64) -> F
{
    F::from(v).unwrap_or_else(F::nan)
}

fn to_f64s<F: Float>(v: &[F]) -> Vec<f64>
{
    v.iter().map(|e| e.to_f64().unwrap_or(f64::NAN)).collect()
}

//

struct PepCone<'a, L: LinAlgEx>
{
    n_zero: usize,
    n_rpos: usize,
    psd_lens: Vec<usize>,
    cone_zero: ConeZero<L>,
    cone_rpos: ConeRPos<L>,
    cones_psd: Vec<ConePSD<'a, L>>,
}

impl<'a, L: LinAlgEx> PepCone<'a, L>
{
    fn n_psd(&self) -> usize
    {
        self.psd_lens.iter().sum()
    }
}

impl<'a, L: LinAlgEx> Cone<L> for PepCone<'a, L>
{
    fn proj(&mut self, dual_cone: bool, x: &mut L::Sl) -> Result<(), ()>
    {
        let (n_zero, n_rpos, n_psd) = (self.n_zero, self.n_rpos, self.n_psd());

        splitm_mut!(x, (x_zero; n_zero), (x_rpos; n_rpos), (x_psd; n_psd));

        self.cone_zero.proj(dual_cone, &mut x_zero)?;
        self.cone_rpos.proj(dual_cone, &mut x_rpos)?;

        let mut offset = 0;
        for (cone, &len) in self.cones_psd.iter_mut().zip(self.psd_lens.iter()) {
            let (_, mut rest) = x_psd.split_mut(offset);
            let (mut x_blk, _) = rest.split_mut(len);
            cone.proj(dual_cone, &mut x_blk)?;
            offset += len;
        }

        Ok(())
    }

    fn product_group<G: Fn(&mut L::Sl) + Copy>(&self, dp_tau: &mut L::Sl, group: G)
    {
        let (n_zero, n_rpos, n_psd) = (self.n_zero, self.n_rpos, self.n_psd());

        splitm_mut!(dp_tau, (t_zero; n_zero), (t_rpos; n_rpos), (t_psd; n_psd));

        self.cone_zero.product_group(&mut t_zero, group);
        self.cone_rpos.product_group(&mut t_rpos, group);

        let mut offset = 0;
        for (cone, &len) in self.cones_psd.iter().zip(self.psd_lens.iter()) {
            let (_, mut rest) = t_psd.split_mut(offset);
            let (mut t_blk, _) = rest.split_mut(len);
            cone.product_group(&mut t_blk, group);
            offset += len;
        }
    }
}

//

/// Dense conic form `minimize c^T x subject to A x + s = b, s in K` of a [`SdpProgram`].
///
/// The variable `x` is the function value vector followed by the Gram matrix in packed form.
/// Rows are ordered as equalities, inequalities, the Gram matrix block and the LMI blocks.
struct ConicForm
{
    n_vars: usize,
    n_rows: usize,
    vec_c: Vec<f64>,
    /// Column-major.
    mat_a: Vec<f64>,
    vec_b: Vec<f64>,
    n_zero: usize,
    n_rpos: usize,
    psd_lens: Vec<usize>,
    /// Row of each constraint in submission order.
    rows: Vec<usize>,
    /// First row of each LMI block.
    lmi_rows: Vec<usize>,
}

impl ConicForm
{
    fn new(prog: &SdpProgram) -> Self
    {
        let n = prog.vector_len;
        let k = prog.gram_order;
        let n_vars = n + packed_len(k);

        let n_zero = prog.constraints.iter().filter(|(_, kind)| *kind == ConstraintKind::Equality).count();
        let n_rpos = prog.constraints.len() - n_zero;
        let mut psd_lens = vec![packed_len(k)];
        psd_lens.extend(prog.lmis.iter().map(|lmi| packed_len(lmi.order)));
        let n_rows = n_zero + n_rpos + psd_lens.iter().sum::<usize>();

        let mut form = ConicForm {
            n_vars,
            n_rows,
            vec_c: vec![0.; n_vars],
            mat_a: vec![0.; n_rows * n_vars],
            vec_b: vec![0.; n_rows],
            n_zero,
            n_rpos,
            psd_lens,
            rows: Vec::with_capacity(prog.constraints.len()),
            lmi_rows: Vec::with_capacity(prog.lmis.len()),
        };

        let sign = match prog.sense {
            Sense::Minimize => 1.,
            Sense::Maximize => -1.,
        };
        for (&i, &v) in prog.objective.vector.iter() {
            form.vec_c[i] += sign * v;
        }
        for (&(r, c), &v) in prog.objective.gram.iter() {
            form.vec_c[n + packed_idx(r, c)] += sign * v;
        }

        let (mut row_zero, mut row_rpos) = (0, n_zero);
        for (lf, kind) in prog.constraints.iter() {
            let row = match kind {
                ConstraintKind::Equality => {
                    row_zero += 1;
                    row_zero - 1
                },
                ConstraintKind::Inequality => {
                    row_rpos += 1;
                    row_rpos - 1
                },
            };
            form.set_row(row, n, lf, 1.);
            form.rows.push(row);
        }

        let mut row = n_zero + n_rpos;
        for c in 0.. k {
            for r in 0..= c {
                let col = n + packed_idx(r, c);
                form.mat_a[row + n_rows * col] = -packed_scale(r, c);
                row += 1;
            }
        }

        for lmi in prog.lmis.iter() {
            form.lmi_rows.push(row);
            for c in 0.. lmi.order {
                for r in 0..= c {
                    form.set_row(row, n, lmi.entry(r, c), -packed_scale(r, c));
                    row += 1;
                }
            }
        }
        debug_assert_eq!(row, n_rows);

        form
    }

    /// Sets `A` and `b` at a row so that the slack is `s = -scale * lf(x)`.
    fn set_row(&mut self, row: usize, n: usize, lf: &LinearForm, scale: f64)
    {
        let m = self.n_rows;

        for (&i, &v) in lf.vector.iter() {
            self.mat_a[row + m * i] += scale * v;
        }
        for (&(r, c), &v) in lf.gram.iter() {
            self.mat_a[row + m * (n + packed_idx(r, c))] += scale * v;
        }
        self.vec_b[row] = -scale * lf.constant;
    }
}

//

/// Default SDP solver backend
///
/// Solves a [`SdpProgram`] by the first-order conic solver of `totsu_core`,
/// with any of its linear algebra implementations.
/// The program is built in `f64` and converted to `L::F`.
pub struct TotsuSdp<L: LinAlgEx>
{
    ph_l: PhantomData<L>,
    /// Parameters passed to [`Solver`].
    pub par: SolverParam<L::F>,
}

impl<L: LinAlgEx> TotsuSdp<L>
{
    /// Creates an instance with the default solver parameters.
    pub fn new() -> Self
    {
        TotsuSdp {
            ph_l: PhantomData,
            par: SolverParam::default(),
        }
    }

    /// Changes solver parameters.
    ///
    /// Returns [`TotsuSdp`] with its parameters changed.
    /// * `f` is a function to change parameters given by its argument.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut SolverParam<L::F>)
    {
        f(&mut self.par);
        self
    }
}

impl<L: LinAlgEx> Default for TotsuSdp<L>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<L: LinAlgEx> SdpSolver for TotsuSdp<L>
where L::F: Debug + LowerExp
{
    fn solve(&self, prog: &SdpProgram) -> Result<SdpSolution, PepError>
    {
        let form = ConicForm::new(prog);
        let (m, nx) = (form.n_rows, form.n_vars);
        log::debug!("conic form: {} variable(s), {} row(s): zero {}, rpos {}, psd {:?}",
                    nx, m, form.n_zero, form.n_rpos, form.psd_lens);

        let vec_c: Vec<L::F> = form.vec_c.iter().map(|v| to_float(*v)).collect();
        let mat_a: Vec<L::F> = form.mat_a.iter().map(|v| to_float(*v)).collect();
        let vec_b: Vec<L::F> = form.vec_b.iter().map(|v| to_float(*v)).collect();

        let op_c = MatOp::<L>::new(MatType::General(nx, 1), &vec_c);
        let op_a = MatOp::<L>::new(MatType::General(m, nx), &mat_a);
        let op_b = MatOp::<L>::new(MatType::General(m, 1), &vec_b);

        let mut psd_lens = Vec::new();
        let mut w_psd = Vec::new();
        for &len in form.psd_lens.iter().filter(|&&len| len > 0) {
            psd_lens.push(len);
            w_psd.push(vec![L::F::zero(); ConePSD::<L>::query_worklen(len)]);
        }
        let cone = PepCone {
            n_zero: form.n_zero,
            n_rpos: form.n_rpos,
            psd_lens,
            cone_zero: ConeZero::new(),
            cone_rpos: ConeRPos::new(),
            cones_psd: w_psd.iter_mut().map(|w| ConePSD::new(w.as_mut_slice(), self.par.eps_zero)).collect(),
        };

        let mut w_solver = vec![L::F::zero(); Solver::<L>::query_worklen((m, nx))];
        let s = Solver::<L>::new().par(|p| *p = self.par.clone());

        let rslt = s.solve((op_c, op_a, op_b, cone, w_solver.as_mut_slice()));
        let (x, y, status) = match rslt {
            Ok((x, y)) => (to_f64s(x), to_f64s(y), SolveStatus::Optimal),
            Err(SolverError::ExcessIter) => {
                log::warn!("solver stopped by the iteration limit");

                // the iterate is (x, y, s, tau); with a vanishing tau it is a certificate, not a solution
                let tau = w_solver[nx + m + m];
                if !(tau > self.par.eps_zero) {
                    log::warn!("no iterate to report: tau {:.3e}", tau);
                    return Ok(SdpSolution::empty(SolveStatus::Inaccurate));
                }
                (to_f64s(&w_solver[.. nx]), to_f64s(&w_solver[nx.. nx + m]), SolveStatus::Inaccurate)
            },
            Err(SolverError::Infeasible) => return Ok(SdpSolution::empty(SolveStatus::Infeasible)),
            Err(SolverError::Unbounded) => return Ok(SdpSolution::empty(SolveStatus::Unbounded)),
            Err(e) => return Err(e.into()),
        };
        log::trace!("x {:?}", x);
        log::trace!("y {:?}", y);

        let n = prog.vector_len;
        let k = prog.gram_order;

        let vector = x[.. n].to_vec();
        let mut gram = vec![0.; k * k];
        for c in 0.. k {
            for r in 0..= c {
                let v = x[n + packed_idx(r, c)];
                gram[r * k + c] = v;
                gram[c * k + r] = v;
            }
        }

        let duals = form.rows.iter().map(|&row| y[row]).collect();

        let lmi_duals = prog.lmis.iter().zip(form.lmi_rows.iter()).map(|(lmi, &row0)| {
            let o = lmi.order;
            let mut d = vec![0.; o * o];
            for c in 0.. o {
                for r in 0..= c {
                    let v = y[row0 + packed_idx(r, c)] / packed_scale(r, c);
                    d[r * o + c] = v;
                    d[c * o + r] = v;
                }
            }
            d
        }).collect();

        let objective = prog.objective.eval(&vector, &gram, k);

        Ok(SdpSolution {
            status,
            objective,
            vector,
            gram,
            duals,
            lmi_duals,
        })
    }
}

/// [`TotsuSdp`] with the pure Rust linear algebra of `totsu_core`.
pub type DefaultSdp = TotsuSdp<FloatGeneric<f64>>;

//

#[cfg(test)]
fn program(k: usize, n: usize) -> SdpProgram
{
    SdpProgram {
        vector_len: n,
        gram_order: k,
        sense: Sense::Maximize,
        objective: LinearForm::default(),
        constraints: Vec::new(),
        lmis: Vec::new(),
    }
}

#[test]
fn test_sdp_gram_bound()
{
    use float_eq::assert_float_eq;

    let _ = env_logger::builder().is_test(true).try_init();

    // maximize G01 subject to G00 <= 1, G11 <= 1
    let mut prog = program(2, 0);
    prog.objective.gram.insert((0, 1), 1.);
    for i in 0.. 2 {
        let mut lf = LinearForm::default();
        lf.gram.insert((i, i), 1.);
        lf.constant = -1.;
        prog.constraints.push((lf, ConstraintKind::Inequality));
    }

    let s = DefaultSdp::new().par(|p| p.max_iter = Some(100_000));
    let sol = s.solve(&prog).unwrap();

    assert_eq!(sol.status, SolveStatus::Optimal);
    assert_float_eq!(sol.objective, 1., abs <= 1e-3);
    assert_float_eq!(sol.gram[1], 1., abs <= 1e-3);
    assert_float_eq!(sol.duals[0], 0.5, abs <= 1e-3);
    assert_float_eq!(sol.duals[1], 0.5, abs <= 1e-3);
}

#[test]
fn test_sdp_lmi()
{
    use float_eq::assert_float_eq;
    use crate::sdp::LmiBlock;

    let _ = env_logger::builder().is_test(true).try_init();

    // minimize f subject to [[f, 1], [1, 1]] PSD, f == f (equality row kept in order)
    let mut prog = program(0, 1);
    prog.sense = Sense::Minimize;
    prog.objective.vector.insert(0, 1.);

    let mut f = LinearForm::default();
    f.vector.insert(0, 1.);
    let one = LinearForm {constant: 1., ..LinearForm::default()};
    prog.lmis.push(LmiBlock {
        order: 2,
        entries: vec![f, one.clone(), one.clone(), one],
    });

    let mut upper = LinearForm::default();
    upper.vector.insert(0, 1.);
    upper.constant = -10.;
    prog.constraints.push((upper, ConstraintKind::Inequality));

    let s = DefaultSdp::new().par(|p| p.max_iter = Some(100_000));
    let sol = s.solve(&prog).unwrap();

    assert_eq!(sol.status, SolveStatus::Optimal);
    assert_float_eq!(sol.vector[0], 1., abs <= 1e-3);
    assert_float_eq!(sol.duals[0], 0., abs <= 1e-3);
    let d = &sol.lmi_duals[0];
    assert_float_eq!(d[0], 1., abs <= 1e-2);
    assert_float_eq!(d[1], -1., abs <= 1e-2);
    assert_float_eq!(d[2], d[1], abs <= 1e-12);
}

#[test]
fn test_conic_form_rows()
{
    let mut prog = program(2, 1);
    let mut eq = LinearForm::default();
    eq.vector.insert(0, 1.);
    let mut ineq = LinearForm::default();
    ineq.gram.insert((0, 1), 2.);
    ineq.constant = 3.;
    prog.constraints.push((ineq, ConstraintKind::Inequality));
    prog.constraints.push((eq, ConstraintKind::Equality));

    let form = ConicForm::new(&prog);

    assert_eq!(form.n_vars, 1 + 3);
    assert_eq!(form.n_rows, 2 + 3);
    // equality goes first regardless of submission order
    assert_eq!(form.rows, vec![1, 0]);
    assert_eq!(form.mat_a[1 + 5 * (1 + packed_idx(0, 1))], 2.);
    assert_eq!(form.vec_b[1], -3.);
    // maximize zero objective
    assert!(form.vec_c.iter().all(|c| *c == 0.));
    // scaled Gram rows
    assert_eq!(form.mat_a[2 + 5 * 1], -1.);
    assert_eq!(form.mat_a[3 + 5 * 2], -core::f64::consts::SQRT_2);
}
