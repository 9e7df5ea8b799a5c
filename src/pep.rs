use std::rc::Rc;
use crate::basis::Basis;
use crate::classes::{ClassParams, ClassRegistry, FunctionClass};
use crate::constraint::{Constraint, ConstraintKind, PsdMatrix};
use crate::expression::Expression;
use crate::function::Function;
use crate::gram::{self, Valuation};
use crate::linear_form::LinearForm;
use crate::param::{DimensionReduction, PepParam};
use crate::point::Point;
use crate::sdp::{LmiBlock, SdpProgram, SdpSolution, SdpSolver, Sense, SolveStatus};
use crate::totsu_sdp::DefaultSdp;
use crate::PepError;

const EPS_ZERO_EIG: f64 = 1e-12;

//

/// Result of [`Pep::solve`].
#[derive(Debug, Clone)]
pub struct PepSolution
{
    /// Worst-case value of the performance metrics.
    ///
    /// `-inf` if the problem is infeasible, `+inf` if it is unbounded.
    pub value: f64,
    pub status: SolveStatus,
    /// Number of Gram matrix eigenvalues above [`PepParam::eig_threshold`],
    /// the dimension of the worst-case instance. `None` without a solution.
    pub dimension: Option<usize>,
    /// Smallest eigenvalue of the Gram matrix before clamping. `None` without a solution.
    pub min_eigenvalue: Option<f64>,
    /// Compiled program of the main solve, if [`PepParam::keep_program`].
    pub program: Option<SdpProgram>,
    /// Raw solution of the main solve, if [`PepParam::keep_program`].
    pub raw: Option<SdpSolution>,
}

//

/// Performance estimation problem
///
/// Owns the whole formulation: declared functions, initial points, constraints,
/// performance metrics and PSD matrices of expressions.
/// [`Pep::solve`] compiles it into a semidefinite program over the function value vector `F`
/// and the Gram matrix `G` of all leaf points, solves it, and stores a worst-case instance and the duals.
#[derive(Debug)]
pub struct Pep
{
    basis: Rc<Basis>,
    null_point: Point,
    null_expression: Expression,

    functions: Vec<Function>,
    initial_points: Vec<Point>,
    constraints: Vec<Constraint>,
    metrics: Vec<Expression>,
    metric_duals: Vec<f64>,
    psd_matrices: Vec<PsdMatrix>,

    valuation: Option<Valuation>,
}

impl Default for Pep
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl Pep
{
    /// Creates an empty problem with its own [`Basis`].
    pub fn new() -> Self
    {
        Pep {
            basis: Rc::new(Basis::new()),
            null_point: Point::zero(),
            null_expression: Expression::zero(),
            functions: Vec::new(),
            initial_points: Vec::new(),
            constraints: Vec::new(),
            metrics: Vec::new(),
            metric_duals: Vec::new(),
            psd_matrices: Vec::new(),
            valuation: None,
        }
    }

    pub fn basis(&self) -> &Rc<Basis>
    {
        &self.basis
    }

    /// Creates a leaf point of this problem without registering it as an initial point.
    pub fn new_point(&self) -> Point
    {
        Point::leaf(&self.basis)
    }

    /// Creates a leaf expression of this problem.
    pub fn new_expression(&self) -> Expression
    {
        Expression::leaf(&self.basis)
    }

    /// The zero point.
    pub fn null_point(&self) -> &Point
    {
        &self.null_point
    }

    /// The zero expression.
    pub fn null_expression(&self) -> &Expression
    {
        &self.null_expression
    }

    /// Declares a function of the given class.
    pub fn declare_function<C: FunctionClass + 'static>(&mut self, class: C) -> Function
    {
        self.declare_function_boxed(Box::new(class), None)
    }

    /// Declares a function of a class built from a registry by name.
    ///
    /// Returns `Err` if the class is unknown or its parameters are missing or invalid.
    pub fn declare_function_named(&mut self, registry: &ClassRegistry, name: &str, params: &ClassParams) -> Result<Function, PepError>
    {
        let class = registry.build(name, params)?;

        Ok(self.declare_function_boxed(class, Some(name.to_string())))
    }

    fn declare_function_boxed(&mut self, class: Box<dyn FunctionClass>, name: Option<String>) -> Function
    {
        let f = Function::leaf(self.basis.clone(), class, name);
        self.functions.push(f.clone());
        f
    }

    /// Declared functions in declaration order.
    pub fn functions(&self) -> &[Function]
    {
        &self.functions
    }

    /// Creates a leaf point as an initial point of the method.
    pub fn set_initial_point(&mut self) -> Point
    {
        let x = Point::leaf(&self.basis);
        self.initial_points.push(x.clone());
        x
    }

    pub fn initial_points(&self) -> &[Point]
    {
        &self.initial_points
    }

    /// Adds a constraint on the initial points, the same as [`Pep::add_constraint`].
    pub fn set_initial_condition(&mut self, condition: Constraint)
    {
        self.add_constraint(condition);
    }

    pub fn add_constraint(&mut self, constraint: Constraint)
    {
        self.constraints.push(constraint);
    }

    /// Adds a performance metric.
    ///
    /// The worst-case value is that of the minimum over all the metrics.
    pub fn set_performance_metric(&mut self, metric: Expression)
    {
        self.metrics.push(metric);
    }

    pub fn add_psd_matrix(&mut self, matrix: PsdMatrix)
    {
        self.psd_matrices.push(matrix);
    }

    /// Constraints added by [`Pep::add_constraint`], with duals after a solve.
    pub fn constraints(&self) -> &[Constraint]
    {
        &self.constraints
    }

    /// Dual values of the performance metrics of the last solve, empty before any.
    pub fn performance_metric_duals(&self) -> &[f64]
    {
        &self.metric_duals
    }

    /// PSD matrices, with dual matrices after a solve.
    pub fn psd_matrices(&self) -> &[PsdMatrix]
    {
        &self.psd_matrices
    }

    /// Worst-case instance of the last solve.
    pub fn valuation(&self) -> Option<&Valuation>
    {
        self.valuation.as_ref()
    }

    /// Coordinates of a point in the worst-case instance.
    pub fn eval_point(&self, point: &Point) -> Option<Vec<f64>>
    {
        point.eval(self.valuation.as_ref()?)
    }

    /// Value of an expression in the worst-case instance.
    pub fn eval_expression(&self, expr: &Expression) -> Option<f64>
    {
        expr.eval(self.valuation.as_ref()?)
    }

    /// Solves the problem with the default backend.
    pub fn solve(&mut self, param: &PepParam) -> Result<PepSolution, PepError>
    {
        self.solve_with(&DefaultSdp::new(), param)
    }

    /// Solves the problem with the given backend.
    ///
    /// Returns `Ok` with the worst-case value and the solve status,
    /// or `Err` if the formulation is malformed or the solver could not run.
    /// A solve regenerates the interpolation constraints and compiles the current formulation from scratch.
    pub fn solve_with<S: SdpSolver>(&mut self, solver: &S, param: &PepParam) -> Result<PepSolution, PepError>
    {
        if self.metrics.is_empty() {
            return Err(PepError::NoPerformanceMetric);
        }

        for f in self.functions.iter() {
            f.add_class_constraints();
        }

        let prog = self.compile()?;

        log::info!("Calling SDP solver");
        let sol = solver.solve(&prog)?;
        let t = prog.vector_len - 1;
        if !sol.has_values() {
            log::warn!("Solver status: {:?}", sol.status);
            self.clear_solution();

            return Ok(PepSolution {
                value: sol.objective,
                status: sol.status,
                dimension: None,
                min_eigenvalue: None,
                program: param.keep_program.then_some(prog),
                raw: param.keep_program.then_some(sol),
            });
        }
        if let Err(e) = sol.check_size(&prog) {
            self.clear_solution();
            return Err(e);
        }
        log::info!("Solver status: {:?}; optimal value: {}", sol.status, sol.vector[t]);
        if sol.status == SolveStatus::Inaccurate {
            log::warn!("solution is inaccurate, the worst-case value is not certified");
        }

        let mut status = sol.status;
        let mut value = sol.vector[t];
        let mut witness = None;

        if let Some(heuristic) = param.dimension_reduction {
            let f = gram::factor(&sol.gram, prog.gram_order, param.eig_threshold, EPS_ZERO_EIG);
            log::info!("Postprocessing: {} eigenvalue(s) > {} before dimension reduction", f.rank, param.eig_threshold);

            let reduced = Self::reduction_program(&prog, heuristic, value - param.tol_dimension_reduction);
            log::info!("Calling SDP solver");
            let sol2 = solver.solve(&reduced)?;

            if sol2.has_values() {
                if let Err(e) = sol2.check_size(&reduced) {
                    self.clear_solution();
                    return Err(e);
                }
                log::info!("Solver status: {:?}; objective value: {}", sol2.status, sol2.vector[t]);
                value = sol2.vector[t];
                if sol2.status == SolveStatus::Inaccurate {
                    status = SolveStatus::Inaccurate;
                }
                witness = Some(sol2);
            }
            else {
                log::warn!("Solver status: {:?}; dimension reduction discarded", sol2.status);
            }
        }

        let witness = witness.as_ref().unwrap_or(&sol);
        let k = prog.gram_order;
        let f = gram::factor(&witness.gram, k, param.eig_threshold, EPS_ZERO_EIG);
        if param.dimension_reduction.is_some() {
            log::info!("Postprocessing: {} eigenvalue(s) > {} after dimension reduction", f.rank, param.eig_threshold);
        }
        else {
            log::debug!("Postprocessing: {} eigenvalue(s) > {}", f.rank, param.eig_threshold);
        }

        if f.min_eig < 0. {
            log::warn!("Postprocessing: solver's output is not entirely feasible (smallest eigenvalue of the Gram matrix is {:.3e} < 0), projected onto the PSD cone", f.min_eig);

            if let Some(th) = param.eig_fail_threshold {
                if f.min_eig < -th {
                    self.clear_solution();
                    return Err(PepError::NegativeEigenvalue(f.min_eig));
                }
            }
        }

        let values = witness.vector[.. t].to_vec();
        self.valuation = Some(Valuation::new(k, f.columns, values));
        self.assign_duals(&sol);

        Ok(PepSolution {
            value,
            status,
            dimension: Some(f.rank),
            min_eigenvalue: Some(f.min_eig),
            program: param.keep_program.then_some(prog),
            raw: param.keep_program.then_some(sol),
        })
    }

    /// Compiles the formulation.
    ///
    /// The vector variable is the function values followed by the worst-case value `t`,
    /// which is maximized subject to `t <= metric` for every metric.
    /// Constraints are in the order of the metrics, [`Pep::constraints`],
    /// and then each function's own constraints followed by its interpolation constraints.
    fn compile(&self) -> Result<SdpProgram, PepError>
    {
        let k = self.basis.point_count();
        let n = self.basis.expr_count();
        let t = n;
        let form = |e: &Expression| LinearForm::from_expression(e, n, k);

        log::info!("Setting up the problem: size of the main PSD matrix: {}x{}", k, k);

        let mut constraints = Vec::new();

        for m in self.metrics.iter() {
            let mut lf = form(&-m)?;
            lf.vector.insert(t, 1.);
            constraints.push((lf, ConstraintKind::Inequality));
        }
        log::info!("Setting up the problem: performance measure is minimum of {} element(s)", self.metrics.len());

        for c in self.constraints.iter() {
            constraints.push((form(c.expression())?, c.kind()));
        }
        log::info!("Setting up the problem: initial conditions ({} constraint(s) added)", self.constraints.len());

        let mut lmis = Vec::new();
        for psd in self.psd_matrices.iter() {
            let o = psd.order();
            let mut entries = Vec::with_capacity(o * o);
            for r in 0.. o {
                for c in 0.. o {
                    entries.push(form(psd.entry(r, c))?);
                }
            }
            lmis.push(LmiBlock {order: o, entries});
        }
        log::info!("Setting up the problem: {} lmi constraint(s) added", lmis.len());

        log::info!("Setting up the problem: interpolation conditions for {} function(s)", self.functions.len());
        for (i, f) in self.functions.iter().enumerate() {
            let user = f.constraints();
            let class = f.class_constraints();
            for c in user.iter().chain(class.iter()) {
                constraints.push((form(c.expression())?, c.kind()));
            }
            log::info!("\t function {} : {} constraint(s) added", i + 1, user.len() + class.len());
        }

        log::info!("Compiling SDP");
        let mut objective = LinearForm::default();
        objective.vector.insert(t, 1.);

        let prog = SdpProgram {
            vector_len: n + 1,
            gram_order: k,
            sense: Sense::Maximize,
            objective,
            constraints,
            lmis,
        };
        log::debug!("SDP: vector {}, gram {}x{}, {} constraint(s), {} lmi(s)",
                    prog.vector_len, k, k, prog.constraints.len(), prog.lmis.len());

        Ok(prog)
    }

    /// Program looking for a low-rank Gram matrix among solutions with `t >= lower`.
    fn reduction_program(prog: &SdpProgram, heuristic: DimensionReduction, lower: f64) -> SdpProgram
    {
        let t = prog.vector_len - 1;
        let mut reduced = prog.clone();

        match heuristic {
            DimensionReduction::Trace => {
                let mut objective = LinearForm::default();
                for i in 0.. prog.gram_order {
                    objective.gram.insert((i, i), 1.);
                }
                reduced.objective = objective;
            },
        }
        reduced.sense = Sense::Minimize;

        let mut bound = LinearForm::default();
        bound.vector.insert(t, -1.);
        bound.constant = lower;
        reduced.constraints.push((bound, ConstraintKind::Inequality));

        reduced
    }

    fn assign_duals(&mut self, sol: &SdpSolution)
    {
        let nm = self.metrics.len();
        self.metric_duals = sol.duals[.. nm].to_vec();

        let mut duals = sol.duals[nm..].iter().map(|d| Some(*d));
        for c in self.constraints.iter_mut() {
            c.set_dual(duals.next().flatten());
        }
        for f in self.functions.iter() {
            f.set_duals(&mut duals);
        }

        for (psd, d) in self.psd_matrices.iter_mut().zip(sol.lmi_duals.iter()) {
            psd.set_dual(Some(d.clone()));
        }
    }

    fn clear_solution(&mut self)
    {
        self.valuation = None;
        self.metric_duals.clear();

        let mut none = core::iter::repeat(None);
        for c in self.constraints.iter_mut() {
            c.set_dual(None);
        }
        for f in self.functions.iter() {
            f.set_duals(&mut none);
        }
        for psd in self.psd_matrices.iter_mut() {
            psd.set_dual(None);
        }
    }
}

//

#[test]
fn test_pep_bookkeeping()
{
    use crate::classes::Convex;

    let mut pep = Pep::new();
    let f = pep.declare_function(Convex::new());
    let x0 = pep.set_initial_point();
    let xs = f.stationary_point();

    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));
    pep.set_performance_metric(f.value(&x0) - f.value(&xs));

    assert_eq!(pep.functions().len(), 1);
    assert_eq!(pep.initial_points().len(), 1);
    assert_eq!(pep.constraints().len(), 1);
    assert!(pep.valuation().is_none());
    assert!(pep.eval_point(&x0).is_none());
    assert!(pep.null_point().is_zero());
    assert!(pep.null_expression().decomposition().is_empty());

    let reg = ClassRegistry::builtin();
    let g = pep.declare_function_named(&reg, "smooth", &ClassParams::new().with("L", 1.)).unwrap();
    assert_eq!(g.name().as_deref(), Some("smooth"));
    assert_eq!(pep.functions().len(), 2);
    assert!(pep.declare_function_named(&reg, "smooth", &ClassParams::new()).is_err());
    assert_eq!(pep.functions().len(), 2);
}

#[test]
fn test_pep_compile_order()
{
    use crate::classes::SmoothStronglyConvex;

    let mut pep = Pep::new();
    let f = pep.declare_function(SmoothStronglyConvex::new(0.1, 1.).unwrap());
    let x0 = pep.set_initial_point();
    let xs = f.stationary_point();
    let x1 = &x0 - f.gradient(&x0);

    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));
    pep.set_performance_metric((&x1 - &xs).sqnorm());
    f.add_class_constraints();

    let prog = pep.compile().unwrap();

    // F = (f(xs), f(x0), t), G over (x0, xs, g0)
    assert_eq!(prog.vector_len, 3);
    assert_eq!(prog.gram_order, 3);
    // metric, initial condition, 2 interpolation constraints
    assert_eq!(prog.constraints.len(), 1 + 1 + 2);
    assert_eq!(prog.constraints[0].0.vector[&2], 1.);
    assert_eq!(prog.constraints[1].0.constant, -1.);
    assert_eq!(prog.objective.vector[&2], 1.);
}

#[test]
fn test_pep_no_metric()
{
    let mut pep = Pep::new();
    let _ = pep.set_initial_point();

    assert_eq!(pep.solve(&PepParam::default()).unwrap_err(), PepError::NoPerformanceMetric);
}

#[test]
fn test_pep_foreign_object()
{
    use crate::classes::Convex;

    let other = Pep::new();
    let _ = other.new_point();
    let _ = other.new_point();
    let y = other.new_point();

    let mut pep = Pep::new();
    let f = pep.declare_function(Convex::new());
    let x = pep.set_initial_point();
    pep.set_performance_metric(f.value(&x) + y.sqnorm());

    assert_eq!(pep.solve(&PepParam::default()).unwrap_err(), PepError::ForeignBasis);
}

#[cfg(test)]
struct FixedSdp(SdpSolution);

#[cfg(test)]
impl SdpSolver for FixedSdp
{
    fn solve(&self, _prog: &SdpProgram) -> Result<SdpSolution, PepError>
    {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
fn one_step_pep() -> Pep
{
    use crate::classes::Convex;

    let mut pep = Pep::new();
    let f = pep.declare_function(Convex::new());
    let x0 = pep.set_initial_point();
    let xs = f.optimal_point();
    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));
    pep.set_performance_metric(f.value(&x0) - f.value(&xs));
    pep
}

#[test]
fn test_pep_short_solution()
{
    let mut pep = one_step_pep();

    let short = SdpSolution {
        status: SolveStatus::Optimal,
        objective: 1.,
        vector: vec![1.],
        gram: Vec::new(),
        duals: Vec::new(),
        lmi_duals: Vec::new(),
    };
    let e = pep.solve_with(&FixedSdp(short), &PepParam::default()).unwrap_err();

    assert!(matches!(e, PepError::MalformedSolution {what: "vector", len: 1, ..}));
    assert!(pep.valuation().is_none());
}

#[test]
fn test_pep_inaccurate_without_iterate()
{
    let mut pep = one_step_pep();

    let empty = SdpSolution::empty(SolveStatus::Inaccurate);
    assert!(!empty.has_values());
    let rslt = pep.solve_with(&FixedSdp(empty), &PepParam::default()).unwrap();

    assert_eq!(rslt.status, SolveStatus::Inaccurate);
    assert!(rslt.value.is_nan());
    assert!(rslt.dimension.is_none());
    assert!(pep.valuation().is_none());
    assert!(pep.constraints()[0].dual().is_none());
}
