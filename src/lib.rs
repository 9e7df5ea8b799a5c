/*!
Performance estimation problems (PEP) of first-order optimization methods.

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

This crate for Rust computes **tight worst-case guarantees** of a first-order method
by compiling it into a semidefinite program (SDP), which is solved by [`totsu_core`].

# General usage

1. Create a [`Pep`].
1. Declare functions of some [`classes`], e.g. [`classes::SmoothStronglyConvex`],
   by [`Pep::declare_function`] or by name through a [`classes::ClassRegistry`].
1. Write the method symbolically:
   initial points by [`Pep::set_initial_point`], oracle calls by [`Function::oracle`] or [`Function::gradient`],
   and [`Point`] / [`Expression`] arithmetic for the steps.
1. Bound the initial state by [`Pep::set_initial_condition`]
   and give the quantity to bound by [`Pep::set_performance_metric`].
1. Invoke [`Pep::solve`] (or [`Pep::solve_with`] for a tuned solver) to get the worst-case value.
   Afterwards, a worst-case instance is evaluated by [`Pep::eval_point`] and [`Pep::eval_expression`],
   and every [`Constraint`] holds its dual value.

The problem is
\\[
\begin{array}{ll}
{\rm maximize} & \tau \\\\
{\rm subject \ to} & \tau \le m_i(F, G) \quad \text{for every performance metric} \\\\
& \text{initial conditions and interpolation conditions, linear in } F, G \\\\
& G \succeq 0,
\end{array}
\\]
where \\( F \\) is the vector of all leaf function values and \\( G \\) is the Gram matrix of all leaf points.

# Examples

One step of gradient descent with step size \\( 1/L \\) on an \\(L\\)-smooth \\(\mu\\)-strongly convex function
contracts the squared distance to the minimizer by \\( (1 - \mu/L)^2 \\).

```
use float_eq::assert_float_eq;
use totsu_pep::prelude::*;
use totsu_pep::*;

//env_logger::init(); // Use any logger crate as `totsu_pep` uses `log` crate.

let (mu, l) = (0.1, 1.);

let mut pep = Pep::new();
let func = pep.declare_function(SmoothStronglyConvex::new(mu, l).unwrap());

let xs = func.stationary_point();
let x0 = pep.set_initial_point();
pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));

let x1 = &x0 - func.gradient(&x0) / l;
pep.set_performance_metric((&x1 - &xs).sqnorm());

let s = DefaultSdp::new().par(|p| {
   p.max_iter = Some(100_000);
});
let rslt = pep.solve_with(&s, &PepParam::default()).unwrap();

assert_eq!(rslt.status, SolveStatus::Optimal);
assert_float_eq!(rslt.value, (1. - mu / l).powi(2), abs <= 1e-3);
```

## Other examples

You can find other [tests](https://github.com/convexbrain/Totsu/tree/master/solver_rust_conic/totsu_pep/tests) of the methods.
*/

mod error;

pub use error::*;

//

mod basis;
mod point;
mod expression;
mod constraint;
mod function;
mod gram;

pub use basis::*;
pub use point::*;
pub use expression::*;
pub use constraint::*;
pub use function::*;
pub use gram::Valuation;

pub mod classes;

//

mod linear_form;
mod sdp;
mod totsu_sdp;

pub use linear_form::*;
pub use sdp::*;
pub use totsu_sdp::*;

//

mod param;
mod pep;

pub use param::*;
pub use pep::*;

//

/// Prelude
pub mod prelude
{
    pub use totsu_core::solver::{SolverError, SolverParam};
    pub use totsu_core::FloatGeneric;
    pub use crate::classes::{FunctionClass, ClassParams, ClassRegistry};
    pub use crate::classes::{Convex, StronglyConvex, SmoothStronglyConvex, Smooth, ConvexLipschitz, ConvexIndicator};
    pub use crate::classes::{Monotone, StronglyMonotone, LipschitzOperator, Cocoercive};
}
