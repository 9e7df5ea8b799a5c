use crate::constraint::Constraint;
use crate::function::OracleQuery;
use crate::PepError;
use super::{FunctionClass, check_param, distinct_pairs, unique_pairs};

//

/// Closed proper convex functions.
#[derive(Debug, Clone, Default)]
pub struct Convex;

impl Convex
{
    pub const NAME: &'static str = "convex";

    pub fn new() -> Self
    {
        Convex
    }
}

impl FunctionClass for Convex
{
    fn name(&self) -> &str
    {
        Self::NAME
    }

    fn reuse_gradient(&self) -> bool
    {
        false
    }

    fn interpolation(&self, queries: &[OracleQuery]) -> Vec<Constraint>
    {
        distinct_pairs(queries).map(|(qi, qj)| {
            (&qj.value + &qj.gradient * (&qi.point - &qj.point)).le(&qi.value)
        }).collect()
    }
}

//

/// Strongly convex functions with parameter `mu`.
#[derive(Debug, Clone)]
pub struct StronglyConvex
{
    mu: f64,
}

impl StronglyConvex
{
    pub const NAME: &'static str = "strongly_convex";

    pub fn new(mu: f64) -> Result<Self, PepError>
    {
        let mu = check_param(Self::NAME, "mu", mu, mu >= 0. && mu.is_finite())?;

        Ok(StronglyConvex {mu})
    }
}

impl FunctionClass for StronglyConvex
{
    fn name(&self) -> &str
    {
        Self::NAME
    }

    fn reuse_gradient(&self) -> bool
    {
        false
    }

    fn interpolation(&self, queries: &[OracleQuery]) -> Vec<Constraint>
    {
        distinct_pairs(queries).map(|(qi, qj)| {
            let dx = &qi.point - &qj.point;
            (&qj.value + &qj.gradient * &dx + 0.5 * self.mu * dx.sqnorm()).le(&qi.value)
        }).collect()
    }
}

//

/// Smooth strongly convex functions.
///
/// `L`-smooth and `mu`-strongly convex with `0 <= mu < L < inf`.
/// Gradients are unique, so repeated queries at a point share one gradient.
#[derive(Debug, Clone)]
pub struct SmoothStronglyConvex
{
    mu: f64,
    l: f64,
}

impl SmoothStronglyConvex
{
    pub const NAME: &'static str = "smooth_strongly_convex";

    pub fn new(mu: f64, l: f64) -> Result<Self, PepError>
    {
        let l = check_param(Self::NAME, "L", l, l > 0. && l.is_finite())?;
        let mu = check_param(Self::NAME, "mu", mu, mu >= 0. && mu < l)?;

        Ok(SmoothStronglyConvex {mu, l})
    }
}

impl FunctionClass for SmoothStronglyConvex
{
    fn name(&self) -> &str
    {
        Self::NAME
    }

    fn reuse_gradient(&self) -> bool
    {
        true
    }

    fn interpolation(&self, queries: &[OracleQuery]) -> Vec<Constraint>
    {
        let (mu, l) = (self.mu, self.l);

        distinct_pairs(queries).map(|(qi, qj)| {
            let dx = &qi.point - &qj.point;
            let dg = &qi.gradient - &qj.gradient;
            let rhs = &qj.value
                + &qj.gradient * &dx
                + 0.5 / l * dg.sqnorm()
                + mu / (2. * (1. - mu / l)) * (&dx - &dg / l).sqnorm();
            rhs.le(&qi.value)
        }).collect()
    }
}

//

/// Smooth (possibly nonconvex) functions with gradient Lipschitz constant `L`.
#[derive(Debug, Clone)]
pub struct Smooth
{
    l: f64,
}

impl Smooth
{
    pub const NAME: &'static str = "smooth";

    pub fn new(l: f64) -> Result<Self, PepError>
    {
        let l = check_param(Self::NAME, "L", l, l > 0. && l.is_finite())?;

        Ok(Smooth {l})
    }
}

impl FunctionClass for Smooth
{
    fn name(&self) -> &str
    {
        Self::NAME
    }

    fn reuse_gradient(&self) -> bool
    {
        true
    }

    fn interpolation(&self, queries: &[OracleQuery]) -> Vec<Constraint>
    {
        let l = self.l;

        distinct_pairs(queries).map(|(qi, qj)| {
            let dx = &qi.point - &qj.point;
            let dg = &qi.gradient - &qj.gradient;
            let rhs = &qj.value
                + 0.5 * ((&qi.gradient + &qj.gradient) * &dx)
                - 0.25 * l * dx.sqnorm()
                + 0.25 / l * dg.sqnorm();
            rhs.le(&qi.value)
        }).collect()
    }
}

//

/// Convex functions with bounded subgradients, `||g|| <= M`.
#[derive(Debug, Clone)]
pub struct ConvexLipschitz
{
    m: f64,
}

impl ConvexLipschitz
{
    pub const NAME: &'static str = "convex_lipschitz";

    pub fn new(m: f64) -> Result<Self, PepError>
    {
        let m = check_param(Self::NAME, "M", m, m >= 0. && m.is_finite())?;

        Ok(ConvexLipschitz {m})
    }
}

impl FunctionClass for ConvexLipschitz
{
    fn name(&self) -> &str
    {
        Self::NAME
    }

    fn reuse_gradient(&self) -> bool
    {
        false
    }

    fn interpolation(&self, queries: &[OracleQuery]) -> Vec<Constraint>
    {
        let mut cons: Vec<Constraint> = queries.iter().map(|q| {
            q.gradient.sqnorm().le(self.m * self.m)
        }).collect();

        cons.extend(Convex.interpolation(queries));
        cons
    }
}

//

/// Indicator functions of closed convex sets with diameter at most `D`.
///
/// `D` may be infinite, in which case no diameter constraint is generated.
#[derive(Debug, Clone)]
pub struct ConvexIndicator
{
    d: f64,
}

impl ConvexIndicator
{
    pub const NAME: &'static str = "convex_indicator";

    pub fn new(d: f64) -> Result<Self, PepError>
    {
        let d = check_param(Self::NAME, "D", d, d >= 0.)?;

        Ok(ConvexIndicator {d})
    }
}

impl FunctionClass for ConvexIndicator
{
    fn name(&self) -> &str
    {
        Self::NAME
    }

    fn reuse_gradient(&self) -> bool
    {
        false
    }

    fn interpolation(&self, queries: &[OracleQuery]) -> Vec<Constraint>
    {
        let mut cons: Vec<Constraint> = queries.iter().map(|q| {
            q.value.equals(0.)
        }).collect();

        cons.extend(distinct_pairs(queries).map(|(qi, qj)| {
            (&qi.gradient * (&qj.point - &qi.point)).le(0.)
        }));

        if self.d.is_finite() {
            cons.extend(unique_pairs(queries).map(|(qi, qj)| {
                (&qi.point - &qj.point).sqnorm().le(self.d * self.d)
            }));
        }

        cons
    }
}

//

#[cfg(test)]
fn queries(n: usize) -> (crate::basis::Basis, Vec<OracleQuery>)
{
    use crate::{Point, Expression};

    let b = crate::basis::Basis::new();
    let qs = (0.. n).map(|_| OracleQuery {
        point: Point::leaf(&b),
        gradient: Point::leaf(&b),
        value: Expression::leaf(&b),
    }).collect();
    (b, qs)
}

#[test]
fn test_convex_counts()
{
    let (_, qs) = queries(3);

    assert_eq!(Convex::new().interpolation(&qs).len(), 6);
    assert_eq!(StronglyConvex::new(0.5).unwrap().interpolation(&qs).len(), 6);
    assert_eq!(ConvexLipschitz::new(1.).unwrap().interpolation(&qs).len(), 3 + 6);
    assert_eq!(ConvexIndicator::new(f64::INFINITY).unwrap().interpolation(&qs).len(), 3 + 6);
    assert_eq!(ConvexIndicator::new(2.).unwrap().interpolation(&qs).len(), 3 + 6 + 3);
}

#[test]
fn test_convex_inequality_terms()
{
    use crate::expression::Atom;
    use crate::constraint::ConstraintKind;

    let (_, qs) = queries(2);
    let cons = Convex::new().interpolation(&qs);

    // f1 - f0 + <g1, x0 - x1> <= 0
    let c = &cons[0];
    assert_eq!(c.kind(), ConstraintKind::Inequality);
    let d = c.expression().decomposition();
    let f0 = qs[0].value.leaf_id().unwrap();
    let f1 = qs[1].value.leaf_id().unwrap();
    let x0 = qs[0].point.leaf_id().unwrap();
    let x1 = qs[1].point.leaf_id().unwrap();
    let g1 = qs[1].gradient.leaf_id().unwrap();
    assert_eq!(d[&Atom::Value(f0)], -1.);
    assert_eq!(d[&Atom::Value(f1)], 1.);
    assert_eq!(d[&Atom::inner(g1, x0)], 1.);
    assert_eq!(d[&Atom::inner(g1, x1)], -1.);
    assert_eq!(d.len(), 4);
}

#[test]
fn test_smooth_strongly_convex_params()
{
    assert!(SmoothStronglyConvex::new(0., 1.).is_ok());
    assert!(SmoothStronglyConvex::new(1., 1.).is_err());
    assert!(SmoothStronglyConvex::new(0.1, f64::INFINITY).is_err());
    assert!(SmoothStronglyConvex::new(-0.1, 1.).is_err());
    assert!(Smooth::new(f64::NAN).is_err());
    assert!(ConvexIndicator::new(-1.).is_err());
}
