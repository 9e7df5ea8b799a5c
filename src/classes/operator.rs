//! Operator classes
//!
//! The "gradient" of an operator query is the operator output, and its value is unused.

use crate::constraint::Constraint;
use crate::function::OracleQuery;
use crate::PepError;
use super::{FunctionClass, check_param, unique_pairs};

//

/// Maximally monotone operators.
#[derive(Debug, Clone, Default)]
pub struct Monotone;

impl Monotone
{
    pub const NAME: &'static str = "monotone";

    pub fn new() -> Self
    {
        Monotone
    }
}

impl FunctionClass for Monotone
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
        unique_pairs(queries).map(|(qi, qj)| {
            ((&qi.gradient - &qj.gradient) * (&qi.point - &qj.point)).ge(0.)
        }).collect()
    }
}

//

/// Strongly monotone operators with parameter `mu`.
#[derive(Debug, Clone)]
pub struct StronglyMonotone
{
    mu: f64,
}

impl StronglyMonotone
{
    pub const NAME: &'static str = "strongly_monotone";

    pub fn new(mu: f64) -> Result<Self, PepError>
    {
        let mu = check_param(Self::NAME, "mu", mu, mu >= 0. && mu.is_finite())?;

        Ok(StronglyMonotone {mu})
    }
}

impl FunctionClass for StronglyMonotone
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
        unique_pairs(queries).map(|(qi, qj)| {
            let dx = &qi.point - &qj.point;
            ((&qi.gradient - &qj.gradient) * &dx).ge(self.mu * dx.sqnorm())
        }).collect()
    }
}

//

/// Lipschitz continuous operators with constant `L`.
#[derive(Debug, Clone)]
pub struct LipschitzOperator
{
    l: f64,
}

impl LipschitzOperator
{
    pub const NAME: &'static str = "lipschitz_operator";

    pub fn new(l: f64) -> Result<Self, PepError>
    {
        let l = check_param(Self::NAME, "L", l, l >= 0. && l.is_finite())?;

        Ok(LipschitzOperator {l})
    }
}

impl FunctionClass for LipschitzOperator
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
        unique_pairs(queries).map(|(qi, qj)| {
            let dx = &qi.point - &qj.point;
            (&qi.gradient - &qj.gradient).sqnorm().le(self.l * self.l * dx.sqnorm())
        }).collect()
    }
}

//

/// Cocoercive operators with parameter `beta`.
#[derive(Debug, Clone)]
pub struct Cocoercive
{
    beta: f64,
}

impl Cocoercive
{
    pub const NAME: &'static str = "cocoercive";

    pub fn new(beta: f64) -> Result<Self, PepError>
    {
        let beta = check_param(Self::NAME, "beta", beta, beta > 0. && beta.is_finite())?;

        Ok(Cocoercive {beta})
    }
}

impl FunctionClass for Cocoercive
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
        unique_pairs(queries).map(|(qi, qj)| {
            let dg = &qi.gradient - &qj.gradient;
            (&dg * (&qi.point - &qj.point)).ge(self.beta * dg.sqnorm())
        }).collect()
    }
}

//

#[test]
fn test_operator_counts()
{
    use crate::basis::Basis;
    use crate::{Point, Expression};

    let b = Basis::new();
    let qs: Vec<OracleQuery> = (0.. 4).map(|_| OracleQuery {
        point: Point::leaf(&b),
        gradient: Point::leaf(&b),
        value: Expression::leaf(&b),
    }).collect();

    assert_eq!(Monotone::new().interpolation(&qs).len(), 6);
    assert_eq!(StronglyMonotone::new(1.).unwrap().interpolation(&qs).len(), 6);
    assert_eq!(LipschitzOperator::new(2.).unwrap().interpolation(&qs).len(), 6);
    assert_eq!(Cocoercive::new(0.5).unwrap().interpolation(&qs).len(), 6);

    // value atoms never appear
    for c in Cocoercive::new(0.5).unwrap().interpolation(&qs) {
        assert!(c.expression().decomposition().keys().all(|a| !matches!(a, crate::expression::Atom::Value(_))));
    }
}
