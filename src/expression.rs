use std::collections::BTreeMap;
use core::ops::{Add, Sub, Neg, Mul, Div};
use crate::basis::{Basis, ExprId, PointId};
use crate::constraint::{Constraint, ConstraintKind};
use crate::gram::Valuation;
use crate::PepError;

//

/// Atom of an [`Expression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atom
{
    /// The constant 1.
    Constant,
    /// A leaf function value.
    Value(ExprId),
    /// The inner product of two leaf points, with the smaller index first.
    Inner(PointId, PointId),
}

impl Atom
{
    /// Inner product atom of two leaf points.
    ///
    /// `Atom::inner(a, b)` and `Atom::inner(b, a)` are the same atom.
    pub fn inner(a: PointId, b: PointId) -> Self
    {
        if a <= b {
            Atom::Inner(a, b)
        }
        else {
            Atom::Inner(b, a)
        }
    }
}

//

/// Expression
///
/// A scalar which is a linear combination of leaf function values,
/// inner products of leaf points and the constant.
#[derive(Debug, Clone, Default)]
pub struct Expression
{
    leaf: Option<ExprId>,
    terms: BTreeMap<Atom, f64>,
}

impl Expression
{
    /// Creates a new leaf expression, taking a fresh index from `basis`.
    pub fn leaf(basis: &Basis) -> Self
    {
        let id = basis.new_expr_id();
        let mut terms = BTreeMap::new();
        terms.insert(Atom::Value(id), 1.);

        Expression {
            leaf: Some(id),
            terms,
        }
    }

    /// The zero expression.
    pub fn zero() -> Self
    {
        Self::default()
    }

    /// A constant expression.
    pub fn constant(c: f64) -> Self
    {
        let mut terms = BTreeMap::new();
        terms.insert(Atom::Constant, c);
        Self::from_terms(terms)
    }

    pub(crate) fn from_terms(mut terms: BTreeMap<Atom, f64>) -> Self
    {
        terms.retain(|_, c| *c != 0.);

        Expression {
            leaf: None,
            terms,
        }
    }

    /// Returns the leaf index if this is a leaf expression.
    pub fn leaf_id(&self) -> Option<ExprId>
    {
        self.leaf
    }

    pub fn is_leaf(&self) -> bool
    {
        self.leaf.is_some()
    }

    /// Linear combination of atoms which this expression stands for.
    pub fn decomposition(&self) -> &BTreeMap<Atom, f64>
    {
        &self.terms
    }

    /// Checks if there is no atom other than the constant.
    pub fn is_constant(&self) -> bool
    {
        self.terms.keys().all(|a| *a == Atom::Constant)
    }

    /// Coefficient of the constant atom.
    pub fn constant_value(&self) -> f64
    {
        self.terms.get(&Atom::Constant).copied().unwrap_or(0.)
    }

    fn combine(&self, alpha: f64, other: &Expression, beta: f64) -> Expression
    {
        let mut terms = BTreeMap::new();
        for (a, c) in self.terms.iter() {
            *terms.entry(*a).or_insert(0.) += alpha * c;
        }
        for (a, c) in other.terms.iter() {
            *terms.entry(*a).or_insert(0.) += beta * c;
        }
        Self::from_terms(terms)
    }

    fn scaled(&self, alpha: f64) -> Expression
    {
        self.combine(alpha, &Expression::zero(), 0.)
    }

    /// Product of two expressions.
    ///
    /// Returns `Err` with [`PepError::NonLinearProduct`] unless at least one of them is constant.
    pub fn try_mul(&self, other: &Expression) -> Result<Expression, PepError>
    {
        if self.is_constant() {
            Ok(other.scaled(self.constant_value()))
        }
        else if other.is_constant() {
            Ok(self.scaled(other.constant_value()))
        }
        else {
            Err(PepError::NonLinearProduct)
        }
    }

    /// Power with a nonnegative integer exponent.
    ///
    /// Returns `Err` with [`PepError::NonConstantPower`] if `exp >= 2` and the expression is not constant.
    pub fn powi(&self, exp: u32) -> Result<Expression, PepError>
    {
        match exp {
            0 => Ok(Expression::constant(1.)),
            1 => Ok(self.clone()),
            _ => {
                if self.is_constant() {
                    Ok(Expression::constant(self.constant_value().powi(exp as i32)))
                }
                else {
                    Err(PepError::NonConstantPower)
                }
            },
        }
    }

    /// Constraint `self <= rhs`, normalized as `self - rhs <= 0`.
    pub fn le<E: Into<Expression>>(&self, rhs: E) -> Constraint
    {
        let rhs: Expression = rhs.into();
        Constraint::new(self - rhs, ConstraintKind::Inequality)
    }

    /// Constraint `self >= rhs`, normalized as `rhs - self <= 0`.
    pub fn ge<E: Into<Expression>>(&self, rhs: E) -> Constraint
    {
        let rhs: Expression = rhs.into();
        Constraint::new(rhs - self, ConstraintKind::Inequality)
    }

    /// Constraint `self == rhs`, normalized as `self - rhs == 0`.
    pub fn equals<E: Into<Expression>>(&self, rhs: E) -> Constraint
    {
        let rhs: Expression = rhs.into();
        Constraint::new(self - rhs, ConstraintKind::Equality)
    }

    /// Value of this expression in a solved problem.
    ///
    /// Returns `None` if any leaf has no value in `valuation`.
    pub fn eval(&self, valuation: &Valuation) -> Option<f64>
    {
        let mut sum = 0.;
        for (a, c) in self.terms.iter() {
            let v = match a {
                Atom::Constant => 1.,
                Atom::Value(e) => valuation.value(*e)?,
                Atom::Inner(i, j) => {
                    let (pi, pj) = (valuation.point(*i)?, valuation.point(*j)?);
                    pi.iter().zip(pj).map(|(u, v)| u * v).sum()
                },
            };
            sum += c * v;
        }
        Some(sum)
    }
}

impl From<f64> for Expression
{
    fn from(c: f64) -> Self
    {
        Expression::constant(c)
    }
}

impl From<&Expression> for Expression
{
    fn from(e: &Expression) -> Self
    {
        e.clone()
    }
}

//

macro_rules! impl_expr_binop {
    ($trait:ident, $method:ident, $beta:expr) => {
        impl $trait<&Expression> for &Expression
        {
            type Output = Expression;
            fn $method(self, rhs: &Expression) -> Expression
            {
                self.combine(1., rhs, $beta)
            }
        }

        impl $trait<Expression> for &Expression
        {
            type Output = Expression;
            fn $method(self, rhs: Expression) -> Expression
            {
                self.combine(1., &rhs, $beta)
            }
        }

        impl $trait<&Expression> for Expression
        {
            type Output = Expression;
            fn $method(self, rhs: &Expression) -> Expression
            {
                self.combine(1., rhs, $beta)
            }
        }

        impl $trait<Expression> for Expression
        {
            type Output = Expression;
            fn $method(self, rhs: Expression) -> Expression
            {
                self.combine(1., &rhs, $beta)
            }
        }

        impl $trait<f64> for &Expression
        {
            type Output = Expression;
            fn $method(self, rhs: f64) -> Expression
            {
                self.combine(1., &Expression::constant(rhs), $beta)
            }
        }

        impl $trait<f64> for Expression
        {
            type Output = Expression;
            fn $method(self, rhs: f64) -> Expression
            {
                self.combine(1., &Expression::constant(rhs), $beta)
            }
        }

        impl $trait<&Expression> for f64
        {
            type Output = Expression;
            fn $method(self, rhs: &Expression) -> Expression
            {
                Expression::constant(self).combine(1., rhs, $beta)
            }
        }

        impl $trait<Expression> for f64
        {
            type Output = Expression;
            fn $method(self, rhs: Expression) -> Expression
            {
                Expression::constant(self).combine(1., &rhs, $beta)
            }
        }
    };
}

impl_expr_binop!(Add, add, 1.);
impl_expr_binop!(Sub, sub, -1.);

impl Neg for &Expression
{
    type Output = Expression;
    fn neg(self) -> Expression
    {
        self.scaled(-1.)
    }
}

impl Neg for Expression
{
    type Output = Expression;
    fn neg(self) -> Expression
    {
        self.scaled(-1.)
    }
}

impl Mul<f64> for &Expression
{
    type Output = Expression;
    fn mul(self, rhs: f64) -> Expression
    {
        self.scaled(rhs)
    }
}

impl Mul<f64> for Expression
{
    type Output = Expression;
    fn mul(self, rhs: f64) -> Expression
    {
        self.scaled(rhs)
    }
}

impl Mul<&Expression> for f64
{
    type Output = Expression;
    fn mul(self, rhs: &Expression) -> Expression
    {
        rhs.scaled(self)
    }
}

impl Mul<Expression> for f64
{
    type Output = Expression;
    fn mul(self, rhs: Expression) -> Expression
    {
        rhs.scaled(self)
    }
}

impl Div<f64> for &Expression
{
    type Output = Expression;
    fn div(self, rhs: f64) -> Expression
    {
        self.scaled(rhs.recip())
    }
}

impl Div<f64> for Expression
{
    type Output = Expression;
    fn div(self, rhs: f64) -> Expression
    {
        self.scaled(rhs.recip())
    }
}

//

#[test]
fn test_expression_leaf()
{
    let b = Basis::new();
    let f = Expression::leaf(&b);
    let id = f.leaf_id().unwrap();

    assert!(f.is_leaf());
    assert_eq!(f.decomposition().len(), 1);
    assert_eq!(f.decomposition()[&Atom::Value(id)], 1.);
    assert!(!f.is_constant());
}

#[test]
fn test_expression_arithmetic()
{
    let b = Basis::new();
    let f0 = Expression::leaf(&b);
    let f1 = Expression::leaf(&b);
    let (i0, i1) = (f0.leaf_id().unwrap(), f1.leaf_id().unwrap());

    let e = 2. * &f0 - &f1 / 4. + 3.;
    assert_eq!(e.decomposition()[&Atom::Value(i0)], 2.);
    assert_eq!(e.decomposition()[&Atom::Value(i1)], -0.25);
    assert_eq!(e.constant_value(), 3.);

    let z = &e - &e;
    assert!(z.decomposition().is_empty());
    assert!(z.is_constant());

    let n = -(1. - &f0);
    assert_eq!(n.decomposition()[&Atom::Value(i0)], 1.);
    assert_eq!(n.constant_value(), -1.);
}

#[test]
fn test_expression_products()
{
    let b = Basis::new();
    let f = Expression::leaf(&b);
    let g = Expression::leaf(&b);
    let c = Expression::constant(2.);

    let fc = f.try_mul(&c).unwrap();
    assert_eq!(fc.decomposition()[&Atom::Value(f.leaf_id().unwrap())], 2.);
    let cf = c.try_mul(&f).unwrap();
    assert_eq!(cf.decomposition(), fc.decomposition());

    assert_eq!(f.try_mul(&g).unwrap_err(), PepError::NonLinearProduct);

    assert_eq!(c.powi(3).unwrap().constant_value(), 8.);
    assert_eq!(f.powi(0).unwrap().constant_value(), 1.);
    assert_eq!(f.powi(1).unwrap().decomposition(), f.decomposition());
    assert_eq!(f.powi(2).unwrap_err(), PepError::NonConstantPower);
}

#[test]
fn test_expression_comparisons()
{
    let b = Basis::new();
    let f = Expression::leaf(&b);
    let g = Expression::leaf(&b);

    let c = f.le(&g);
    assert_eq!(c.kind(), ConstraintKind::Inequality);
    assert_eq!(c.expression().decomposition(), (&f - &g).decomposition());

    let c = f.ge(1.);
    assert_eq!(c.expression().decomposition(), (1. - &f).decomposition());

    let c = f.equals(g.clone());
    assert_eq!(c.kind(), ConstraintKind::Equality);
    assert_eq!(c.expression().decomposition(), (&f - &g).decomposition());
}
