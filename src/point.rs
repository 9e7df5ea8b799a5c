use std::collections::BTreeMap;
use core::ops::{Add, Sub, Neg, Mul, Div};
use crate::basis::{Basis, PointId};
use crate::expression::{Atom, Expression};
use crate::gram::Valuation;

//

/// Point
///
/// An element of an abstract inner-product space of unknown dimension.
/// A leaf point is an independent unknown; any other point is a linear combination of leaf points,
/// kept symbolically as a mapping from leaf [`PointId`] to coefficient.
#[derive(Debug, Clone, Default)]
pub struct Point
{
    leaf: Option<PointId>,
    terms: BTreeMap<PointId, f64>,
}

impl Point
{
    /// Creates a new leaf point, taking a fresh index from `basis`.
    pub fn leaf(basis: &Basis) -> Self
    {
        let id = basis.new_point_id();
        let mut terms = BTreeMap::new();
        terms.insert(id, 1.);

        Point {
            leaf: Some(id),
            terms,
        }
    }

    /// The zero point.
    pub fn zero() -> Self
    {
        Self::default()
    }

    /// Returns the leaf index if this is a leaf point.
    pub fn leaf_id(&self) -> Option<PointId>
    {
        self.leaf
    }

    pub fn is_leaf(&self) -> bool
    {
        self.leaf.is_some()
    }

    pub fn is_zero(&self) -> bool
    {
        self.terms.is_empty()
    }

    /// Linear combination of leaf points which this point stands for.
    pub fn decomposition(&self) -> &BTreeMap<PointId, f64>
    {
        &self.terms
    }

    /// Checks if both points have the same decomposition.
    ///
    /// This is the notion of identity used to detect repeated oracle queries.
    pub fn same_as(&self, other: &Point) -> bool
    {
        self.terms == other.terms
    }

    fn combine(&self, alpha: f64, other: &Point, beta: f64) -> Point
    {
        let mut terms = BTreeMap::new();
        for (id, c) in self.terms.iter() {
            *terms.entry(*id).or_insert(0.) += alpha * c;
        }
        for (id, c) in other.terms.iter() {
            *terms.entry(*id).or_insert(0.) += beta * c;
        }
        terms.retain(|_, c| *c != 0.);

        Point {
            leaf: None,
            terms,
        }
    }

    fn scaled(&self, alpha: f64) -> Point
    {
        self.combine(alpha, &Point::zero(), 0.)
    }

    /// Inner product with another point.
    pub fn dot(&self, other: &Point) -> Expression
    {
        let mut terms = BTreeMap::new();
        for (i, ci) in self.terms.iter() {
            for (j, cj) in other.terms.iter() {
                *terms.entry(Atom::inner(*i, *j)).or_insert(0.) += ci * cj;
            }
        }

        Expression::from_terms(terms)
    }

    /// Squared norm, the inner product with itself.
    pub fn sqnorm(&self) -> Expression
    {
        self.dot(self)
    }

    /// Concrete coordinates of this point in a solved problem.
    ///
    /// Returns `None` if any leaf point has no value in `valuation`.
    pub fn eval(&self, valuation: &Valuation) -> Option<Vec<f64>>
    {
        let mut v = vec![0.; valuation.dimension()];
        for (id, c) in self.terms.iter() {
            let leaf = valuation.point(*id)?;
            for (e, l) in v.iter_mut().zip(leaf) {
                *e += c * l;
            }
        }
        Some(v)
    }
}

//

macro_rules! impl_point_binop {
    ($trait:ident, $method:ident, $beta:expr) => {
        impl $trait<&Point> for &Point
        {
            type Output = Point;
            fn $method(self, rhs: &Point) -> Point
            {
                self.combine(1., rhs, $beta)
            }
        }

        impl $trait<Point> for &Point
        {
            type Output = Point;
            fn $method(self, rhs: Point) -> Point
            {
                self.combine(1., &rhs, $beta)
            }
        }

        impl $trait<&Point> for Point
        {
            type Output = Point;
            fn $method(self, rhs: &Point) -> Point
            {
                self.combine(1., rhs, $beta)
            }
        }

        impl $trait<Point> for Point
        {
            type Output = Point;
            fn $method(self, rhs: Point) -> Point
            {
                self.combine(1., &rhs, $beta)
            }
        }
    };
}

impl_point_binop!(Add, add, 1.);
impl_point_binop!(Sub, sub, -1.);

impl Neg for &Point
{
    type Output = Point;
    fn neg(self) -> Point
    {
        self.scaled(-1.)
    }
}

impl Neg for Point
{
    type Output = Point;
    fn neg(self) -> Point
    {
        self.scaled(-1.)
    }
}

impl Mul<f64> for &Point
{
    type Output = Point;
    fn mul(self, rhs: f64) -> Point
    {
        self.scaled(rhs)
    }
}

impl Mul<f64> for Point
{
    type Output = Point;
    fn mul(self, rhs: f64) -> Point
    {
        self.scaled(rhs)
    }
}

impl Mul<&Point> for f64
{
    type Output = Point;
    fn mul(self, rhs: &Point) -> Point
    {
        rhs.scaled(self)
    }
}

impl Mul<Point> for f64
{
    type Output = Point;
    fn mul(self, rhs: Point) -> Point
    {
        rhs.scaled(self)
    }
}

impl Div<f64> for &Point
{
    type Output = Point;
    fn div(self, rhs: f64) -> Point
    {
        self.scaled(rhs.recip())
    }
}

impl Div<f64> for Point
{
    type Output = Point;
    fn div(self, rhs: f64) -> Point
    {
        self.scaled(rhs.recip())
    }
}

// inner product

impl Mul<&Point> for &Point
{
    type Output = Expression;
    fn mul(self, rhs: &Point) -> Expression
    {
        self.dot(rhs)
    }
}

impl Mul<Point> for &Point
{
    type Output = Expression;
    fn mul(self, rhs: Point) -> Expression
    {
        self.dot(&rhs)
    }
}

impl Mul<&Point> for Point
{
    type Output = Expression;
    fn mul(self, rhs: &Point) -> Expression
    {
        self.dot(rhs)
    }
}

impl Mul<Point> for Point
{
    type Output = Expression;
    fn mul(self, rhs: Point) -> Expression
    {
        self.dot(&rhs)
    }
}

//

#[test]
fn test_point_leaf_decomposition()
{
    let b = Basis::new();
    let x = Point::leaf(&b);
    let id = x.leaf_id().unwrap();

    assert!(x.is_leaf());
    assert_eq!(x.decomposition().len(), 1);
    assert_eq!(x.decomposition()[&id], 1.);

    // identity expansion gives back the same point
    let mut y = Point::zero();
    for (i, c) in x.decomposition().iter() {
        assert_eq!(*i, id);
        y = y + &x * *c;
    }
    assert!(y.same_as(&x));
    assert!(!y.is_leaf());
}

#[test]
fn test_point_arithmetic()
{
    let b = Basis::new();
    let x = Point::leaf(&b);
    let g = Point::leaf(&b);
    let (ix, ig) = (x.leaf_id().unwrap(), g.leaf_id().unwrap());

    let y = &x - 0.5 * &g;
    assert_eq!(y.decomposition()[&ix], 1.);
    assert_eq!(y.decomposition()[&ig], -0.5);

    let z = (&y + &g * 0.5 - &x) / 2.;
    assert!(z.is_zero());

    let w = -(&x * 3.);
    assert_eq!(w.decomposition()[&ix], -3.);
}

#[test]
fn test_point_inner_product_symmetric()
{
    let b = Basis::new();
    let a = Point::leaf(&b);
    let c = Point::leaf(&b);

    let ac = &a * &c;
    let ca = &c * &a;
    assert_eq!(ac.decomposition(), ca.decomposition());
    assert_eq!(ac.decomposition().len(), 1);

    let n = (&a + &c).sqnorm();
    let ia = a.leaf_id().unwrap();
    let ic = c.leaf_id().unwrap();
    assert_eq!(n.decomposition()[&Atom::inner(ia, ia)], 1.);
    assert_eq!(n.decomposition()[&Atom::inner(ic, ic)], 1.);
    assert_eq!(n.decomposition()[&Atom::inner(ia, ic)], 2.);
}
