use std::rc::Rc;
use core::cell::{Ref, RefCell};
use core::ops::{Add, Sub, Neg, Mul};
use crate::basis::{Basis, FunctionId};
use crate::classes::FunctionClass;
use crate::constraint::Constraint;
use crate::expression::Expression;
use crate::point::Point;
use crate::PepError;

//

/// Oracle query
///
/// A recorded oracle answer: the (sub)gradient and the value of a function at a point.
#[derive(Debug, Clone)]
pub struct OracleQuery
{
    pub point: Point,
    pub gradient: Point,
    pub value: Expression,
}

#[derive(Debug)]
enum FunctionKind
{
    Leaf(Box<dyn FunctionClass>),
    /// Weighted leaf functions, each appearing once.
    Combination(Vec<(Function, f64)>),
}

#[derive(Debug)]
struct FunctionNode
{
    id: FunctionId,
    name: Option<String>,
    basis: Rc<Basis>,
    kind: FunctionKind,
    reuse_gradient: Option<bool>,
    queries: Vec<OracleQuery>,
    constraints: Vec<Constraint>,
    class_constraints: Vec<Constraint>,
}

//

/// Function
///
/// An unknown function of a declared class, or a linear combination of such functions.
/// This is a shared handle: clones refer to the same function and see the same recorded queries.
#[derive(Debug, Clone)]
pub struct Function(Rc<RefCell<FunctionNode>>);

impl Function
{
    fn from_node(basis: Rc<Basis>, name: Option<String>, kind: FunctionKind) -> Self
    {
        let node = FunctionNode {
            id: basis.new_function_id(),
            name,
            basis,
            kind,
            reuse_gradient: None,
            queries: Vec::new(),
            constraints: Vec::new(),
            class_constraints: Vec::new(),
        };

        Function(Rc::new(RefCell::new(node)))
    }

    pub(crate) fn leaf(basis: Rc<Basis>, class: Box<dyn FunctionClass>, name: Option<String>) -> Self
    {
        Self::from_node(basis, name, FunctionKind::Leaf(class))
    }

    fn combination(terms: Vec<(&Function, f64)>) -> Self
    {
        let mut leaves: Vec<(Function, f64)> = Vec::new();

        let mut push = |f: &Function, w: f64| {
            if let Some(e) = leaves.iter_mut().find(|(l, _)| l.id() == f.id()) {
                e.1 += w;
            }
            else {
                leaves.push((f.clone(), w));
            }
        };

        for (f, w) in terms.iter() {
            match &f.0.borrow().kind {
                FunctionKind::Leaf(_) => push(*f, *w),
                FunctionKind::Combination(ops) => {
                    for (l, lw) in ops.iter() {
                        push(l, w * lw);
                    }
                },
            }
        }
        leaves.retain(|(_, w)| *w != 0.);

        let basis = terms[0].0.basis();
        Self::from_node(basis, None, FunctionKind::Combination(leaves))
    }

    pub fn id(&self) -> FunctionId
    {
        self.0.borrow().id
    }

    pub fn name(&self) -> Option<String>
    {
        self.0.borrow().name.clone()
    }

    pub(crate) fn basis(&self) -> Rc<Basis>
    {
        self.0.borrow().basis.clone()
    }

    pub fn is_leaf(&self) -> bool
    {
        matches!(self.0.borrow().kind, FunctionKind::Leaf(_))
    }

    /// Name of the class of a leaf function, `None` for a combination.
    pub fn class_name(&self) -> Option<String>
    {
        match &self.0.borrow().kind {
            FunctionKind::Leaf(class) => Some(class.name().to_string()),
            FunctionKind::Combination(_) => None,
        }
    }

    /// Weighted leaf functions of a combination; a leaf function is itself with weight 1.
    pub fn decomposition(&self) -> Vec<(Function, f64)>
    {
        match &self.0.borrow().kind {
            FunctionKind::Leaf(_) => vec![(self.clone(), 1.)],
            FunctionKind::Combination(ops) => ops.clone(),
        }
    }

    /// Whether repeated queries at a point return the cached gradient.
    ///
    /// Defaults to the class policy; a combination reuses only if all its leaves do.
    pub fn reuse_gradient(&self) -> bool
    {
        let node = self.0.borrow();

        if let Some(reuse) = node.reuse_gradient {
            return reuse;
        }

        match &node.kind {
            FunctionKind::Leaf(class) => class.reuse_gradient(),
            FunctionKind::Combination(ops) => ops.iter().all(|(f, _)| f.reuse_gradient()),
        }
    }

    /// Overrides the gradient reuse policy.
    pub fn set_reuse_gradient(&self, reuse: bool)
    {
        self.0.borrow_mut().reuse_gradient = Some(reuse);
    }

    fn find_query(&self, point: &Point) -> Option<OracleQuery>
    {
        self.0.borrow().queries.iter().find(|q| q.point.same_as(point)).cloned()
    }

    fn record(&self, point: &Point, gradient: &Point, value: &Expression)
    {
        self.0.borrow_mut().queries.push(OracleQuery {
            point: point.clone(),
            gradient: gradient.clone(),
            value: value.clone(),
        });
    }

    /// Queries the (sub)gradient and the value at `point`.
    ///
    /// A point queried before keeps its value.
    /// Its gradient is also kept if [`Function::reuse_gradient`], otherwise a new subgradient is returned.
    pub fn oracle(&self, point: &Point) -> (Point, Expression)
    {
        let cached = self.find_query(point);

        if let Some(q) = &cached {
            if self.reuse_gradient() {
                return (q.gradient.clone(), q.value.clone());
            }
        }

        let basis = self.basis();
        let (g, f) = match self.decomposition_if_combination() {
            None => {
                let f = match cached {
                    Some(q) => q.value,
                    None => Expression::leaf(&basis),
                };
                (Point::leaf(&basis), f)
            },
            Some(ops) => {
                let mut g = Point::zero();
                let mut f = Expression::zero();
                for (op, w) in ops.iter() {
                    let (gk, fk) = op.oracle(point);
                    g = g + gk * *w;
                    f = f + fk * *w;
                }
                (g, f)
            },
        };

        self.record(point, &g, &f);
        (g, f)
    }

    fn decomposition_if_combination(&self) -> Option<Vec<(Function, f64)>>
    {
        match &self.0.borrow().kind {
            FunctionKind::Leaf(_) => None,
            FunctionKind::Combination(ops) => Some(ops.clone()),
        }
    }

    /// Value at `point`, without a new gradient if the point was queried before.
    pub fn value(&self, point: &Point) -> Expression
    {
        match self.find_query(point) {
            Some(q) => q.value,
            None => self.oracle(point).1,
        }
    }

    /// (Sub)gradient at `point`.
    pub fn gradient(&self, point: &Point) -> Point
    {
        self.oracle(point).0
    }

    /// Records an externally built oracle answer.
    ///
    /// On a combination, every leaf but the last is queried at `point`,
    /// and the last one receives the remainder so that the weighted sum reproduces `gradient` and `value`.
    pub fn add_point(&self, point: &Point, gradient: Point, value: Expression)
    {
        if let Some(ops) = self.decomposition_if_combination() {
            if let Some(((last, w_last), init)) = ops.split_last() {
                let mut g_rest = gradient.clone();
                let mut f_rest = value.clone();
                for (op, w) in init.iter() {
                    let (gk, fk) = op.oracle(point);
                    g_rest = g_rest - gk * *w;
                    f_rest = f_rest - fk * *w;
                }
                last.add_point(point, g_rest / *w_last, f_rest / *w_last);
            }
        }

        self.record(point, &gradient, &value);
    }

    /// A new point where the gradient is zero.
    pub fn stationary_point(&self) -> Point
    {
        let basis = self.basis();
        let x = Point::leaf(&basis);
        let f = Expression::leaf(&basis);

        self.add_point(&x, Point::zero(), f);
        x
    }

    /// Same as [`Function::stationary_point`]: a minimizer of a convex function.
    pub fn optimal_point(&self) -> Point
    {
        self.stationary_point()
    }

    /// Adds a side condition on this function.
    ///
    /// On a combination it is stored with the first leaf function.
    /// Returns `Err` with [`PepError::EmptyCombination`] if the combination has no leaf left.
    pub fn add_constraint(&self, constraint: Constraint) -> Result<(), PepError>
    {
        match self.decomposition_if_combination() {
            Some(ops) => match ops.first() {
                Some((op, _)) => op.add_constraint(constraint),
                None => Err(PepError::EmptyCombination),
            },
            None => {
                self.0.borrow_mut().constraints.push(constraint);
                Ok(())
            },
        }
    }

    /// Regenerates the interpolation constraints over all recorded queries.
    ///
    /// Constraints generated before are discarded.
    pub fn add_class_constraints(&self)
    {
        if let Some(ops) = self.decomposition_if_combination() {
            for (op, _) in ops.iter() {
                op.add_class_constraints();
            }
            return;
        }

        let mut node = self.0.borrow_mut();
        let cons = match &node.kind {
            FunctionKind::Leaf(class) => class.interpolation(&node.queries),
            FunctionKind::Combination(_) => Vec::new(),
        };
        node.class_constraints = cons;
    }

    /// Recorded oracle queries.
    pub fn queries(&self) -> Ref<'_, [OracleQuery]>
    {
        Ref::map(self.0.borrow(), |n| n.queries.as_slice())
    }

    /// Side conditions added by [`Function::add_constraint`], with duals after a solve.
    pub fn constraints(&self) -> Ref<'_, [Constraint]>
    {
        Ref::map(self.0.borrow(), |n| n.constraints.as_slice())
    }

    /// Interpolation constraints of the last solve, with their duals.
    pub fn class_constraints(&self) -> Ref<'_, [Constraint]>
    {
        Ref::map(self.0.borrow(), |n| n.class_constraints.as_slice())
    }

    pub(crate) fn set_duals(&self, duals: &mut impl Iterator<Item=Option<f64>>)
    {
        let mut node = self.0.borrow_mut();
        let node = &mut *node;
        for c in node.constraints.iter_mut().chain(node.class_constraints.iter_mut()) {
            c.set_dual(duals.next().flatten());
        }
    }
}

//

macro_rules! impl_function_binop {
    ($trait:ident, $method:ident, $beta:expr) => {
        impl $trait<&Function> for &Function
        {
            type Output = Function;
            fn $method(self, rhs: &Function) -> Function
            {
                Function::combination(vec![(self, 1.), (rhs, $beta)])
            }
        }

        impl $trait<Function> for &Function
        {
            type Output = Function;
            fn $method(self, rhs: Function) -> Function
            {
                Function::combination(vec![(self, 1.), (&rhs, $beta)])
            }
        }

        impl $trait<&Function> for Function
        {
            type Output = Function;
            fn $method(self, rhs: &Function) -> Function
            {
                Function::combination(vec![(&self, 1.), (rhs, $beta)])
            }
        }

        impl $trait<Function> for Function
        {
            type Output = Function;
            fn $method(self, rhs: Function) -> Function
            {
                Function::combination(vec![(&self, 1.), (&rhs, $beta)])
            }
        }
    };
}

impl_function_binop!(Add, add, 1.);
impl_function_binop!(Sub, sub, -1.);

impl Neg for &Function
{
    type Output = Function;
    fn neg(self) -> Function
    {
        Function::combination(vec![(self, -1.)])
    }
}

impl Neg for Function
{
    type Output = Function;
    fn neg(self) -> Function
    {
        -&self
    }
}

impl Mul<f64> for &Function
{
    type Output = Function;
    fn mul(self, rhs: f64) -> Function
    {
        Function::combination(vec![(self, rhs)])
    }
}

impl Mul<f64> for Function
{
    type Output = Function;
    fn mul(self, rhs: f64) -> Function
    {
        &self * rhs
    }
}

impl Mul<&Function> for f64
{
    type Output = Function;
    fn mul(self, rhs: &Function) -> Function
    {
        rhs * self
    }
}

impl Mul<Function> for f64
{
    type Output = Function;
    fn mul(self, rhs: Function) -> Function
    {
        &rhs * self
    }
}

//

#[cfg(test)]
fn leaf_fn(basis: &Rc<Basis>, class: Box<dyn FunctionClass>) -> Function
{
    Function::leaf(basis.clone(), class, None)
}

#[test]
fn test_oracle_reuse()
{
    use crate::classes::{Convex, SmoothStronglyConvex};

    let b = Rc::new(Basis::new());
    let smooth = leaf_fn(&b, Box::new(SmoothStronglyConvex::new(0.1, 1.).unwrap()));
    let nonsmooth = leaf_fn(&b, Box::new(Convex::new()));
    let x = Point::leaf(&b);

    let (g0, f0) = smooth.oracle(&x);
    let (g1, f1) = smooth.oracle(&(&x * 1.));
    assert!(g0.same_as(&g1));
    assert_eq!(f0.decomposition(), f1.decomposition());
    assert_eq!(smooth.queries().len(), 1);

    let (g0, f0) = nonsmooth.oracle(&x);
    let (g1, f1) = nonsmooth.oracle(&x);
    assert!(!g0.same_as(&g1));
    assert_eq!(f0.decomposition(), f1.decomposition());
    assert_eq!(nonsmooth.queries().len(), 2);

    // value does not create another subgradient
    let f2 = nonsmooth.value(&x);
    assert_eq!(f2.decomposition(), f0.decomposition());
    assert_eq!(nonsmooth.queries().len(), 2);

    nonsmooth.set_reuse_gradient(true);
    let (g2, _) = nonsmooth.oracle(&x);
    assert!(g2.same_as(&g0));
}

#[test]
fn test_combination_oracle()
{
    use crate::classes::Convex;

    let b = Rc::new(Basis::new());
    let f1 = leaf_fn(&b, Box::new(Convex::new()));
    let f2 = leaf_fn(&b, Box::new(Convex::new()));
    let h = &f1 + 2. * &f2;
    let hh = &h - &f1;

    assert!(!h.is_leaf());
    assert_eq!(hh.decomposition().len(), 1);
    assert_eq!(hh.decomposition()[0].1, 2.);

    let x = Point::leaf(&b);
    let (g, f) = h.oracle(&x);
    let (g1, v1) = (f1.queries()[0].gradient.clone(), f1.queries()[0].value.clone());
    let (g2, v2) = (f2.queries()[0].gradient.clone(), f2.queries()[0].value.clone());
    assert!(g.same_as(&(&g1 + &g2 * 2.)));
    assert_eq!(f.decomposition(), (&v1 + &v2 * 2.).decomposition());
}

#[test]
fn test_combination_add_point_splits()
{
    use crate::classes::Convex;

    let b = Rc::new(Basis::new());
    let f1 = leaf_fn(&b, Box::new(Convex::new()));
    let f2 = leaf_fn(&b, Box::new(Convex::new()));
    let h = &f1 * 0.5 + &f2 * 4.;

    let xs = h.stationary_point();

    let q1 = f1.queries()[0].clone();
    let q2 = f2.queries()[0].clone();
    assert!(q1.point.same_as(&xs));
    assert!(q2.point.same_as(&xs));
    let gsum = &q1.gradient * 0.5 + &q2.gradient * 4.;
    assert!(gsum.is_zero());

    let fs = h.value(&xs);
    let fsum = &q1.value * 0.5 + &q2.value * 4.;
    assert_eq!((&fs - &fsum).decomposition().len(), 0);
}

#[test]
fn test_class_constraints_regenerated()
{
    use crate::classes::Convex;

    let b = Rc::new(Basis::new());
    let f = leaf_fn(&b, Box::new(Convex::new()));
    let x0 = Point::leaf(&b);
    let x1 = Point::leaf(&b);
    f.oracle(&x0);
    f.oracle(&x1);

    f.add_class_constraints();
    assert_eq!(f.class_constraints().len(), 2);
    f.add_class_constraints();
    assert_eq!(f.class_constraints().len(), 2);

    let h = &f * 2.;
    h.add_constraint(f.value(&x0).le(0.)).unwrap();
    assert_eq!(f.constraints().len(), 1);
    assert_eq!(h.constraints().len(), 0);
}

#[test]
fn test_constraint_on_cancelled_combination()
{
    use crate::classes::Convex;

    let b = Rc::new(Basis::new());
    let f = leaf_fn(&b, Box::new(Convex::new()));
    let x0 = Point::leaf(&b);

    let zero = &f - &f;
    assert!(zero.decomposition().is_empty());
    assert_eq!(zero.add_constraint(f.value(&x0).le(0.)).unwrap_err(), PepError::EmptyCombination);
    assert_eq!(f.constraints().len(), 0);
}
