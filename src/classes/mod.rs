//! Function classes
//!
//! A class characterizes a set of functions (or operators) through interpolation conditions:
//! constraints over recorded oracle queries which are necessary and sufficient
//! for some member of the class to produce exactly those answers.

use std::collections::BTreeMap;
use crate::constraint::Constraint;
use crate::function::OracleQuery;
use crate::PepError;

mod convex;
mod operator;

pub use convex::*;
pub use operator::*;

//

/// Function class trait
pub trait FunctionClass: core::fmt::Debug
{
    /// Name of the class, the key in [`ClassRegistry`].
    fn name(&self) -> &str;

    /// Whether a function of this class returns a single gradient per point.
    ///
    /// `false` for classes with nonsmooth members, whose repeated queries at a point
    /// may yield different subgradients.
    fn reuse_gradient(&self) -> bool;

    /// Generates the interpolation constraints over all recorded queries.
    fn interpolation(&self, queries: &[OracleQuery]) -> Vec<Constraint>;
}

/// Iterates over ordered pairs of distinct queries.
pub(crate) fn distinct_pairs(queries: &[OracleQuery]) -> impl Iterator<Item=(&OracleQuery, &OracleQuery)>
{
    queries.iter().enumerate().flat_map(move |(i, qi)| {
        queries.iter().enumerate()
               .filter(move |(j, _)| *j != i)
               .map(move |(_, qj)| (qi, qj))
    })
}

/// Iterates over unordered pairs of distinct queries.
pub(crate) fn unique_pairs(queries: &[OracleQuery]) -> impl Iterator<Item=(&OracleQuery, &OracleQuery)>
{
    queries.iter().enumerate().flat_map(move |(i, qi)| {
        queries[i + 1..].iter().map(move |qj| (qi, qj))
    })
}

pub(crate) fn check_param(class: &str, name: &str, value: f64, valid: bool) -> Result<f64, PepError>
{
    if valid && !value.is_nan() {
        Ok(value)
    }
    else {
        Err(PepError::InvalidParameter {
            class: class.to_string(),
            name: name.to_string(),
            value,
        })
    }
}

//

/// Named parameters of a function class.
#[derive(Debug, Clone, Default)]
pub struct ClassParams
{
    values: BTreeMap<String, f64>,
}

impl ClassParams
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: f64)
    {
        self.values.insert(name.to_string(), value);
    }

    /// Builder pattern of [`ClassParams::set`].
    pub fn with(mut self, name: &str, value: f64) -> Self
    {
        self.set(name, value);
        self
    }

    /// Gets a required parameter.
    ///
    /// Returns `Err` with [`PepError::MissingParameter`] if not given.
    pub fn get(&self, class: &str, name: &str) -> Result<f64, PepError>
    {
        self.values.get(name).copied().ok_or_else(|| PepError::MissingParameter {
            class: class.to_string(),
            name: name.to_string(),
        })
    }

    /// Gets an optional parameter.
    pub fn get_or(&self, name: &str, default: f64) -> f64
    {
        self.values.get(name).copied().unwrap_or(default)
    }
}

//

/// Constructor of a function class from its parameters.
pub type ClassBuilder = fn(&ClassParams) -> Result<Box<dyn FunctionClass>, PepError>;

/// Registry of function classes by name.
#[derive(Clone, Default)]
pub struct ClassRegistry
{
    builders: BTreeMap<String, ClassBuilder>,
}

impl core::fmt::Debug for ClassRegistry
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result
    {
        f.debug_set().entries(self.builders.keys()).finish()
    }
}

impl ClassRegistry
{
    /// Creates an empty registry.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Creates a registry of every class provided by this crate.
    pub fn builtin() -> Self
    {
        let mut reg = Self::new();

        reg.register(Convex::NAME, |_| Ok(Box::new(Convex::new())));
        reg.register(StronglyConvex::NAME, |p| {
            Ok(Box::new(StronglyConvex::new(p.get(StronglyConvex::NAME, "mu")?)?))
        });
        reg.register(SmoothStronglyConvex::NAME, |p| {
            let name = SmoothStronglyConvex::NAME;
            Ok(Box::new(SmoothStronglyConvex::new(p.get(name, "mu")?, p.get(name, "L")?)?))
        });
        reg.register("smooth_convex", |p| {
            Ok(Box::new(SmoothStronglyConvex::new(0., p.get("smooth_convex", "L")?)?))
        });
        reg.register(Smooth::NAME, |p| {
            Ok(Box::new(Smooth::new(p.get(Smooth::NAME, "L")?)?))
        });
        reg.register(ConvexLipschitz::NAME, |p| {
            Ok(Box::new(ConvexLipschitz::new(p.get(ConvexLipschitz::NAME, "M")?)?))
        });
        reg.register(ConvexIndicator::NAME, |p| {
            Ok(Box::new(ConvexIndicator::new(p.get_or("D", f64::INFINITY))?))
        });
        reg.register(Monotone::NAME, |_| Ok(Box::new(Monotone::new())));
        reg.register(StronglyMonotone::NAME, |p| {
            Ok(Box::new(StronglyMonotone::new(p.get(StronglyMonotone::NAME, "mu")?)?))
        });
        reg.register(LipschitzOperator::NAME, |p| {
            Ok(Box::new(LipschitzOperator::new(p.get(LipschitzOperator::NAME, "L")?)?))
        });
        reg.register(Cocoercive::NAME, |p| {
            Ok(Box::new(Cocoercive::new(p.get(Cocoercive::NAME, "beta")?)?))
        });

        reg
    }

    /// Registers (or replaces) a class constructor under `name`.
    pub fn register(&mut self, name: &str, builder: ClassBuilder)
    {
        self.builders.insert(name.to_string(), builder);
    }

    /// Names of the registered classes.
    pub fn names(&self) -> impl Iterator<Item=&str>
    {
        self.builders.keys().map(|k| k.as_str())
    }

    /// Builds a class by name.
    ///
    /// Returns `Err` with [`PepError::UnknownFunctionClass`] if `name` is not registered,
    /// or the error of the constructor.
    pub fn build(&self, name: &str, params: &ClassParams) -> Result<Box<dyn FunctionClass>, PepError>
    {
        let builder = self.builders.get(name)
                      .ok_or_else(|| PepError::UnknownFunctionClass(name.to_string()))?;

        builder(params)
    }
}

//

#[test]
fn test_registry_build()
{
    let reg = ClassRegistry::builtin();

    let c = reg.build("smooth_strongly_convex", &ClassParams::new().with("mu", 0.1).with("L", 1.)).unwrap();
    assert_eq!(c.name(), "smooth_strongly_convex");
    assert!(c.reuse_gradient());

    let c = reg.build("convex", &ClassParams::new()).unwrap();
    assert!(!c.reuse_gradient());

    let e = reg.build("smooth_strongly_convex", &ClassParams::new().with("mu", 0.1)).unwrap_err();
    assert_eq!(e, PepError::MissingParameter {
        class: "smooth_strongly_convex".to_string(),
        name: "L".to_string(),
    });

    let e = reg.build("smooth", &ClassParams::new().with("L", -1.)).unwrap_err();
    assert!(matches!(e, PepError::InvalidParameter { .. }));

    let e = reg.build("quasar_convex", &ClassParams::new()).unwrap_err();
    assert_eq!(e, PepError::UnknownFunctionClass("quasar_convex".to_string()));

    assert!(reg.names().any(|n| n == "cocoercive"));
}

#[test]
fn test_pairs()
{
    use crate::basis::Basis;
    use crate::{Point, Expression};

    let b = Basis::new();
    let qs: Vec<OracleQuery> = (0.. 3).map(|_| OracleQuery {
        point: Point::leaf(&b),
        gradient: Point::leaf(&b),
        value: Expression::leaf(&b),
    }).collect();

    assert_eq!(distinct_pairs(&qs).count(), 6);
    assert_eq!(unique_pairs(&qs).count(), 3);
    assert_eq!(unique_pairs(&qs[..1]).count(), 0);
}
