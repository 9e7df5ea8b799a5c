use core::cell::Cell;

//

macro_rules! define_id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name
        {
            /// Index within the problem, used as a slot of the compiled SDP.
            pub fn index(self) -> usize
            {
                self.0 as usize
            }
        }

        impl core::fmt::Display for $name
        {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result
            {
                write!(f, "{}{}", stringify!($name), self.0)
            }
        }
    };
}

define_id_type!(
    /// Handle of a leaf [`crate::Point`], a row/column of the Gram matrix.
    PointId
);
define_id_type!(
    /// Handle of a leaf [`crate::Expression`], an entry of the function value vector.
    ExprId
);
define_id_type!(
    /// Handle of a [`crate::Function`].
    FunctionId
);

//

/// Basis registry
///
/// Counters which assign indices to newly created leaf points, leaf expressions and functions.
/// Every [`crate::Pep`] owns its own registry, shared by reference counting
/// with the functions declared in it, so that independent problems never interfere.
#[derive(Debug, Default)]
pub struct Basis
{
    points: Cell<u32>,
    exprs: Cell<u32>,
    functions: Cell<u32>,
}

impl Basis
{
    /// Creates an empty registry.
    pub fn new() -> Self
    {
        Self::default()
    }

    fn next(counter: &Cell<u32>) -> u32
    {
        let i = counter.get();
        counter.set(i + 1);
        i
    }

    pub fn new_point_id(&self) -> PointId
    {
        PointId(Self::next(&self.points))
    }

    pub fn new_expr_id(&self) -> ExprId
    {
        ExprId(Self::next(&self.exprs))
    }

    pub fn new_function_id(&self) -> FunctionId
    {
        FunctionId(Self::next(&self.functions))
    }

    /// Number of leaf points, that is the order of the Gram matrix.
    pub fn point_count(&self) -> usize
    {
        self.points.get() as usize
    }

    /// Number of leaf expressions, that is the length of the function value vector.
    pub fn expr_count(&self) -> usize
    {
        self.exprs.get() as usize
    }

    pub fn function_count(&self) -> usize
    {
        self.functions.get() as usize
    }
}

//

#[test]
fn test_basis_counters()
{
    let b = Basis::new();
    let p0 = b.new_point_id();
    let p1 = b.new_point_id();
    let e0 = b.new_expr_id();

    assert_eq!(p0.index(), 0);
    assert_eq!(p1.index(), 1);
    assert_eq!(e0.index(), 0);
    assert_eq!(b.point_count(), 2);
    assert_eq!(b.expr_count(), 1);
    assert_eq!(b.function_count(), 0);

    // another registry starts from scratch
    let b2 = Basis::new();
    assert_eq!(b2.new_point_id().index(), 0);
    assert_eq!(b.point_count(), 2);
}
