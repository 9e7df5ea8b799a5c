use totsu_pep::prelude::*;
use totsu_pep::*;

//

#[test]
fn test_class_errors()
{
    let reg = ClassRegistry::builtin();
    let mut pep = Pep::new();

    assert_eq!(
        pep.declare_function_named(&reg, "quadratic", &ClassParams::new()).unwrap_err(),
        PepError::UnknownFunctionClass("quadratic".to_string())
    );
    assert_eq!(
        pep.declare_function_named(&reg, "smooth_strongly_convex", &ClassParams::new().with("mu", 0.1)).unwrap_err(),
        PepError::MissingParameter {class: "smooth_strongly_convex".to_string(), name: "L".to_string()}
    );
    assert!(matches!(
        SmoothStronglyConvex::new(2., 1.).unwrap_err(),
        PepError::InvalidParameter {..}
    ));
    assert!(pep.functions().is_empty());

    let names: Vec<_> = reg.names().collect();
    assert!(names.contains(&"convex"));
    assert!(names.contains(&"cocoercive"));
}

#[test]
fn test_expression_errors()
{
    let pep = Pep::new();
    let a = pep.new_expression();
    let b = pep.new_expression();

    assert_eq!(a.try_mul(&b).unwrap_err(), PepError::NonLinearProduct);
    assert_eq!(a.powi(2).unwrap_err(), PepError::NonConstantPower);
    assert!(a.try_mul(&Expression::constant(2.)).is_ok());
    assert_eq!(Expression::constant(3.).powi(2).unwrap().constant_value(), 9.);

    assert_eq!(
        "less".parse::<ConstraintKind>().unwrap_err(),
        PepError::MalformedConstraintKind("less".to_string())
    );
    assert_eq!(
        "logdet".parse::<DimensionReduction>().unwrap_err(),
        PepError::UnsupportedHeuristic("logdet".to_string())
    );
}

#[test]
fn test_solve_errors()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut pep = Pep::new();
    let func = pep.declare_function(Convex::new());
    let x0 = pep.set_initial_point();
    assert_eq!(pep.solve(&PepParam::default()).unwrap_err(), PepError::NoPerformanceMetric);

    let other = Pep::new();
    let y = other.new_point();
    let _ = other.new_point();
    let _ = other.new_point();
    let z = other.new_point();
    pep.set_performance_metric(func.value(&x0) + (&y - &z).sqnorm());
    assert_eq!(pep.solve(&PepParam::default()).unwrap_err(), PepError::ForeignBasis);
    assert!(pep.valuation().is_none());
}

#[test]
fn test_solver_error()
{
    let e: PepError = SolverError::InvalidOp.into();
    assert_eq!(e, PepError::Solver(SolverError::InvalidOp));
    println!("{}", e);
}
