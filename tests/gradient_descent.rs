use float_eq::assert_float_eq;
use totsu_pep::prelude::*;
use totsu_pep::*;

//

struct GradientDescent
{
    pep: Pep,
    x0: Point,
    xs: Point,
    metric: Expression,
}

fn setup_gradient_descent(l: f64, gamma: f64, n: usize) -> GradientDescent
{
    let mut pep = Pep::new();
    let func = pep.declare_function(SmoothStronglyConvex::new(0., l).unwrap());

    let xs = func.stationary_point();
    let fs = func.value(&xs);
    let x0 = pep.set_initial_point();
    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));

    let mut x = x0.clone();
    for _ in 0.. n {
        x = &x - func.gradient(&x) * gamma;
    }

    let metric = func.value(&x) - &fs;
    pep.set_performance_metric(metric.clone());

    GradientDescent {pep, x0, xs, metric}
}

fn solver() -> DefaultSdp
{
    DefaultSdp::new().par(|p| {
        p.max_iter = Some(100_000);
    })
}

//

#[test]
fn test_gd_smooth_convex()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (l, n) = (3., 4);
    let mut gd = setup_gradient_descent(l, 1. / l, n);

    let rslt = gd.pep.solve_with(&solver(), &PepParam::default()).unwrap();
    println!("{:?}", rslt);

    let theory = l / (4. * n as f64 + 2.);
    assert_float_eq!(rslt.value, theory, r2nd <= 1e-2);
    assert!(rslt.dimension.is_some());

    // worst-case instance
    let wc = gd.pep.eval_expression(&gd.metric).unwrap();
    assert_float_eq!(wc, rslt.value, abs <= 1e-3);
    let r0 = gd.pep.eval_expression(&(&gd.x0 - &gd.xs).sqnorm()).unwrap();
    assert!(r0 <= 1. + 1e-3);

    // the only constraint with a nonzero right-hand side carries the whole value
    assert_float_eq!(gd.pep.performance_metric_duals(), [1.].as_ref(), abs_all <= 1e-3);
    let d0 = gd.pep.constraints()[0].dual().unwrap();
    assert_float_eq!(d0, rslt.value, abs <= 1e-3);
}

#[test]
fn test_gd_strongly_convex_distance()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (mu, l, n) = (0.1, 3., 4);

    let mut pep = Pep::new();
    let func = pep.declare_function(SmoothStronglyConvex::new(mu, l).unwrap());

    let xs = func.stationary_point();
    let x0 = pep.set_initial_point();
    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));

    let mut x = x0.clone();
    for _ in 0.. n {
        x = &x - func.gradient(&x) / l;
    }
    pep.set_performance_metric((&x - &xs).sqnorm());

    let rslt = pep.solve_with(&solver(), &PepParam::default()).unwrap();
    println!("{:?}", rslt);

    let theory = (1. - mu / l).powi(2 * n as i32);
    assert_float_eq!(rslt.value, theory, r2nd <= 1e-2);

    let xn = pep.eval_point(&x).unwrap();
    let xsv = pep.eval_point(&xs).unwrap();
    assert_eq!(xn.len(), pep.valuation().unwrap().dimension());
    let dist: f64 = xn.iter().zip(xsv.iter()).map(|(a, b)| (a - b).powi(2)).sum();
    assert_float_eq!(dist, rslt.value, abs <= 1e-2);
}

#[test]
fn test_gd_min_of_metrics()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (l, n) = (3., 2);
    let mut gd = setup_gradient_descent(l, 1. / l, n);
    let metric = gd.metric.clone();
    gd.pep.set_performance_metric(metric * 2.);

    let rslt = gd.pep.solve_with(&solver(), &PepParam::default()).unwrap();

    let theory = l / (4. * n as f64 + 2.);
    assert_float_eq!(rslt.value, theory, r2nd <= 1e-2);

    let duals = gd.pep.performance_metric_duals();
    assert_eq!(duals.len(), 2);
    assert_float_eq!(duals.iter().sum::<f64>(), 1., abs <= 1e-3);
}

#[test]
fn test_gd_resolve()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (l, n) = (3., 2);
    let mut gd = setup_gradient_descent(l, 1. / l, n);

    let s = solver();
    let rslt1 = gd.pep.solve_with(&s, &PepParam::default()).unwrap();
    let nc1 = gd.pep.functions()[0].class_constraints().len();
    let rslt2 = gd.pep.solve_with(&s, &PepParam::default()).unwrap();
    let nc2 = gd.pep.functions()[0].class_constraints().len();

    assert_eq!(nc1, nc2);
    assert_float_eq!(rslt1.value, rslt2.value, abs <= 1e-6);
}

#[test]
fn test_gd_dimension_reduction()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (l, n) = (3., 2);
    let mut gd = setup_gradient_descent(l, 1. / l, n);
    let s = solver();

    let rslt = gd.pep.solve_with(&s, &PepParam::default()).unwrap();

    let param = PepParam::default().par(|p| {
        p.dimension_reduction = Some(DimensionReduction::Trace);
        p.keep_program = true;
    });
    let reduced = gd.pep.solve_with(&s, &param).unwrap();
    println!("{:?} -> {:?}", rslt.dimension, reduced.dimension);

    assert!(reduced.value <= rslt.value + 1e-3);
    assert!(reduced.value >= rslt.value - 1e-3);
    assert!(reduced.dimension.unwrap() <= rslt.dimension.unwrap());
    assert!(reduced.program.is_some());
    assert!(reduced.raw.is_some());

    // the instance still attains the value, up to the slack
    let wc = gd.pep.eval_expression(&gd.metric).unwrap();
    assert!(wc >= reduced.value - 1e-3);
}
