use float_eq::assert_float_eq;
use totsu_pep::prelude::*;
use totsu_pep::*;

//

fn solver() -> DefaultSdp
{
    DefaultSdp::new().par(|p| {
        p.max_iter = Some(100_000);
    })
}

fn solve(pep: &mut Pep) -> f64
{
    let rslt = pep.solve_with(&solver(), &PepParam::default()).unwrap();
    println!("{:?}", rslt);

    rslt.value
}

/// `x` such that `x = x0 - gamma * g` with `g` an output of `op` at `x`.
fn proximal_step(pep: &Pep, x0: &Point, op: &Function, gamma: f64) -> Point
{
    let gx = pep.new_point();
    let x = x0 - &gx * gamma;
    op.add_point(&x, gx, pep.new_expression());
    x
}

//----- functions

#[test]
fn test_subgradient_method()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (m, n) = (2., 6);
    let gamma = 1. / (m * ((n + 1) as f64).sqrt());

    let mut pep = Pep::new();
    let func = pep.declare_function(ConvexLipschitz::new(m).unwrap());

    let xs = func.optimal_point();
    let fs = func.value(&xs);
    let x0 = pep.set_initial_point();
    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));

    let mut x = x0;
    for _ in 0..= n {
        let (gx, fx) = func.oracle(&x);
        pep.set_performance_metric(fx - &fs);
        x = &x - gx * gamma;
    }

    let theory = m / ((n + 1) as f64).sqrt();
    assert_float_eq!(solve(&mut pep), theory, r2nd <= 1e-2);
    assert_eq!(pep.performance_metric_duals().len(), n + 1);
}

#[test]
fn test_gd_nonconvex_gradient_norm()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (l, n) = (1., 5);

    let mut pep = Pep::new();
    let func = pep.declare_function(Smooth::new(l).unwrap());

    let x0 = pep.set_initial_point();
    let (g0, f0) = func.oracle(&x0);

    let mut x = x0;
    let mut gx = g0;
    for _ in 0.. n {
        pep.set_performance_metric(gx.sqnorm());
        x = &x - &gx / l;
        gx = func.gradient(&x);
    }
    pep.set_performance_metric(gx.sqnorm());
    pep.set_initial_condition((f0 - func.value(&x)).le(1.));

    let theory = 4. / 3. * l / n as f64;
    assert_float_eq!(solve(&mut pep), theory, r2nd <= 1e-2);
}

#[test]
fn test_strongly_convex_sublevel()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mu = 0.25;

    let mut pep = Pep::new();
    let func = pep.declare_function(StronglyConvex::new(mu).unwrap());

    let xs = func.optimal_point();
    let x0 = pep.set_initial_point();
    pep.set_initial_condition((func.value(&x0) - func.value(&xs)).le(1.));
    pep.set_performance_metric((&x0 - &xs).sqnorm());

    // attained by mu/2 ||x||^2
    assert_float_eq!(solve(&mut pep), 2. / mu, r2nd <= 1e-2);
}

#[test]
fn test_indicator_diameter()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let d = 1.5;

    let mut pep = Pep::new();
    let ind = pep.declare_function(ConvexIndicator::new(d).unwrap());

    let xs = ind.optimal_point();
    let x0 = pep.set_initial_point();
    let v0 = ind.value(&x0);
    pep.set_performance_metric((&x0 - &xs).sqnorm());

    assert_float_eq!(solve(&mut pep), d * d, r2nd <= 1e-2);
    assert_float_eq!(pep.eval_expression(&v0).unwrap(), 0., abs <= 1e-3);
}

//----- operators

#[test]
fn test_proximal_point_monotone()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (alpha, n) = (1., 3);

    let mut pep = Pep::new();
    let op = pep.declare_function(Monotone::new());

    let xs = op.stationary_point();
    let x0 = pep.set_initial_point();
    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));

    let mut x = x0.clone();
    let mut x_prev = x0;
    for _ in 0.. n {
        x_prev = x;
        x = proximal_step(&pep, &x_prev, &op, alpha);
    }
    pep.set_performance_metric((&x - &x_prev).sqnorm());

    let theory = (1. - 1. / n as f64).powi(n as i32 - 1) / n as f64;
    assert_float_eq!(solve(&mut pep), theory, r2nd <= 1e-2);
}

#[test]
fn test_strongly_monotone_residual()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mu = 0.5;

    let mut pep = Pep::new();
    let op = pep.declare_function(StronglyMonotone::new(mu).unwrap());

    let xs = op.stationary_point();
    let x0 = pep.set_initial_point();
    pep.set_initial_condition(op.gradient(&x0).sqnorm().le(1.));
    pep.set_performance_metric((&x0 - &xs).sqnorm());

    // attained by mu I
    assert_float_eq!(solve(&mut pep), 1. / (mu * mu), r2nd <= 1e-2);
}

#[test]
fn test_lipschitz_forward_step()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (l, gamma) = (2., 0.25);

    let mut pep = Pep::new();
    let op = pep.declare_function(LipschitzOperator::new(l).unwrap());

    let xs = op.stationary_point();
    let x0 = pep.set_initial_point();
    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));

    let x1 = &x0 - op.gradient(&x0) * gamma;
    pep.set_performance_metric((&x1 - &xs).sqnorm());

    // attained by -L I
    assert_float_eq!(solve(&mut pep), (1. + gamma * l).powi(2), r2nd <= 1e-2);
}

#[test]
fn test_cocoercive_output()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let beta = 2.;

    let mut pep = Pep::new();
    let op = pep.declare_function(Cocoercive::new(beta).unwrap());

    let xs = op.stationary_point();
    let x0 = pep.set_initial_point();
    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));
    pep.set_performance_metric(op.gradient(&x0).sqnorm());

    // attained by I / beta
    assert_float_eq!(solve(&mut pep), 1. / (beta * beta), r2nd <= 1e-2);
}
