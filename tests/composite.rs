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

/// One step of the Bregman proximal point method: `x` such that `gh(x) = gh - gamma * gf(x)`.
///
/// Returns `x`, the subgradient of `h` recorded at `x` and the value of `func` at `x`.
/// The next step must start from that very subgradient,
/// since querying `h` again at `x` yields another element of its subdifferential.
fn bregman_proximal_step(pep: &Pep, gh: &Point, h: &Function, func: &Function, gamma: f64) -> (Point, Point, Expression)
{
    let x = pep.new_point();
    let gx = pep.new_point();
    let fx = pep.new_expression();
    func.add_point(&x, gx.clone(), fx.clone());

    let sx = gh - &gx * gamma;
    let hx = pep.new_expression();
    h.add_point(&x, sx.clone(), hx);

    (x, sx, fx)
}

#[test]
fn test_bregman_proximal_point()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (gamma, n) = (3., 5);

    let mut pep = Pep::new();
    let func1 = pep.declare_function(Convex::new());
    let func2 = pep.declare_function(Convex::new());
    let h = pep.declare_function(Convex::new());
    let func = &func1 + &func2;

    let xs = func.optimal_point();
    let fs = func.value(&xs);
    let (_, hs) = h.oracle(&xs);

    let x0 = pep.set_initial_point();
    let (gh0, h0) = h.oracle(&x0);
    pep.set_initial_condition((hs - &h0 - &gh0 * (&xs - &x0)).le(1.));

    let mut gh = gh0;
    let mut ff = Expression::zero();
    for _ in 0.. n {
        let (x, sx, fx) = bregman_proximal_step(&pep, &gh, &h, &func, gamma);
        assert_eq!(func.value(&x).decomposition(), fx.decomposition());
        ff = fx;
        gh = sx;
    }
    pep.set_performance_metric(ff - fs);

    let rslt = pep.solve_with(&solver(), &PepParam::default()).unwrap();
    println!("{:?}", rslt);

    let theory = 1. / (gamma * n as f64);
    assert_float_eq!(rslt.value, theory, r2nd <= 1e-2);

    // combination recorded in its leaves
    assert_eq!(func.decomposition().len(), 2);
    assert_eq!(func1.queries().len(), func2.queries().len());
    assert!(pep.constraints()[0].dual().is_some());
    // the chain of subgradients of h is the recorded one
    assert!(h.queries().last().map_or(false, |q| q.gradient.same_as(&gh)));
    assert_eq!(h.queries().len(), 2 + n);
}

#[test]
fn test_named_classes()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (mu, l) = (0.1, 1.);
    let reg = ClassRegistry::builtin();
    let params = ClassParams::new().with("mu", mu).with("L", l);

    let mut pep = Pep::new();
    let func = pep.declare_function_named(&reg, "smooth_strongly_convex", &params).unwrap();
    assert_eq!(func.class_name().as_deref(), Some("smooth_strongly_convex"));

    let xs = func.stationary_point();
    let x0 = pep.set_initial_point();
    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));

    let x1 = &x0 - func.gradient(&x0) / l;
    pep.set_performance_metric((&x1 - &xs).sqnorm());

    let rslt = pep.solve_with(&solver(), &PepParam::default()).unwrap();
    assert_float_eq!(rslt.value, (1. - mu / l).powi(2), abs <= 1e-3);
}
