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

/// Inexact gradient descent with exact line search,
/// both the relative inaccuracy and the initial condition given as PSD matrices.
#[test]
fn test_inexact_gradient_exact_line_search_lmi()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let (mu, l, epsilon, n) = (0.1, 1., 0.1, 2);

    let mut pep = Pep::new();
    let func = pep.declare_function(SmoothStronglyConvex::new(mu, l).unwrap());

    let xs = func.stationary_point();
    let fs = func.value(&xs);
    let x0 = pep.set_initial_point();
    let (gx0, f0) = func.oracle(&x0);

    // |f(x0) - f(xs)| <= 1
    let d0 = &f0 - &fs;
    pep.add_psd_matrix(PsdMatrix::new(vec![
        vec![Expression::constant(1.), d0.clone()],
        vec![d0, Expression::constant(1.)],
    ]).unwrap());

    let mut x = x0;
    let mut gx = gx0;
    for _ in 0.. n {
        let x_prev = x;
        let gx_prev = gx;
        x = pep.new_point();
        gx = func.gradient(&x);

        let cross = &gx_prev * &gx;
        pep.add_psd_matrix(PsdMatrix::new(vec![
            vec![gx_prev.sqnorm() * epsilon, cross.clone()],
            vec![cross, gx.sqnorm() * epsilon],
        ]).unwrap());
        func.add_constraint(((&x - &x_prev) * &gx).equals(0.)).unwrap();
    }
    pep.set_performance_metric(func.value(&x) - &fs);

    let rslt = pep.solve_with(&solver(), &PepParam::default()).unwrap();
    println!("{:?}", rslt);

    let leps = (1. + epsilon) * l;
    let meps = (1. - epsilon) * mu;
    let theory = ((leps - meps) / (leps + meps)).powi(2 * n as i32);
    assert_float_eq!(rslt.value, theory, r2nd <= 1e-2);

    assert_eq!(pep.psd_matrices().len(), n + 1);
    for psd in pep.psd_matrices() {
        let d = psd.dual().unwrap();
        assert_eq!(d.len(), 4);
        // symmetric and PSD up to solver accuracy
        assert_float_eq!(d[1], d[2], abs <= 1e-6);
        assert!(d[0] >= -1e-6 && d[3] >= -1e-6);
    }
    for c in func.constraints().iter() {
        assert!(c.dual().is_some());
    }
}

#[test]
fn test_psd_matrix_shape()
{
    let pep = Pep::new();
    let a = pep.new_expression();
    let b = pep.new_expression();

    assert_eq!(
        PsdMatrix::new(vec![vec![a.clone(), b.clone()]]).unwrap_err(),
        PepError::NotSquare
    );
    assert_eq!(
        PsdMatrix::new(vec![vec![a.clone(), b.clone()], vec![a.clone(), b.clone()]]).unwrap_err(),
        PepError::NotSymmetric {row: 1, col: 0}
    );

    let m = PsdMatrix::new(vec![vec![a.clone(), b.clone()], vec![b, a]]).unwrap();
    assert_eq!(m.order(), 2);
    assert!(m.dual().is_none());
}
