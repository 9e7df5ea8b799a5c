use totsu_pep::prelude::*;
use totsu_pep::*;

use anyhow::Result;

const L: f64 = 1.;
const MU: f64 = 0.1;
const MAX_STEPS: usize = 5;

/// Worst-case `||x_n - x_*||^2` of gradient descent with step size `gamma` after `n` steps,
/// from `||x_0 - x_*||^2 <= 1`.
fn worst_case(gamma: f64, n: usize, param: &PepParam) -> Result<(PepSolution, Vec<f64>)>
{
    let mut pep = Pep::new();
    let func = pep.declare_function(SmoothStronglyConvex::new(MU, L)?);

    let xs = func.stationary_point();
    let x0 = pep.set_initial_point();
    pep.set_initial_condition((&x0 - &xs).sqnorm().le(1.));

    let mut x = x0;
    for _ in 0.. n {
        x = &x - func.gradient(&x) * gamma;
    }
    pep.set_performance_metric((&x - &xs).sqnorm());

    let s = DefaultSdp::new().par(|p| {
        p.max_iter = Some(100_000);
    });
    let rslt = pep.solve_with(&s, param)?;

    let xn = pep.eval_point(&x).unwrap_or_default();

    Ok((rslt, xn))
}

fn main() -> Result<()>
{
    env_logger::init();

    let param = PepParam::default().par(|p| {
        p.dimension_reduction = Some(DimensionReduction::Trace);
    });

    //----- rate against steps

    for n in 1..= MAX_STEPS {
        let (rslt, xn) = worst_case(1. / L, n, &param)?;
        let theory = (1. - MU / L).powi(2 * n as i32);

        println!("n = {}: worst-case {:.6}, theoretical {:.6}, {:?}", n, rslt.value, theory, rslt.status);
        println!("  dimension {:?}, x_n = {:?}", rslt.dimension, xn);
    }

    //----- rate against step sizes

    for i in 1..= 8 {
        let gamma = 0.25 * i as f64 / L;
        let (rslt, _) = worst_case(gamma, 1, &PepParam::default())?;
        let theory = (1. - gamma * MU).abs().max((1. - gamma * L).abs()).powi(2);

        println!("gamma = {:.2}: worst-case {:.6}, theoretical {:.6}", gamma, rslt.value, theory);
    }

    Ok(())
}
