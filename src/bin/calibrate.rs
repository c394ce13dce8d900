//! Calibrate value-network updates over the corner inputs of the feature
//! cube and report each committed step.

use anyhow::Result;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_value_trading::{AppConfig, StepCalibrator, ValueNetwork};
use std::env;

/// All {0,1}^n corner inputs, all-ones corner first.
fn corner_inputs(n: usize) -> Vec<Array1<f64>> {
    (0..(1usize << n))
        .rev()
        .map(|mask| {
            let bits: Vec<f64> = (0..n)
                .map(|i| ((mask >> (n - 1 - i)) & 1) as f64)
                .collect();
            Array1::from_vec(bits)
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = if let Some(path) = args.get(1) {
        println!("Loading configuration from {}...", path);
        AppConfig::from_file(path)?
    } else {
        AppConfig::from_env()
    };

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut network = ValueNetwork::new(config.network.clone(), &mut rng)?;
    let calibrator = StepCalibrator::new(config.calibration.clone());

    let n = network.config().input_size;
    if n > 10 {
        println!("input_size {} is too large for a corner sweep", n);
        return Ok(());
    }

    println!(
        "Calibrating a {}x{} network over {} corner inputs (seed: {:?})",
        n,
        network.config().hidden_units,
        1usize << n,
        config.seed
    );

    for input in corner_inputs(n) {
        let (output, gradient) = network.evaluate_with_gradient(&input, 0.0)?;
        let report = calibrator.calibrate(&mut network, &input, &gradient)?;
        let (new_output, _) = network.evaluate_with_gradient(&input, 0.0)?;

        println!("input: {:?}", input.to_vec());
        println!("  output: {:.6} -> {:.6}", output, new_output);
        println!(
            "  alpha: {:.6}, iterations: {}, accepted: {}",
            report.alpha, report.iterations, report.accepted
        );
    }

    Ok(())
}
