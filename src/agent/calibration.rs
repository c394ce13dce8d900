//! Bounded step-size calibration for gradient-like weight updates.

use crate::agent::ValueNetwork;
use crate::error::{Error, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Step calibration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Lower edge of the accepted output-change band
    pub target_low: f64,
    /// Upper edge of the accepted output-change band
    pub target_high: f64,
    /// Iteration budget for the line search
    pub max_iterations: usize,
    /// Fraction of the calibrated step that is actually committed
    pub damping: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            target_low: 0.9,
            target_high: 1.1,
            max_iterations: 100,
            damping: 0.1,
        }
    }
}

/// Outcome of one calibration pass
#[derive(Debug, Clone)]
pub struct CalibrationReport {
    /// Step multiplier the search settled on
    pub alpha: f64,
    /// Iterations consumed before acceptance (the full budget if exhausted)
    pub iterations: usize,
    /// Whether the search hit the target band
    pub accepted: bool,
    /// Output change predicted at `alpha`, before damping
    pub predicted_diff: f64,
}

/// Bounded line search that sizes a gradient step before committing it.
///
/// A raw sensitivity gradient applied as-is can push the output far past a
/// useful range once the clamped activations saturate. The search probes
/// the step speculatively, expanding or bisecting the multiplier until the
/// predicted output change lands in the target band, then commits only a
/// damped fraction through the network's update operation. A stability
/// control layered on a sensitivity direction, not a general optimizer.
pub struct StepCalibrator {
    config: CalibrationConfig,
}

impl Default for StepCalibrator {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

impl StepCalibrator {
    /// Create a calibrator with the given configuration.
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    /// Get the calibration configuration
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Search for a step multiplier, then apply the damped step in place.
    pub fn calibrate(
        &self,
        network: &mut ValueNetwork,
        input: &Array1<f64>,
        gradient: &Array1<f64>,
    ) -> Result<CalibrationReport> {
        let report = self.search(network, input, gradient)?;

        let scale = self.config.damping * report.alpha;
        let damped = gradient.mapv(|g| g * scale);
        network.add_weights(&damped)?;

        log::debug!(
            "committed calibrated step: alpha={}, damping={}, iterations={}, accepted={}",
            report.alpha,
            self.config.damping,
            report.iterations,
            report.accepted
        );
        Ok(report)
    }

    /// Run the line search only; the network is not modified.
    ///
    /// Starting from `alpha = 1.0`, each iteration compares the speculative
    /// output change against the target band. A change below the band grows
    /// `alpha` (or records it as a lower bound), one above shrinks it (or
    /// records an upper bound), a negative one halves it; once both bounds
    /// exist the search bisects between them. Budget exhaustion is not an
    /// error: the last multiplier is returned with `accepted = false`.
    pub fn search(
        &self,
        network: &ValueNetwork,
        input: &Array1<f64>,
        gradient: &Array1<f64>,
    ) -> Result<CalibrationReport> {
        let baseline = network.evaluate_with_step(input, gradient, 0.0)?;

        let mut alpha = 1.0_f64;
        let mut upper_bound: Option<f64> = None;
        let mut lower_bound: Option<f64> = None;
        let mut accepted = false;
        let mut iterations = self.config.max_iterations;

        let mut diff = self.output_diff(network, input, gradient, alpha, baseline)?;
        for t in 0..self.config.max_iterations {
            let next = if diff < 0.0 {
                upper_bound = Some(alpha);
                match lower_bound {
                    None => alpha / 2.0,
                    Some(lower) => (alpha + lower) / 2.0,
                }
            } else if diff < self.config.target_low {
                lower_bound = Some(alpha);
                match upper_bound {
                    None => alpha / diff,
                    Some(upper) => (upper + alpha) / 2.0,
                }
            } else if diff > self.config.target_high {
                upper_bound = Some(alpha);
                match lower_bound {
                    None => alpha / diff,
                    Some(lower) => (alpha + lower) / 2.0,
                }
            } else {
                accepted = true;
                iterations = t;
                break;
            };

            // alpha/diff explodes when diff vanishes (a zero gradient moves
            // the output by nothing at any multiplier); keep the last finite
            // multiplier and stop rather than probe at infinity.
            if !next.is_finite() {
                log::debug!(
                    "step calibration stopped on non-finite multiplier at iteration {}",
                    t
                );
                break;
            }

            alpha = next;
            diff = self.output_diff(network, input, gradient, alpha, baseline)?;
            log::trace!("calibration iteration {}: alpha={}, diff={}", t, alpha, diff);
        }

        Ok(CalibrationReport {
            alpha,
            iterations,
            accepted,
            predicted_diff: diff,
        })
    }

    fn output_diff(
        &self,
        network: &ValueNetwork,
        input: &Array1<f64>,
        gradient: &Array1<f64>,
        alpha: f64,
        baseline: f64,
    ) -> Result<f64> {
        let diff = network.evaluate_with_step(input, gradient, alpha)? - baseline;
        // A NaN fails every band comparison and would read as acceptance.
        if diff.is_nan() {
            return Err(Error::NumericDomain(
                "non-finite output change during step calibration".to_string(),
            ));
        }
        Ok(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::NetworkConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_network(seed: u64, config: NetworkConfig) -> ValueNetwork {
        let mut rng = StdRng::seed_from_u64(seed);
        ValueNetwork::new(config, &mut rng).unwrap()
    }

    /// 1-in/1-hidden network wired as the identity, so the search runs over
    /// a smooth, strictly increasing output change.
    fn identity_network() -> ValueNetwork {
        let config = NetworkConfig {
            input_size: 1,
            hidden_units: 1,
            output_min: -1.0,
            output_max: 1.0,
        };
        let mut net = seeded_network(0, config);
        net.set_weights(&Array1::from_vec(vec![0.0, 1.0, 0.0, 1.0]))
            .unwrap();
        net
    }

    #[test]
    fn test_default_config() {
        let config = CalibrationConfig::default();
        assert_eq!(config.target_low, 0.9);
        assert_eq!(config.target_high, 1.1);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.damping, 0.1);
    }

    #[test]
    fn test_search_reaches_target_band() {
        let net = identity_network();
        let input = Array1::from_vec(vec![0.5]);
        let (_, gradient) = net.evaluate_with_gradient(&input, 0.0).unwrap();

        let calibrator = StepCalibrator::default();
        let before = net.weights();
        let report = calibrator.search(&net, &input, &gradient).unwrap();

        assert!(report.accepted);
        assert!(report.iterations < calibrator.config().max_iterations);
        assert!(report.predicted_diff >= 0.9 - 1e-9);
        assert!(report.predicted_diff <= 1.1 + 1e-9);
        assert!(report.alpha > 0.0);
        // Searching must not touch the parameters.
        assert_eq!(net.weights(), before);
    }

    #[test]
    fn test_calibrate_commits_damped_step() {
        let mut net = identity_network();
        let input = Array1::from_vec(vec![0.5]);
        let (old_output, gradient) = net.evaluate_with_gradient(&input, 0.0).unwrap();

        let calibrator = StepCalibrator::default();
        let dry_run = calibrator.search(&net, &input, &gradient).unwrap();
        let predicted = net
            .evaluate_with_step(&input, &gradient, calibrator.config().damping * dry_run.alpha)
            .unwrap();

        let report = calibrator.calibrate(&mut net, &input, &gradient).unwrap();
        assert_eq!(report.alpha, dry_run.alpha);

        let (new_output, _) = net.evaluate_with_gradient(&input, 0.0).unwrap();
        assert!((new_output - predicted).abs() < 1e-9);
        assert!(new_output != old_output);
    }

    #[test]
    fn test_zero_gradient_is_a_no_op() {
        let mut net = seeded_network(13, NetworkConfig::default());
        let input = Array1::from_vec(vec![1.0, 0.0, 1.0]);
        let gradient = Array1::zeros(net.weight_len());

        let before = net.weights();
        let calibrator = StepCalibrator::default();
        let report = calibrator.calibrate(&mut net, &input, &gradient).unwrap();

        assert!(!report.accepted);
        assert_eq!(report.alpha, 1.0);
        assert_eq!(net.weights(), before);
    }

    #[test]
    fn test_budget_exhaustion_is_not_an_error() {
        // A one-iteration budget cannot reach the band here.
        let net = identity_network();
        let input = Array1::from_vec(vec![0.5]);
        let (_, gradient) = net.evaluate_with_gradient(&input, 0.0).unwrap();

        let calibrator = StepCalibrator::new(CalibrationConfig {
            max_iterations: 1,
            ..Default::default()
        });
        let report = calibrator.search(&net, &input, &gradient).unwrap();
        assert!(!report.accepted);
        assert_eq!(report.iterations, 1);
        assert!(report.alpha.is_finite());
    }

    #[test]
    fn test_end_to_end_seeded_update() {
        let config = NetworkConfig {
            input_size: 3,
            hidden_units: 10,
            output_min: -1.0,
            output_max: 1.0,
        };
        let mut net = seeded_network(42, config);
        let input = Array1::from_vec(vec![1.0, 1.0, 1.0]);

        let (output, gradient) = net.evaluate_with_gradient(&input, 0.0).unwrap();
        assert!(output.is_finite());
        // Fan-in-scaled init keeps the estimate near the clamp band; the
        // leak past a bound is a tenth of the overshoot.
        assert!(output.abs() <= 1.5, "initial output {}", output);

        let calibrator = StepCalibrator::default();
        let dry_run = calibrator.search(&net, &input, &gradient).unwrap();
        let predicted = net
            .evaluate_with_step(&input, &gradient, calibrator.config().damping * dry_run.alpha)
            .unwrap();

        let report = calibrator.calibrate(&mut net, &input, &gradient).unwrap();
        assert!(report.iterations <= calibrator.config().max_iterations);
        if report.accepted {
            assert!(report.predicted_diff >= 0.9 - 1e-9);
            assert!(report.predicted_diff <= 1.1 + 1e-9);
        }

        // The committed change is exactly the damped-step prediction.
        let (new_output, _) = net.evaluate_with_gradient(&input, 0.0).unwrap();
        assert!((new_output - predicted).abs() < 1e-9);
    }
}
