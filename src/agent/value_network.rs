//! Feed-forward value-function approximator for trading decisions.
//!
//! One hidden layer with a leaky-linear activation, and a scalar output
//! unit whose activation clamps softly toward a configured band:
//!
//! ```text
//! hidden:  f(u) = u          (u >= 0)          f'(u) = 1
//!          f(u) = 0.1*u      (otherwise)       f'(u) = 0.1
//!
//! output:  f(v) = v                            (min <= v <= max)
//!          f(v) = 0.1*v + 0.9*min   (v < min)  f'(v) = 0.1 off-band
//!          f(v) = 0.1*v + 0.9*max   (v > max)
//! ```
//!
//! Both activations are continuous at their breakpoints, so the output and
//! its weight sensitivities stay well-behaved as pre-activations cross them.

use crate::agent::NormalSource;
use crate::error::{Error, Result};
use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Value network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Number of input features
    pub input_size: usize,
    /// Number of hidden units
    pub hidden_units: usize,
    /// Lower bound of the output band
    pub output_min: f64,
    /// Upper bound of the output band
    pub output_max: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            input_size: 3,
            hidden_units: 10,
            output_min: -1.0,
            output_max: 1.0,
        }
    }
}

impl NetworkConfig {
    /// Check that the configuration describes a constructible network.
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(Error::InvalidParameter(
                "input_size must be at least 1".to_string(),
            ));
        }
        if self.hidden_units == 0 {
            return Err(Error::InvalidParameter(
                "hidden_units must be at least 1".to_string(),
            ));
        }
        if !self.output_min.is_finite() || !self.output_max.is_finite() {
            return Err(Error::InvalidParameter(
                "output bounds must be finite".to_string(),
            ));
        }
        if self.output_min > self.output_max {
            return Err(Error::InvalidParameter(format!(
                "output_min {} exceeds output_max {}",
                self.output_min, self.output_max
            )));
        }
        Ok(())
    }

    /// Length of the flat weight vector for these dimensions.
    pub fn weight_len(&self) -> usize {
        self.hidden_units * (self.input_size + 1) + (self.hidden_units + 1)
    }
}

/// One hidden unit's parameters
#[derive(Debug, Clone)]
struct HiddenUnit {
    bias: f64,
    weights: Array1<f64>,
}

/// Neural network mapping a feature vector to a bounded scalar value
/// estimate.
///
/// Parameters are stored per unit, but every external exchange (gradients,
/// weight diffs, snapshots) uses a single flat layout of fixed length
/// `hidden_units * (input_size + 1) + (hidden_units + 1)`: for each hidden
/// unit its bias then its input weights, followed by the output bias then
/// the output weights. Persistence and training callers rely on exactly
/// this ordering.
#[derive(Debug, Clone)]
pub struct ValueNetwork {
    config: NetworkConfig,
    hidden: Vec<HiddenUnit>,
    output_bias: f64,
    output_weights: Array1<f64>,
}

impl ValueNetwork {
    /// Create a randomly initialized network.
    ///
    /// Weights are drawn from N(0, 1/(fan_in + 1)) so initial
    /// pre-activations stay well-conditioned regardless of layer width.
    /// All randomness comes from the caller's engine; seed it to make
    /// construction reproducible.
    pub fn new<R: Rng>(config: NetworkConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let n = config.input_size;
        let h = config.hidden_units;

        let mut hidden_source = NormalSource::new(0.0, 1.0 / (n as f64 + 1.0))?;
        let mut hidden = Vec::with_capacity(h);
        for _ in 0..h {
            let mut weights = Vec::with_capacity(n);
            for _ in 0..n {
                weights.push(hidden_source.sample(rng));
            }
            let bias = hidden_source.sample(rng);
            hidden.push(HiddenUnit {
                bias,
                weights: Array1::from_vec(weights),
            });
        }

        let mut output_source = NormalSource::new(0.0, 1.0 / (h as f64 + 1.0))?;
        let mut output_weights = Vec::with_capacity(h);
        for _ in 0..h {
            output_weights.push(output_source.sample(rng));
        }
        let output_bias = output_source.sample(rng);
        let output_weights = Array1::from_vec(output_weights);

        Ok(Self {
            config,
            hidden,
            output_bias,
            output_weights,
        })
    }

    /// Get the network configuration
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Length of the flat weight vector
    pub fn weight_len(&self) -> usize {
        self.config.weight_len()
    }

    /// Evaluate the network and return the output together with its exact
    /// derivative with respect to every weight, in flat-layout order.
    ///
    /// This is output sensitivity at the current parameters and input, not
    /// a loss gradient: there is no target and no error term, only the
    /// chain rule from the scalar output back through both layers. The
    /// result is a directional basis for a single first-order step.
    ///
    /// `_drop_rate` is a reserved dropout knob and currently has no effect.
    pub fn evaluate_with_gradient(
        &self,
        input: &Array1<f64>,
        _drop_rate: f64,
    ) -> Result<(f64, Array1<f64>)> {
        check_len(self.config.input_size, input.len())?;

        let h = self.config.hidden_units;
        let mut hidden_outputs = Vec::with_capacity(h);
        let mut hidden_slopes = Vec::with_capacity(h);
        for unit in &self.hidden {
            let mut u = unit.bias;
            for (w, x) in unit.weights.iter().zip(input.iter()) {
                u += w * x;
            }
            let (out, slope) = hidden_activation(u);
            hidden_outputs.push(out);
            hidden_slopes.push(slope);
        }

        let mut v = self.output_bias;
        for (w, out) in self.output_weights.iter().zip(&hidden_outputs) {
            v += w * out;
        }
        let (output, output_slope) = self.output_activation(v);

        // Chain rule back through the output's linear combination.
        let output_delta = output_slope;
        let mut gradient = Vec::with_capacity(self.weight_len());
        for j in 0..h {
            let hidden_delta = output_delta * self.output_weights[j] * hidden_slopes[j];
            gradient.push(hidden_delta);
            for &x in input.iter() {
                gradient.push(hidden_delta * x);
            }
        }
        gradient.push(output_delta);
        for &out in &hidden_outputs {
            gradient.push(output_delta * out);
        }

        Ok((output, Array1::from_vec(gradient)))
    }

    /// Evaluate the network as if `alpha * step` had been added to every
    /// weight, without modifying anything.
    ///
    /// `step` is read by flat-layout index and never mutated, so callers
    /// can reuse the same buffer across calls. `alpha = 0.0` reproduces the
    /// stored-weight output of [`evaluate_with_gradient`] exactly.
    pub fn evaluate_with_step(
        &self,
        input: &Array1<f64>,
        step: &Array1<f64>,
        alpha: f64,
    ) -> Result<f64> {
        check_len(self.config.input_size, input.len())?;
        check_len(self.weight_len(), step.len())?;

        let mut k = 0;
        let mut hidden_outputs = Vec::with_capacity(self.config.hidden_units);
        for unit in &self.hidden {
            let mut u = unit.bias + alpha * step[k];
            k += 1;
            for (w, x) in unit.weights.iter().zip(input.iter()) {
                u += (*w + alpha * step[k]) * x;
                k += 1;
            }
            let (out, _) = hidden_activation(u);
            hidden_outputs.push(out);
        }

        let mut v = self.output_bias + alpha * step[k];
        k += 1;
        for (w, out) in self.output_weights.iter().zip(&hidden_outputs) {
            v += (*w + alpha * step[k]) * out;
            k += 1;
        }

        let (output, _) = self.output_activation(v);
        Ok(output)
    }

    /// Flat snapshot of every parameter.
    pub fn weights(&self) -> Array1<f64> {
        let mut flat = Vec::with_capacity(self.weight_len());
        for unit in &self.hidden {
            flat.push(unit.bias);
            flat.extend(unit.weights.iter().copied());
        }
        flat.push(self.output_bias);
        flat.extend(self.output_weights.iter().copied());
        Array1::from_vec(flat)
    }

    /// Overwrite every parameter from a flat snapshot.
    ///
    /// The restore counterpart of [`weights`](Self::weights): a snapshot
    /// taken from a network of matching dimensions writes back verbatim.
    pub fn set_weights(&mut self, weights: &Array1<f64>) -> Result<()> {
        check_len(self.weight_len(), weights.len())?;

        let mut k = 0;
        for unit in &mut self.hidden {
            unit.bias = weights[k];
            k += 1;
            for w in unit.weights.iter_mut() {
                *w = weights[k];
                k += 1;
            }
        }
        self.output_bias = weights[k];
        k += 1;
        for w in self.output_weights.iter_mut() {
            *w = weights[k];
            k += 1;
        }
        Ok(())
    }

    /// Add a flat diff to every parameter in place.
    ///
    /// The only durable mutation path besides [`set_weights`](Self::set_weights).
    /// Applying `d1` then `d2` leaves the same parameters as applying their
    /// element-wise sum once.
    pub fn add_weights(&mut self, diff: &Array1<f64>) -> Result<()> {
        check_len(self.weight_len(), diff.len())?;

        let mut k = 0;
        for unit in &mut self.hidden {
            unit.bias += diff[k];
            k += 1;
            for w in unit.weights.iter_mut() {
                *w += diff[k];
                k += 1;
            }
        }
        self.output_bias += diff[k];
        k += 1;
        for w in self.output_weights.iter_mut() {
            *w += diff[k];
            k += 1;
        }
        Ok(())
    }

    fn output_activation(&self, v: f64) -> (f64, f64) {
        if v < self.config.output_min {
            (0.1 * v + 0.9 * self.config.output_min, 0.1)
        } else if v <= self.config.output_max {
            (v, 1.0)
        } else {
            (0.1 * v + 0.9 * self.config.output_max, 0.1)
        }
    }
}

fn hidden_activation(u: f64) -> (f64, f64) {
    if u >= 0.0 {
        (u, 1.0)
    } else {
        (0.1 * u, 0.1)
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::LengthMismatch { expected, actual });
    }
    Ok(())
}
