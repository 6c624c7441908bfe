//! Q-value network for the maze agent
//!
//! A small fully connected network maps the 77-value observation to one
//! action-value per direction.
//!
//! # Architecture
//!
//! ```text
//! Input: [batch, 77]
//!   ↓ Linear(77 → hidden) + ReLU
//!   ↓ Linear(hidden → hidden) + ReLU
//!   ↓ Linear(hidden → 4) → Q(s, a)
//! ```
//!
//! # Example
//!
//! ```rust
//! use ml_maze::rl::QNetworkConfig;
//! use burn::backend::NdArray;
//! use burn::backend::ndarray::NdArrayDevice;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray<f32>;
//!
//! let device = NdArrayDevice::default();
//! let network = QNetworkConfig::new(128).init::<Backend>(&device);
//!
//! let observation = Tensor::zeros([8, 77], &device);
//! let q_values = network.forward(observation);
//!
//! assert_eq!(q_values.dims(), [8, 4]);
//! ```

use super::observation::OBS_DIM;
use burn::{
    module::{Module, Param},
    nn::{Linear, LinearConfig},
    tensor::{Tensor, activation::relu, backend::Backend},
};

/// Number of discrete actions (Up, Right, Down, Left)
pub const NUM_ACTIONS: usize = 4;

/// Configuration for the Q network
#[derive(Debug, Clone)]
pub struct QNetworkConfig {
    /// Observation length (default: 77)
    pub input_dim: usize,

    /// Width of both hidden layers (default: 128)
    pub hidden_dim: usize,

    /// Number of action values produced (default: 4)
    pub num_actions: usize,
}

impl QNetworkConfig {
    /// Create a configuration with the given hidden width
    ///
    /// # Arguments
    ///
    /// * `hidden_dim` - Width of both hidden layers
    pub fn new(hidden_dim: usize) -> Self {
        Self {
            input_dim: OBS_DIM,
            hidden_dim,
            num_actions: NUM_ACTIONS,
        }
    }

    /// Initialize a network on `device` with fresh random weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            fc1: LinearConfig::new(self.input_dim, self.hidden_dim).init(device),
            fc2: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            head: LinearConfig::new(self.hidden_dim, self.num_actions).init(device),
        }
    }
}

impl Default for QNetworkConfig {
    fn default() -> Self {
        Self::new(128)
    }
}

/// Feed-forward action-value network
///
/// Generic over the Burn backend so the same structure serves as the
/// autodiff policy network and the inference-only target network.
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    head: Linear<B>,
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `observation` - Tensor with shape `[batch, 77]`
    ///
    /// # Returns
    ///
    /// Action values with shape `[batch, 4]`
    pub fn forward(&self, observation: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(observation));
        let x = relu(self.fc2.forward(x));
        self.head.forward(x)
    }

    /// Blend `source` into this network: `self ← τ·source + (1−τ)·self`
    ///
    /// Applied to every weight and bias tensor.
    pub fn soft_update(self, source: &QNetwork<B>, tau: f32) -> Self {
        Self {
            fc1: blend_linear(self.fc1, &source.fc1, tau),
            fc2: blend_linear(self.fc2, &source.fc2, tau),
            head: blend_linear(self.head, &source.head, tau),
        }
    }
}

fn blend_linear<B: Backend>(mut target: Linear<B>, source: &Linear<B>, tau: f32) -> Linear<B> {
    let weight = source.weight.val() * tau + target.weight.val() * (1.0 - tau);
    target.weight = Param::from_tensor(weight);

    let bias = match (&target.bias, &source.bias) {
        (Some(target_bias), Some(source_bias)) => Some(Param::from_tensor(
            source_bias.val() * tau + target_bias.val() * (1.0 - tau),
        )),
        _ => None,
    };
    if bias.is_some() {
        target.bias = bias;
    }

    target
}

/// Hand-wired network that scores Right by `dx` and Down by `dy`
///
/// Greedy play with it walks toward a bottom-right goal, preferring Right on
/// ties. Stands in for a converged agent in tests.
#[cfg(test)]
pub(crate) fn goal_seeking_network<B: Backend>(hidden_dim: usize, device: &B::Device) -> QNetwork<B> {
    use burn::tensor::TensorData;

    fn sparse<B: Backend>(
        rows: usize,
        cols: usize,
        ones: &[(usize, usize)],
        device: &B::Device,
    ) -> Param<Tensor<B, 2>> {
        let mut values = vec![0.0f32; rows * cols];
        for &(r, c) in ones {
            values[r * cols + c] = 1.0;
        }
        Param::from_tensor(Tensor::from_data(TensorData::new(values, [rows, cols]), device))
    }

    let mut network = QNetworkConfig::new(hidden_dim).init::<B>(device);
    network.fc1.weight = sparse(OBS_DIM, hidden_dim, &[(OBS_DIM - 2, 0), (OBS_DIM - 1, 1)], device);
    network.fc2.weight = sparse(hidden_dim, hidden_dim, &[(0, 0), (1, 1)], device);
    network.head.weight = sparse(hidden_dim, NUM_ACTIONS, &[(0, 1), (1, 2)], device);
    for layer in [&mut network.fc1, &mut network.fc2, &mut network.head] {
        let width = layer.weight.val().dims()[1];
        layer.bias = Some(Param::from_tensor(Tensor::zeros([width], device)));
    }
    network
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::Autodiff;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    fn values(tensor: Tensor<TestBackend, 2>) -> Vec<f32> {
        tensor.into_data().iter::<f32>().collect()
    }

    #[test]
    fn test_forward_pass_shapes() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::default().init::<TestBackend>(&device);

        for batch_size in [1, 8, 64] {
            let q = network.forward(Tensor::zeros([batch_size, OBS_DIM], &device));
            assert_eq!(q.dims(), [batch_size, NUM_ACTIONS]);
        }
    }

    #[test]
    fn test_custom_hidden_width() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new(32).init::<TestBackend>(&device);
        assert_eq!(network.fc1.weight.val().dims(), [OBS_DIM, 32]);
        assert_eq!(network.head.weight.val().dims(), [32, NUM_ACTIONS]);
    }

    #[test]
    fn test_output_finite() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::default().init::<TestBackend>(&device);
        let observation =
            Tensor::random([8, OBS_DIM], Distribution::Uniform(0.0, 1.0), &device);

        let data: TensorData = network.forward(observation).into_data();
        assert!(data.iter::<f32>().all(|v| v.is_finite()));
    }

    #[test]
    fn test_gradient_flow() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::default().init::<TestAutodiffBackend>(&device);
        let observation = Tensor::ones([2, OBS_DIM], &device).require_grad();

        let loss = network.forward(observation.clone()).sum();
        let gradients = loss.backward();

        assert!(observation.grad(&gradients).is_some());
    }

    #[test]
    fn test_soft_update_full_copy() {
        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new(16);
        let source = config.init::<TestBackend>(&device);
        let target = config.init::<TestBackend>(&device);
        let input = Tensor::random([3, OBS_DIM], Distribution::Uniform(0.0, 1.0), &device);

        let target = target.soft_update(&source, 1.0);

        let expected = values(source.forward(input.clone()));
        let actual = values(target.forward(input));
        for (a, b) in expected.iter().zip(actual.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_soft_update_blends_weights() {
        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new(8);
        let source = config.init::<TestBackend>(&device);
        let target = config.init::<TestBackend>(&device);

        let source_w = values(source.fc2.weight.val());
        let target_w = values(target.fc2.weight.val());

        let blended = target.soft_update(&source, 0.01);
        let blended_w = values(blended.fc2.weight.val());

        for ((s, t), b) in source_w.iter().zip(&target_w).zip(&blended_w) {
            let expected = 0.01 * s + 0.99 * t;
            assert!((expected - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_soft_update_zero_tau_keeps_target() {
        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new(8);
        let source = config.init::<TestBackend>(&device);
        let target = config.init::<TestBackend>(&device);
        let before = values(target.head.weight.val());

        let after = values(target.soft_update(&source, 0.0).head.weight.val());
        assert_eq!(before, after);
    }
}
