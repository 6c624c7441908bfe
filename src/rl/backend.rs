//! Backend type aliases and device management
//!
//! This module provides convenient type aliases for the Burn backends used in
//! training and inference, as well as helper functions for device management.
//!
//! # Backend Selection
//!
//! - **TrainingBackend**: Autodiff-enabled NdArray backend for training (CPU)
//! - **InferenceBackend**: Plain NdArray backend for inference (CPU)
//!
//! The maze observation is 77 values and the network two small dense layers,
//! so the CPU NdArray backend is all the agent needs.
//!
//! # Example
//!
//! ```rust
//! use ml_maze::rl::{DqnAgent, DqnConfig, QNetworkConfig, InferenceBackend, TrainingBackend, default_device};
//!
//! let device = default_device();
//!
//! let agent = DqnAgent::<TrainingBackend>::new(DqnConfig::default(), device.clone()).unwrap();
//! let network = QNetworkConfig::new(32).init::<InferenceBackend>(&device);
//! # let _ = (agent, network);
//! ```

use burn::backend::{
    Autodiff,
    ndarray::{NdArray, NdArrayDevice},
};

/// Backend type for training (with autodiff)
///
/// The policy network lives on this backend so `learn()` can backpropagate
/// the Bellman error.
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Backend type for inference (without autodiff)
///
/// Hosts the target network and every greedy forward pass.
pub type InferenceBackend = NdArray<f32>;

/// Get the default device for computation
///
/// Returns the default NdArray device (CPU).
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    use burn::tensor::Tensor;

    #[test]
    fn test_default_device_hosts_both_backends() {
        let device = default_device();

        let trained: Tensor<TrainingBackend, 2> = Tensor::ones([2, 3], &device);
        let inferred: Tensor<InferenceBackend, 2> = Tensor::ones([2, 3], &device);

        assert_eq!(trained.dims(), inferred.dims());
    }
}
