//! Backend type aliases and device management
//!
//! - **TrainingBackend**: Autodiff-enabled NdArray backend for the actor-critic loop (CPU)
//! - **InferenceBackend**: Plain NdArray backend for loaded actors during play (CPU)
//!
//! The networks are small multilayer perceptrons over a 15-feature
//! observation, so the CPU backend is enough for both.
//!
//! # Example
//!
//! ```rust
//! use maze_pursuit::rl::{ActorConfig, InferenceBackend, default_device};
//!
//! let device = default_device();
//! let actor = ActorConfig::new(32).init::<InferenceBackend>(&device);
//! ```

use burn::backend::{
    Autodiff,
    ndarray::{NdArray, NdArrayDevice},
};

/// Backend for training (with autodiff)
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Backend for running saved actors
pub type InferenceBackend = NdArray<f32>;

/// The default NdArray device (CPU)
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}
