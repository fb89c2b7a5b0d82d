use burn::tensor::{Tensor, TensorData, backend::Backend};

use crate::game::{JointObservation, OBS_DIM};

/// Encode one role's feature vector as a `[1, OBS_DIM]` batch
pub fn observation_tensor<B: Backend>(features: &[f32], device: &B::Device) -> Tensor<B, 2> {
    Tensor::from_data(TensorData::new(features.to_vec(), [1, features.len()]), device)
}

/// Encode both roles' features as the critic's `[1, 2 * OBS_DIM]` input
pub fn joint_tensor<B: Backend>(obs: &JointObservation, device: &B::Device) -> Tensor<B, 2> {
    observation_tensor(&obs.concat(), device)
}

/// Stack equally sized rows into a `[rows, width]` batch
///
/// `rows` must all have length `width`.
pub fn batch_tensor<B: Backend>(rows: &[Vec<f32>], width: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut data = Vec::with_capacity(rows.len() * width);
    for row in rows {
        data.extend_from_slice(row);
    }
    Tensor::from_data(TensorData::new(data, [rows.len(), width]), device)
}

/// Split a batch of joint rows into hunter and prey halves
pub fn split_joint<B: Backend>(joint: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let [rows, _] = joint.dims();
    (
        joint.clone().slice([0..rows, 0..OBS_DIM]),
        joint.slice([0..rows, OBS_DIM..2 * OBS_DIM]),
    )
}
