pub mod play;
pub mod train;
pub mod train_tabular;

pub use play::{PlayConfig, PlayMode, PlaySummary, PolicySource};
pub use train::{EpisodeResult, TrainConfig, TrainMode};
pub use train_tabular::{TabularTrainConfig, TabularTrainMode};
