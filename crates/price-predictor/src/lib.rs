pub mod features;
pub mod predictor;

pub use features::{extract_features, FeatureSet};
pub use predictor::{PredictionWeights, PricePredictor, MIN_BARS};
