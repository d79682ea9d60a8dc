pub mod aggregate;
pub mod classifier;
pub mod face;
pub mod frame;
pub mod signals;

pub use aggregate::ResultAggregator;
pub use classifier::DocumentClassifier;
pub use face::FaceDetector;
pub use frame::PixelFrame;
pub use signals::{run_fraud_checks, RandomScoreStub, ScoreSource, SignalAnalyzer};
