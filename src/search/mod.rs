//! Exhaustive hyperparameter search over model order grids.

pub mod engine;
pub mod grid;
pub mod tuner;

pub use engine::{
    BestSelection, EvalMode, GridSearch, NoopObserver, SearchConfig, SearchObserver,
    SearchOutcome, TracingObserver, SCREEN_HORIZON,
};
pub use grid::{PlainGrid, SeasonalGrid};
pub use tuner::Tuner;
