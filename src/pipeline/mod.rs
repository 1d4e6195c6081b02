//! ETL, decomposition, selection, and persistence stages.

pub mod decompose;
pub mod driver;
pub mod etl;
pub mod persist;

pub use decompose::{decompose, Decomposition, DecompositionMode};
pub use driver::{DriverConfig, SelectionDriver, SelectionReport, TrainedFamily};
pub use etl::{load_series_csv, CsvSchema, EtlPipeline, LocalBucket, RawSource};
pub use persist::ModelStore;
