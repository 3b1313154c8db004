pub mod cancel;
pub mod collector;
pub mod config;
pub mod error;
pub mod outcome;
pub mod report;
pub mod run;
pub mod stats;
pub mod work;
pub mod worker;

pub use cancel::CancelSignal;
pub use collector::Collector;
pub use config::{Config, RunConfig};
pub use error::{ConfigError, RequestError};
pub use outcome::Outcome;
pub use run::{run, RunPhase};
pub use stats::{LatencySummary, Report};
pub use work::WorkSource;
