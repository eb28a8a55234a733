// Job/chain engine: graph walking, task fan-out, and aggregation

pub mod driver;
pub mod fanout;

pub use driver::{
    AllFiles, ChainEngine, EngineConfig, FileSelector, UnitOutcome, UnitRun,
};
pub use fanout::fan_out;
