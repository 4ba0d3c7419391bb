pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod queue;
pub mod report;
pub mod results;
pub mod search;

pub use crate::config::{ConfigOverrides, SearchConfig};
pub use crate::errors::{SearchError, SearchResult};
pub use crate::report::{JsonReporter, Reporter, TextReporter};
pub use crate::results::{MatchRecord, Outcome, ResultStore, Summary};
pub use crate::search::{run_search, search, SearchOutput};
