//! Combination planning.
//!
//! The planner pairs every audio asset with one video template and yields the
//! pairs as a lazy, finite iterator. It never runs inference, so selection can
//! be tested on its own.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use lipsync_core::planner::{CombinationPlanner, PlanOptions};
//!
//! let options = PlanOptions::default().with_seed(42).with_max_combinations(10);
//! let plan = CombinationPlanner::new(options)
//!     .plan_dirs(Path::new("data/Audio"), Path::new("data/Video"))
//!     .unwrap();
//!
//! for combination in plan {
//!     println!("{}", combination.output_name());
//! }
//! ```

mod clock;
mod combination;
mod plan;
mod selector;

pub use clock::{Clock, SystemClock, TIMESTAMP_FORMAT};
pub use combination::Combination;
pub use plan::{CombinationPlanner, Combinations, PlanOptions};
pub use selector::SelectionPolicy;
