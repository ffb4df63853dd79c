//! Client-side driver that generates a full week of plans.
//!
//! Fourteen jobs (seven days, two alternatives each) run strictly in sequence.
//! Each job calls the generation endpoint, checks the reply carries a `resumo`,
//! resolves the weekday to a date in the current Sunday-based week and
//! merge-writes the plan into that date's daily document. The first failure
//! aborts the rest of the run; documents already written are left as they are.

pub mod calendar;
pub mod client;
pub mod progress;
pub mod runner;
pub mod work;

pub use calendar::{Clock, FixedClock, SystemClock};
pub use client::{GenerationClient, HttpGenerationClient};
pub use progress::{Phase, Progress, ProgressReporter, TOTAL_JOBS};
pub use runner::{JobRecord, Orchestrator, Outcome, RunReport, WaterReset, FAILURE_ALERT};
pub use work::{work_items, Alternative, WorkItem};
