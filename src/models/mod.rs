pub mod collector;
pub mod collector_run;
pub mod event;
pub mod job;
pub mod message;
pub mod query;
