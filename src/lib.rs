pub mod agent;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod page_plan;
pub mod registry;
pub mod report;
pub mod router;
pub mod util;
