pub mod api;
pub mod core;
pub mod ledger;
pub mod pipeline;
pub mod report;
