pub mod changes;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod evaluate;
pub mod gate;
pub mod model;
pub mod parsers;
pub mod report;
pub mod threshold;
