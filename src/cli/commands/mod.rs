pub mod config;
pub mod diff;
pub mod export;
pub mod exporters;
pub mod generate;
pub mod validate;
