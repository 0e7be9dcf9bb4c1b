pub mod algorithms;
pub mod capability;
pub mod config;
pub mod dataset;
pub mod display;
pub mod errors;
pub mod runner;
pub mod types;
pub mod verify;
pub mod workloads;
