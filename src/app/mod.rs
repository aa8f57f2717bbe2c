pub mod adb;
pub mod archive;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod models;
pub mod workspace;
