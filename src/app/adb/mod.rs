pub mod bugreport;
pub mod capture;
pub mod device;
pub mod locator;
pub mod parse;
pub mod paths;
pub mod runner;
pub mod transfer;
