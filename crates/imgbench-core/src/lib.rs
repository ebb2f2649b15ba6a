pub mod array;
pub mod config;
pub mod consts;
pub mod contract;
pub mod error;
pub mod expr;
pub mod invoke;
pub mod io;
pub mod loader;
pub mod params;
pub mod provider;
pub mod report;
pub mod session;
pub mod value;
pub mod worker;
