pub mod config;
pub mod history;
pub mod prescribe;
pub mod resolve;
