pub mod config;
pub mod log;
pub mod prefs;
pub mod queue;
pub mod run;
