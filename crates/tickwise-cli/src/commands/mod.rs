pub mod config;
pub mod countdown;
pub mod history;
pub mod interval;
pub mod session;
pub mod stopwatch;
pub mod watch;
