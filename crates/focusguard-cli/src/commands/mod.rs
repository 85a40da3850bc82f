pub mod apps;
pub mod blocking;
pub mod config;
pub mod history;
pub mod simulate;
pub mod sites;
pub mod status;
pub mod watch;
pub mod window;
