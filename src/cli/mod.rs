pub mod convert;
pub mod dashboard;
pub mod setup;
pub mod show;
pub mod ui;
pub mod watch;
