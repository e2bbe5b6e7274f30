// Library for tests to access modules

pub mod alarm;
pub mod config;
pub mod models;
pub mod notifier;
pub mod poller;
pub mod rolling_window;
pub mod routes;
pub mod source;
pub mod version;
