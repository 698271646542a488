pub(crate) mod bootstrap;
mod capture;
mod config;
mod gameplay;
pub(crate) mod loop_runner;
mod onset;
mod pitch;
mod rhythm;
