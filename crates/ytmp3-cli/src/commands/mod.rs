pub mod batch;
pub mod config;
pub mod convert;
pub mod doctor;
pub mod info;
pub mod interactive;
pub mod setup;
