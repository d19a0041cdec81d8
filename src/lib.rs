pub mod checkin;
pub mod config;
pub mod dashboard;
pub mod output;
pub mod scoring;
