//! Status dashboard bot for a single monitored target.
//!
//! Every cycle: probe the target, classify the reading against configured
//! thresholds, render the result, and edit one persistent Discord message
//! in place. Qualifying status transitions additionally fire a short-lived
//! `@everyone` alert. The message id and last status survive restarts in a
//! small JSON state file.

pub mod config;
pub mod core;
