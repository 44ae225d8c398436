//! Stroke Navigator - Scripted post-discharge stroke follow-up calls
//!
//! This crate walks a patient through a YAML-defined follow-up script,
//! records their answers, and ends the call with emergency instructions the
//! moment an emergency keyword is heard.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
