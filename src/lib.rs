//! Superstore EDA - interactive sales dashboard
//!
//! Loads a Superstore-style sales table, filters it by order date and
//! Region/State/City, and charts the aggregates in an egui window or as PNGs.

pub mod charts;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod gui;
