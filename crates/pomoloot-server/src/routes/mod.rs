//! HTTP handlers, grouped by resource.

pub mod activities;
pub mod catalog;
pub mod labels;
pub mod rewards;
pub mod timer;
