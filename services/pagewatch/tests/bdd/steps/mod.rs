//! BDD step definitions for pagewatch service

pub mod detection_steps;
pub mod notification_steps;
