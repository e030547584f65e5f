// Meeting Slot Planner Library
pub mod config;
pub mod convert;
pub mod error;
pub mod evaluator;
pub mod participants;
pub mod recommender;
pub mod registry;
pub mod report;
pub mod timezone_utils;
pub mod utils;
pub mod working_hours;
