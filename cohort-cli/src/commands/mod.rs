pub mod clear;
pub mod convert;
pub mod experiments;
pub mod id;
pub mod results;
pub mod retry;
pub mod variant;
