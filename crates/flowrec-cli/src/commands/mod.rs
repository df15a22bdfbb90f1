pub mod config;
pub mod detect;
pub mod global_test;
pub mod reconcile;
pub mod tolerance;
pub mod util;
pub mod validate;
