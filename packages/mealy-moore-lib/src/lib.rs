pub mod automaton;
pub mod config;
pub mod convert;
pub mod error;
pub mod logger;
pub mod validation;
