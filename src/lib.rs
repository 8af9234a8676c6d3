// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod config;
pub mod generator;
pub mod layout;
pub mod parser;
pub mod schema;
