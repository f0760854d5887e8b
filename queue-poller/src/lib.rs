pub mod cli;
mod controllers;
pub mod errors;
pub mod services;

pub const DEFAULT_PORT: u16 = 3050;
