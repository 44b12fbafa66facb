//! cxxrepl CLI library.
//!
//! Configuration, meta-commands and the terminal front ends for the
//! `cxxrepl` binary.

pub mod colors;
pub mod commands;
pub mod config;
pub mod logging;
pub mod repl;

#[cfg(test)]
mod test_util;
