pub mod activate;
pub mod commands;
pub mod doctor;
pub mod envctx;
pub mod error;
pub mod flags;
pub mod paths;
pub mod probe;
pub mod prompt;
pub mod registry;
pub mod state;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
