pub mod commands;
pub mod fs_utils;
pub mod logging;
pub mod paths;
pub mod settings;
pub mod state;
pub mod ui;
pub mod unit;
pub mod units;

#[cfg(test)]
pub mod test_utils;
