pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
pub mod types;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;
