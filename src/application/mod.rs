pub mod commands;
pub mod config;
pub mod notifier;
pub mod reconcile;
pub mod startup;
pub mod state;
