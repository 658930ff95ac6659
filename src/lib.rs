pub mod cli;
pub mod commands;
pub mod config;
pub mod contracts;
pub mod error;
pub mod mining;
pub mod network;
pub mod rpc;
