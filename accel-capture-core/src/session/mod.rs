pub mod commands;
pub mod controller;
pub mod reader;
pub mod shutdown;
