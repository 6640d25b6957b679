pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod forms;
pub mod models;
pub mod output;
pub mod routes;
pub mod screen;
pub mod table;

#[cfg(test)]
mod tests;
