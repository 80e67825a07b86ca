pub mod api;
pub mod cache;
pub mod config;
pub mod data_models;
pub mod error;
pub mod generator;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod search;
pub mod snippet;
pub mod stages;
