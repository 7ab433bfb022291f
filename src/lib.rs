pub mod answer;
pub mod api;
pub mod ask;
pub mod cli;
pub mod config;
pub mod documents;
pub mod llm;
pub mod prompt;
pub mod services;
pub mod storage;
pub mod upload;
