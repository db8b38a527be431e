pub mod config;
pub mod document;
pub mod geometry;
pub mod key;
pub mod mode;
