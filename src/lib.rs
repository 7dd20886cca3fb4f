//! PromptCanvas - a password-gated web page for text-to-image generation
//!
//! This library provides the generation pipeline, its session handling and
//! the web pages that drive it.

pub mod api;
pub mod config;
pub mod models;
pub mod pages;
pub mod services;
