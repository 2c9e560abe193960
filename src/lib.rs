//! Newsdesk - A news publishing backend
//!
//! This library provides accounts with ordered roles, bearer token
//! authentication, categories and news articles with paged queries.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
