//! Infrastructure layer - stores, external clients, and services

pub mod cache;
pub mod corpus;
pub mod evidence;
pub mod generation;
pub mod logging;
pub mod maintenance;
pub mod retrieval;
pub mod services;
