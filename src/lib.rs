//! Job tracker
//!
//! Relational store for asynchronous processing jobs: users submit jobs that
//! point at input objects in S3, and dispatchers claim them, attach the compute
//! task that runs them, and record how they finished.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
