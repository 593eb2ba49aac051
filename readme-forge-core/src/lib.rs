#![doc = "readme-forge-core: core pipeline library for readme-forge."]

//! Everything between a repository URL and a finished README (or pull request)
//! lives here. Network access is behind the traits in [`contract`]; concrete
//! clients are provided by the `readme-forge` binary crate.
//!
//! # Usage
//! Build a [`config::PipelineConfig`], provide implementations of the
//! [`contract`] traits, and call [`pipeline::generate_readme`] /
//! [`pipeline::publish`].

pub mod aggregate;
pub mod config;
pub mod contract;
pub mod documentation;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod publish;
pub mod readme;
pub mod repository;

pub use error::{Error, Result};
