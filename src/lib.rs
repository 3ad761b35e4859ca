//! Geometry and pointer interaction for a node-based workflow canvas.
//!
//! The crate is renderer agnostic: [`geometry`] turns a [`workflow::Workflow`]
//! snapshot into screen-ready shapes, and [`interaction`] drives object moves
//! from raw pointer events up to an asynchronous commit. [`svg`] is a static
//! backend over the same geometry.

pub mod config;
pub mod geometry;
pub mod interaction;
pub mod svg;
pub mod workflow;
