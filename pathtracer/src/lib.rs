//! A bucketed, multi-threaded Monte Carlo path tracer with Reyes-style lazy
//! dicing of higher-order primitives.
//!
//! Geometry is represented as a flat array of [`primitive::Primitive`]s;
//! anything that is not yet small enough on screen to trace directly
//! (a [`primitive::bilinear::Bilinear`] patch) is split in place until it
//! is, then diced into a micropolygon [`grid::Grid`] and cached by
//! [`cache::GridCache`]. The [`integrator::PathTraceIntegrator`] walks the
//! image in Morton order, tracing each bucket's samples in lockstep
//! wavefronts with next-event estimation against [`scene::Light`]s.

#![warn(rust_2018_idioms)]

pub mod bbox;
pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod film;
pub mod grid;
pub mod integrator;
pub mod math;
pub mod morton;
pub mod primitive;
pub mod queue;
pub mod ray;
pub mod renderer;
pub mod scene;
pub mod stats;
pub mod timesample;

pub use config::Config;
pub use error::{Error, Result};
pub use renderer::Renderer;
pub use scene::{Scene, SceneBuilder};
