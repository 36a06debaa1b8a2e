//! # framecast-send
//!
//! Captures frames from a [`FrameSource`](framecast_core::FrameSource),
//! splits them into datagrams and streams them to a receiver at a fixed
//! rate.
//!
//! ## Sources
//!
//! - **pattern**: a moving test pattern, zstd-compressed RGB8.
//! - **file**: re-reads an already-encoded image file every tick.

pub mod config;
