//! # framecast-recv
//!
//! Listens for framecast datagrams, reassembles them and hands the newest
//! completed frame to a sink: a log line, a raw file, or a PPM image.

pub mod config;
