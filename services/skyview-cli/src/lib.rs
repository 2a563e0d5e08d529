//! Command-line front end for the skyview workspace.
//!
//! Images travel as JSON-encoded [`SkyImage`](sky_common::SkyImage)
//! documents and overlays as [`OverlayDocument`]s. Each subcommand of the
//! `skyview` binary maps onto one function in [`commands`].

pub mod commands;
pub mod io;

pub use commands::{ImageStats, OverlayDocument, StretchTables};
