#![doc = "deepstate-kml: mirror a GeoJSON front-line feed as a KML file in a git repository."]

//! One iteration fetches the feed ([`fetch`]), converts it ([`convert`],
//! [`kml`]) and publishes the file ([`publish`], [`git`]); [`synchronise`]
//! repeats that on a fixed interval. [`contract`] holds the traits that let
//! tests replace the network and git.

pub mod cli;
pub mod config;
pub mod contract;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod geojson;
pub mod git;
pub mod kml;
pub mod load_config;
pub mod publish;
pub mod synchronise;

pub use cli::{run, Cli, Commands};
