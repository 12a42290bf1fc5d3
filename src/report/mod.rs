//! Report generation.
//!
//! Text and JSON summaries live in [`generator`], CSV exports in [`csv`].

pub mod csv;
pub mod generator;

pub use self::csv::{write_episode_csv, FrameCsvWriter};
pub use generator::{generate_json_report, generate_text_report, Summary};
