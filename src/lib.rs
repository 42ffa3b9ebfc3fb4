//! Split a flat cheat database into one file per game
//!
//! A cheat database is a single text file made of blocks. Each block starts
//! with an `_S <game code>` line and runs until the next one. This crate
//! files every block under its game code, drops exact duplicate blocks, and
//! writes one `<code>.ini` file per game.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let report = cheat_db_split::split_cheat_db(Path::new("cheat.db"), Path::new("output"))?;
//! println!("Wrote {} files", report.files_written);
//! # Ok::<(), cheat_db_split::db::Error>(())
//! ```

pub mod code;
pub mod db;
pub mod splitter;

pub use code::OutputKey;
pub use db::split_cheat_db;
pub use db::SplitReport;
pub use splitter::split;
pub use splitter::Groups;
pub use splitter::Splitter;
