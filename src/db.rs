//! Reading cheat databases and writing the split output

use crate::splitter::Groups;
use crate::splitter::SplitStats;
use crate::splitter::Splitter;

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use log::debug;
use log::info;
use log::warn;
use snafu::ensure;
use snafu::ResultExt;
use snafu::Snafu;

/// Error splitting a cheat database
#[derive(Debug, Snafu)]
pub enum Error {
    /// Input database does not exist
    #[snafu(display("Input file not found: {}", path.display()))]
    InputNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Input database could not be read
    #[snafu(display("Could not read {}: {}", path.display(), source))]
    ReadInput {
        /// Path of the database
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Output directory could not be created
    #[snafu(display("Could not create output directory {}: {}", path.display(), source))]
    CreateOutputDir {
        /// Path of the directory
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// An output file could not be written
    #[snafu(display("Could not write {}: {}", path.display(), source))]
    WriteOutput {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    /// Number of files written, one per distinct output key
    pub files_written: usize,
    /// Directory the files were written to
    pub output_dir: PathBuf,
    /// Counters from splitting
    pub stats: SplitStats,
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of replacing them
///
/// ```
/// use cheat_db_split::db::decode_lossy;
///
/// assert_eq!(decode_lossy(b"_S UL\xffUS-10080\n"), "_S ULUS-10080\n");
/// ```
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Split text into lines, normalizing `\r\n` and lone `\r` to `\n`
///
/// Every line keeps its terminator, except possibly the last one.
///
/// ```
/// use cheat_db_split::db::lines;
///
/// assert_eq!(lines("a\r\nb\rc\nd"), vec!["a\n", "b\n", "c\n", "d"]);
/// ```
pub fn lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    normalized
        .split_inclusive('\n')
        .map(|line| line.to_string())
        .collect()
}

/// Split the database at `input` and return the groups without writing them
pub fn read_groups(input: &Path) -> Result<(Groups, SplitStats), Error> {
    ensure!(input.exists(), InputNotFound { path: input });

    let bytes = fs::read(input).context(ReadInput { path: input })?;
    let text = decode_lossy(&bytes);
    if text.len() < bytes.len() {
        debug!(
            "{}: dropped {} undecodable bytes",
            input.display(),
            bytes.len() - text.len()
        );
    }

    let mut splitter = Splitter::new();
    for line in lines(&text) {
        splitter.push_line(&line);
    }
    Ok(splitter.finish())
}

/// Write one `<key>.ini` file per group into `output_dir`, replacing any
/// existing file
///
/// Returns the number of files written.
pub fn write_groups(groups: &Groups, output_dir: &Path) -> Result<usize, Error> {
    let mut files_written = 0;
    for group in groups {
        let path = output_dir.join(group.file_name());
        debug!(
            "writing {} ({} blocks)",
            path.display(),
            group.blocks().len()
        );
        fs::write(&path, group.text()).context(WriteOutput { path: &path })?;
        files_written += 1;
    }
    Ok(files_written)
}

/// Split the cheat database at `input` into `output_dir`
///
/// The input is checked before anything is created. The output directory and
/// its parents are created if missing.
pub fn split_cheat_db(input: &Path, output_dir: &Path) -> Result<SplitReport, Error> {
    info!("splitting {} into {}", input.display(), output_dir.display());

    let (groups, stats) = read_groups(input)?;

    fs::create_dir_all(output_dir).context(CreateOutputDir { path: output_dir })?;

    if stats.unknown > 0 {
        warn!(
            "{} block(s) had no usable game code and were filed as UNKNOWN_####",
            stats.unknown
        );
    }
    debug!(
        "{} blocks, {} duplicates dropped, {} preamble lines dropped",
        stats.blocks, stats.duplicates, stats.preamble_lines
    );

    let files_written = write_groups(&groups, output_dir)?;
    info!("wrote {} files", files_written);

    Ok(SplitReport {
        files_written,
        output_dir: output_dir.to_path_buf(),
        stats,
    })
}
