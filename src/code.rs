//! Block markers and output keys
//!
//! Every block in a cheat database starts with a line like
//!
//! ```text
//! _S UL-US-10080
//! ```
//!
//! The second token is the game code. It is turned into a file-safe key by
//! dropping hyphens and anything outside `[A-Za-z0-9._-]`.
//!
//! ```
//! use cheat_db_split::code::derive_key;
//!
//! assert_eq!(derive_key("_S UL-US-10080 extra-tokens"), Some("ULUS10080".to_string()));
//! assert_eq!(derive_key("_S"), None);
//! assert_eq!(derive_key("_S !!!"), None);
//! ```

use std::fmt;

/// Prefix that opens a new block once leading whitespace is trimmed
pub const MARKER: &str = "_S";

/// Extension of every written output file
pub const EXTENSION: &str = "ini";

/// Check whether `line` starts a new block
///
/// ```
/// use cheat_db_split::code::is_marker;
///
/// assert!(is_marker("_S ULUS-10080\n"));
/// assert!(is_marker("   _S"));
/// assert!(!is_marker("_C0 Infinite HP\n"));
/// ```
pub fn is_marker(line: &str) -> bool {
    line.trim_start_matches(is_space).starts_with(MARKER)
}

/// Unicode whitespace plus the `\x1c`..`\x1f` separator controls, which cheat
/// databases treat as blanks too
fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'
}

/// Derive an output key from a marker line
///
/// Returns `None` when the line has no second token or when nothing of it
/// survives sanitizing.
pub fn derive_key(marker_line: &str) -> Option<String> {
    let code = marker_line
        .split(is_space)
        .filter(|token| !token.is_empty())
        .nth(1)?;
    let key = code
        .chars()
        .filter(|&c| c != '-')
        .filter(|&c| is_safe_char(c))
        .collect::<String>();

    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Final key a block is filed under
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputKey {
    /// Key derived from the game code on the marker line
    Code(String),

    /// Synthetic key for a block without a usable game code
    ///
    /// Numbered from 1 in the order blocks are finalized.
    Unknown(u32),
}

impl OutputKey {
    /// Name of the file this key's group is written to
    ///
    /// ```
    /// use cheat_db_split::code::OutputKey;
    ///
    /// assert_eq!(OutputKey::Code("ULUS10080".into()).file_name(), "ULUS10080.ini");
    /// assert_eq!(OutputKey::Unknown(7).file_name(), "UNKNOWN_0007.ini");
    /// ```
    pub fn file_name(&self) -> String {
        format!("{}.{}", self, EXTENSION)
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputKey::Code(code) => write!(f, "{}", code),
            OutputKey::Unknown(seq) => write!(f, "UNKNOWN_{:04}", seq),
        }
    }
}
