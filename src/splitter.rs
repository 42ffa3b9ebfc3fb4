//! Block segmentation and per-key deduplication
//!
//! A [`Splitter`] is fed lines in order. A marker line (see
//! [`code::is_marker`]) closes the open block, if any, and opens a new one.
//! Other lines are appended to the open block, or dropped when no block has
//! been opened yet. Closing a block files its text under its [`OutputKey`],
//! skipping it if that group already holds the exact same text.
//!
//! ```
//! use cheat_db_split::splitter::split;
//!
//! let groups = split(vec![
//!     "header\n",
//!     "_S ULUS-10080\n",
//!     "_C0 Infinite HP\n",
//!     "_S ULUS-10080\n",
//!     "_C0 Infinite HP\n",
//! ]);
//!
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups.iter().next().unwrap().text(), "_S ULUS-10080\n_C0 Infinite HP\n");
//! ```

use crate::code;
use crate::code::OutputKey;

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::Hash;
use std::hash::Hasher;

use log::trace;

fn text_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Deduplicated blocks filed under one output key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    key: String,
    blocks: Vec<String>,
    /// Text hash to indices into `blocks`
    seen: HashMap<u64, Vec<usize>>,
}

impl Group {
    fn new(key: String) -> Self {
        Group {
            key,
            blocks: Vec::new(),
            seen: HashMap::new(),
        }
    }

    /// Add a block unless the exact same text is already present
    ///
    /// Returns whether the block was added.
    fn insert(&mut self, block: String) -> bool {
        let blocks = &mut self.blocks;
        let candidates = self.seen.entry(text_hash(&block)).or_default();
        if candidates.iter().any(|&idx| blocks[idx] == block) {
            return false;
        }
        candidates.push(blocks.len());
        blocks.push(block);
        true
    }

    /// Final key the group is filed under, e.g. `ULUS10080` or `UNKNOWN_0001`
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name of the file this group is written to
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.key, code::EXTENSION)
    }

    /// Distinct block texts in first-seen order
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    /// Concatenated block texts, i.e. the output file contents
    pub fn text(&self) -> String {
        self.blocks.concat()
    }
}

/// Output groups in first-seen key order
///
/// Groups are keyed by the rendered key, so a game code that reads
/// `UNKNOWN_0001` shares its group with the synthetic key of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groups {
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl Groups {
    fn entry(&mut self, key: &OutputKey) -> &mut Group {
        let key = key.to_string();
        let groups = &mut self.groups;
        let idx = *self.index.entry(key.clone()).or_insert_with(|| {
            groups.push(Group::new(key));
            groups.len() - 1
        });
        &mut self.groups[idx]
    }

    /// Look up the group for a final key such as `ULUS10080`
    pub fn get(&self, key: &str) -> Option<&Group> {
        self.index.get(key).map(|&idx| &self.groups[idx])
    }

    /// Iterate over groups in first-seen key order
    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    /// Number of distinct output keys
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no block was found at all
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a> IntoIterator for &'a Groups {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Counters collected while splitting
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SplitStats {
    /// Blocks finalized, duplicates included
    pub blocks: usize,
    /// Blocks dropped because their group already held the same text
    pub duplicates: usize,
    /// Blocks filed under an `UNKNOWN_####` key
    pub unknown: usize,
    /// Lines dropped because they came before the first marker
    pub preamble_lines: usize,
}

/// The block currently being accumulated
#[derive(Debug)]
struct OpenBlock {
    /// Derived key, or `None` if one is synthesized when the block closes
    key: Option<String>,
    lines: Vec<String>,
}

/// Single-pass accumulator that splits lines into deduplicated groups
#[derive(Debug)]
pub struct Splitter {
    current: Option<OpenBlock>,
    next_unknown: u32,
    groups: Groups,
    stats: SplitStats,
}

impl Default for Splitter {
    fn default() -> Self {
        Splitter {
            current: None,
            next_unknown: 1,
            groups: Groups::default(),
            stats: SplitStats::default(),
        }
    }
}

impl Splitter {
    /// Create an empty splitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next input line, terminator included
    pub fn push_line(&mut self, line: &str) {
        if code::is_marker(line) {
            self.finalize();
            let key = code::derive_key(line);
            trace!("block start: {:?}", key);
            self.current = Some(OpenBlock {
                key,
                lines: vec![line.to_string()],
            });
        } else {
            match &mut self.current {
                Some(block) => block.lines.push(line.to_string()),
                None => self.stats.preamble_lines += 1,
            }
        }
    }

    /// Counters collected so far
    pub fn stats(&self) -> SplitStats {
        self.stats
    }

    /// Close the trailing block and return the groups with the final counters
    pub fn finish(mut self) -> (Groups, SplitStats) {
        self.finalize();
        (self.groups, self.stats)
    }

    fn finalize(&mut self) {
        let block = match self.current.take() {
            Some(block) if !block.lines.is_empty() => block,
            _ => return,
        };

        // Unknown keys are numbered here, in finalize order
        let key = match block.key {
            Some(code) => OutputKey::Code(code),
            None => {
                let key = OutputKey::Unknown(self.next_unknown);
                self.next_unknown += 1;
                self.stats.unknown += 1;
                key
            }
        };

        let text = block.lines.concat();
        trace!("block end: {} ({} bytes)", key, text.len());

        self.stats.blocks += 1;
        if !self.groups.entry(&key).insert(text) {
            self.stats.duplicates += 1;
        }
    }
}

/// Split a sequence of lines into deduplicated groups
///
/// Lines are expected to keep their terminators; block texts are the exact
/// concatenation of their lines.
pub fn split<I, S>(lines: I) -> Groups
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut splitter = Splitter::new();
    for line in lines {
        splitter.push_line(line.as_ref());
    }
    splitter.finish().0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(groups: &Groups) -> Vec<(String, String)> {
        groups
            .iter()
            .map(|group| (group.file_name(), group.text()))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let groups = split(Vec::<&str>::new());
        assert!(groups.is_empty());
        assert_eq!(groups.len(), 0);
    }

    #[test]
    fn test_no_markers() {
        let mut splitter = Splitter::new();
        for line in &["_C0 Infinite HP\n", "0x00001234 0x0000270F\n", "\n"] {
            splitter.push_line(line);
        }
        let (groups, stats) = splitter.finish();
        assert!(groups.is_empty());
        assert_eq!(stats.preamble_lines, 3);
        assert_eq!(stats.blocks, 0);
    }

    #[test]
    fn test_preamble_dropped() {
        let groups = split(vec![
            "; cheat database\n",
            "_C0 stray\n",
            "_S ULUS-10080\n",
            "_G Game\n",
        ]);
        assert_eq!(
            files(&groups),
            vec![("ULUS10080.ini".to_string(), "_S ULUS-10080\n_G Game\n".to_string())]
        );
    }

    #[test]
    fn test_duplicate_blocks() {
        let block = ["_S ULUS-10080\n", "_G Game\n", "_C0 Max Money\n"];
        let lines = block.iter().chain(&block).chain(&block).collect::<Vec<_>>();
        let mut splitter = Splitter::new();
        for line in lines {
            splitter.push_line(line);
        }
        let (groups, stats) = splitter.finish();

        let group = groups.get("ULUS10080").unwrap();
        assert_eq!(group.blocks(), &[block.concat()]);
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.duplicates, 2);
    }

    #[test]
    fn test_distinct_blocks_same_key() {
        let groups = split(vec![
            "_S UL-US-10080\n",
            "_C0 A\n",
            "_S ULUS-10080\n",
            "_C0 B\n",
            "_S UL-US-10080\n",
            "_C0 A\n",
        ]);
        let group = groups.get("ULUS10080").unwrap();
        assert_eq!(
            group.blocks(),
            &["_S UL-US-10080\n_C0 A\n", "_S ULUS-10080\n_C0 B\n"]
        );
    }

    #[test]
    fn test_same_text_different_keys_not_deduplicated() {
        let groups = split(vec!["_S A\n", "_C0 X\n", "_S B\n", "_C0 X\n", "_S A\n", "_C0 X\n"]);
        assert_eq!(
            files(&groups),
            vec![
                ("A.ini".to_string(), "_S A\n_C0 X\n".to_string()),
                ("B.ini".to_string(), "_S B\n_C0 X\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_key_order_first_seen() {
        let groups = split(vec!["_S ZZZ\n", "_S AAA\n", "_S MMM\n", "_S AAA\n"]);
        let keys = groups.iter().map(|g| g.key().to_string()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["ZZZ", "AAA", "MMM"]);
    }

    #[test]
    fn test_unknown_keys() {
        let mut splitter = Splitter::new();
        for line in &[
            "_S\n",
            "_C0 first\n",
            "_S ULUS-10080\n",
            "_S !!!\n",
            "_C0 second\n",
            "_S\n",
        ] {
            splitter.push_line(line);
        }
        let (groups, stats) = splitter.finish();

        assert_eq!(
            files(&groups),
            vec![
                ("UNKNOWN_0001.ini".to_string(), "_S\n_C0 first\n".to_string()),
                ("ULUS10080.ini".to_string(), "_S ULUS-10080\n".to_string()),
                ("UNKNOWN_0002.ini".to_string(), "_S !!!\n_C0 second\n".to_string()),
                ("UNKNOWN_0003.ini".to_string(), "_S\n".to_string()),
            ]
        );
        assert_eq!(stats.unknown, 3);
    }

    #[test]
    fn test_unknown_blocks_never_merge() {
        let groups = split(vec!["_S\n", "_S\n"]);
        assert_eq!(groups.len(), 2);
        assert!(groups.get("UNKNOWN_0001").is_some());
        assert!(groups.get("UNKNOWN_0002").is_some());
    }

    #[test]
    fn test_code_named_like_unknown_shares_group() {
        let mut splitter = Splitter::new();
        for line in &["_S UNKNOWN_0001\n", "_C0 A\n", "_S\n", "_C0 B\n"] {
            splitter.push_line(line);
        }
        let (groups, stats) = splitter.finish();

        assert_eq!(groups.len(), 1);
        assert_eq!(
            files(&groups),
            vec![(
                "UNKNOWN_0001.ini".to_string(),
                "_S UNKNOWN_0001\n_C0 A\n_S\n_C0 B\n".to_string()
            )]
        );
        assert_eq!(stats.unknown, 1);
    }

    #[test]
    fn test_group_insert() {
        let mut group = Group::new("ULUS10080".to_string());
        assert!(group.insert("_S A\n".to_string()));
        assert!(group.insert("_S B\n".to_string()));
        assert!(!group.insert("_S A\n".to_string()));
        assert!(!group.insert("_S B\n".to_string()));
        assert!(group.insert("_S A \n".to_string()));
        assert_eq!(group.blocks(), &["_S A\n", "_S B\n", "_S A \n"]);
        assert_eq!(group.file_name(), "ULUS10080.ini");
    }

    #[test]
    fn test_indented_marker() {
        let groups = split(vec!["  _S ULJM-05500\n", "_C0 X\n", "\t_S ULJM-05500\n"]);
        let group = groups.get("ULJM05500").unwrap();
        assert_eq!(group.blocks(), &["  _S ULJM-05500\n_C0 X\n", "\t_S ULJM-05500\n"]);
    }

    #[test]
    fn test_trailing_block_without_terminator() {
        let groups = split(vec!["_S NPJH-50148\n", "_C0 Last"]);
        assert_eq!(
            groups.get("NPJH50148").unwrap().text(),
            "_S NPJH-50148\n_C0 Last"
        );
    }

    #[test]
    fn test_stats_while_running() {
        let mut splitter = Splitter::new();
        splitter.push_line("junk\n");
        splitter.push_line("_S A\n");
        assert_eq!(splitter.stats().preamble_lines, 1);
        assert_eq!(splitter.stats().blocks, 0);
        splitter.push_line("_S B\n");
        assert_eq!(splitter.stats().blocks, 1);
    }
}
