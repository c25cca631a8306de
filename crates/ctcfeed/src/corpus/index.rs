//! # Frame-Count Index

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use crate::errors::CFResult;

/// An ordered `{name -> frame count}` index over a corpus split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameCountIndex {
    entries: Vec<(String, usize)>,
}

impl FrameCountIndex {
    /// Append an entry.
    pub fn push<S: Into<String>>(
        &mut self,
        name: S,
        frames: usize,
    ) {
        self.entries.push((name.into(), frames));
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the index empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, frames)` entries, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), *f))
    }

    /// Read an index from a JSON object of `{name: frames}`.
    ///
    /// Entries are ordered by name.
    pub fn read_json<R: Read>(reader: R) -> CFResult<Self> {
        let map: BTreeMap<String, usize> = serde_json::from_reader(reader)?;
        Ok(map.into_iter().collect())
    }

    /// Load an index from a JSON file.
    ///
    /// See [`Self::read_json`].
    pub fn load_json_path<P: AsRef<Path>>(path: P) -> CFResult<Self> {
        let file = File::open(path)?;
        Self::read_json(BufReader::new(file))
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for FrameCountIndex {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(n, f)| (n.into(), f)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_collect() {
        let mut index: FrameCountIndex = [("a", 20), ("b", 10)].into_iter().collect();
        index.push("c", 5);

        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
        assert_eq!(
            index.iter().collect::<Vec<_>>(),
            vec![("a", 20), ("b", 10), ("c", 5)]
        );
        assert!(FrameCountIndex::default().is_empty());
    }

    #[test]
    fn test_read_json() {
        let json = r#"{"fadg0_si1279": 311, "faks0_sa1": 240}"#;
        let index = FrameCountIndex::read_json(json.as_bytes()).unwrap();

        let entries: Vec<(&str, usize)> = index.iter().collect();
        assert_eq!(entries, vec![("fadg0_si1279", 311), ("faks0_sa1", 240)]);

        assert!(FrameCountIndex::read_json("[1, 2]".as_bytes()).is_err());
    }
}
