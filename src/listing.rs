//! Directory listings built from raw NLST payloads.

use crate::protocol::{CURRENT_ENTRY, PARENT_ENTRY, ROOT_PATH};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
}

impl Entry {
    pub fn is_parent(&self) -> bool {
        self.name == PARENT_ENTRY
    }
}

/// Entries of one remote directory, in server order, plus a selection
/// cursor that always stays within `0..entries.len()`.
#[derive(Clone, Debug, Default)]
pub struct DirectoryListing {
    pub path: String,
    pub entries: Vec<Entry>,
    pub selected: usize,
}

/// Split an NLST payload on CR/LF, drop blanks and `.`/`..`, and put a
/// synthetic `..` first unless `current_path` is the root.
pub fn build_listing(raw: &[u8], current_path: &str) -> DirectoryListing {
    let text = String::from_utf8_lossy(raw);
    let mut entries = Vec::new();
    if current_path != ROOT_PATH {
        entries.push(Entry {
            name: PARENT_ENTRY.to_string(),
        });
    }
    entries.extend(
        text.split(['\r', '\n'])
            .filter(|line| !line.is_empty() && *line != CURRENT_ENTRY && *line != PARENT_ENTRY)
            .map(|line| Entry {
                name: line.to_string(),
            }),
    );
    DirectoryListing {
        path: current_path.to_string(),
        entries,
        selected: 0,
    }
}

impl DirectoryListing {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.path == ROOT_PATH
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.entries.get(self.selected)
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(l: &DirectoryListing) -> Vec<&str> {
        l.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn subdirectory_gets_synthetic_parent() {
        let l = build_listing(b"a\r\nb\r\n.\r\n..\r\n", "/sub");
        assert_eq!(names(&l), vec!["..", "a", "b"]);
        assert!(l.entries[0].is_parent());
        assert_eq!(l.path, "/sub");
        assert_eq!(l.selected, 0);
    }

    #[test]
    fn root_has_no_parent_entry() {
        let l = build_listing(b"a\r\nb\r\n.\r\n..\r\n", "/");
        assert_eq!(names(&l), vec!["a", "b"]);
        assert!(l.is_root());
    }

    #[test]
    fn mixed_terminators_and_server_order() {
        let l = build_listing(b"zeta\n\nalpha\r\r\nmid\rlast", "/");
        assert_eq!(names(&l), vec!["zeta", "alpha", "mid", "last"]);
    }

    #[test]
    fn empty_payload() {
        assert!(build_listing(b"", "/").is_empty());
        assert_eq!(names(&build_listing(b"\r\n", "/x")), vec![".."]);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut l = build_listing(b"a\r\nb\r\n", "/sub");
        for _ in 0..10 {
            l.select_previous();
        }
        assert_eq!(l.selected, 0);
        for _ in 0..10 {
            l.select_next();
        }
        assert_eq!(l.selected, l.len() - 1);
        assert_eq!(l.selected_entry().unwrap().name, "b");
        l.select_previous();
        assert_eq!(l.selected_entry().unwrap().name, "a");
    }

    #[test]
    fn selection_on_empty_listing_is_a_noop() {
        let mut l = build_listing(b"", "/");
        l.select_next();
        l.select_previous();
        assert_eq!(l.selected, 0);
        assert!(l.selected_entry().is_none());
    }
}
