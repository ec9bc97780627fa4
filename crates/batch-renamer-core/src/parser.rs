use std::collections::BTreeMap;

const SEPARATOR: &str = ". ";
const EMPHASIS_MARKERS: [char; 2] = ['*', '`'];

/// Sparse mapping from 1-based batch-local index to a raw candidate name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMapping(BTreeMap<usize, String>);

impl RawMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` at `index` unless the index is already taken.
    /// Returns `false` when the existing entry was kept.
    pub fn insert_first(&mut self, index: usize, name: String) -> bool {
        if self.0.contains_key(&index) {
            return false;
        }
        self.0.insert(index, name);
        true
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(i, n)| (*i, n.as_str()))
    }
}

/// Parses `raw` for a batch of `batch_size` files. Chatter, markdown and
/// malformed lines are skipped; a reply without any usable line yields an
/// empty mapping.
pub fn parse(raw: &str, batch_size: usize) -> RawMapping {
    let mut mapping = RawMapping::new();

    for line in raw.lines() {
        let Some((index, name)) = parse_line(line) else {
            continue;
        };
        if index == 0 || index > batch_size {
            continue;
        }
        let name = clean_name(name);
        if name.is_empty() {
            continue;
        }
        mapping.insert_first(index, name);
    }

    mapping
}

/// Canonical `N. name` rendering of a mapping; [`parse`] reads it back
/// unchanged.
pub fn serialize(mapping: &RawMapping) -> String {
    mapping
        .iter()
        .map(|(index, name)| format!("{index}{SEPARATOR}{name}\n"))
        .collect()
}

fn parse_line(line: &str) -> Option<(usize, &str)> {
    let line = line.trim();
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let (index_text, rest) = line.split_at(digits);
    let name = rest.strip_prefix(SEPARATOR)?;
    let index = index_text.parse::<usize>().ok()?;
    Some((index, name))
}

fn clean_name(name: &str) -> String {
    let without_emphasis: String = name
        .trim()
        .chars()
        .filter(|c| !EMPHASIS_MARKERS.contains(c))
        .collect();
    let trimmed = without_emphasis.trim();
    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    unbracketed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_maps_every_well_formed_line() {
        let raw = "Sure! Here are the names:\n\n1. My Trip\nsome note\n2. [Sunset Walk]\n3. garbage line\nThanks";
        let mapping = parse(raw, 3);
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.get(1), Some("My Trip"));
        assert_eq!(mapping.get(2), Some("Sunset Walk"));
        assert_eq!(mapping.get(3), Some("garbage line"));
    }

    #[test]
    fn test_out_of_range_indices_are_dropped() {
        let mapping = parse("0. zero\n1. one\n4. four\n99999999999999999999999. huge", 3);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get(1), Some("one"));
    }

    #[test]
    fn test_first_duplicate_index_wins() {
        let mapping = parse("1. first\n1. second", 2);
        assert_eq!(mapping.get(1), Some("first"));
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_requires_dot_space_separator() {
        let mapping = parse("1.no-space\n2) paren\n- 3. bullet\n2.  spaced ", 3);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get(2), Some("spaced"));
    }

    #[test]
    fn test_strips_markdown_and_brackets() {
        let raw = "1. **Beach Day.jpg**\n2. `[Mountain View]`\n3. [only-open\n";
        let mapping = parse(raw, 3);
        assert_eq!(mapping.get(1), Some("Beach Day.jpg"));
        assert_eq!(mapping.get(2), Some("Mountain View"));
        assert_eq!(mapping.get(3), Some("[only-open"));
    }

    #[test]
    fn test_indented_lines_and_crlf() {
        let mapping = parse("   1. Alpha\r\n\t2. Beta\r\n", 2);
        assert_eq!(mapping.get(1), Some("Alpha"));
        assert_eq!(mapping.get(2), Some("Beta"));
    }

    #[test]
    fn test_empty_names_are_ignored() {
        let mapping = parse("1. []\n1. ** **\n1. Real", 1);
        assert_eq!(mapping.get(1), Some("Real"));
    }

    #[test]
    fn test_no_valid_lines_yields_empty_mapping() {
        assert!(parse("I cannot help with that.", 3).is_empty());
        assert!(parse("", 3).is_empty());
    }

    #[test]
    fn test_parse_of_serialize_is_identity() {
        let mapping = parse("2. Second.mp4\n1. First name\n3. Third_one", 3);
        let reparsed = parse(&serialize(&mapping), 3);
        assert_eq!(reparsed, mapping);
        assert_eq!(parse(&serialize(&reparsed), 3), reparsed);
    }
}
