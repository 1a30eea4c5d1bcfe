/// Category dictionary for string columns
///
/// Categorical fields such as country, industry or rating repeat a handful of
/// labels across thousands of securities. Each string column keeps one
/// `StringInterner`: every distinct label is stored once and rows hold a
/// 32-bit code. The distinct values of a column (matrix rows, multi-select
/// options) come straight from the dictionary without scanning the rows.
///
/// # Examples
///
/// ```
/// use portfolio_monitor::StringInterner;
///
/// let mut interner = StringInterner::new();
///
/// let france = interner.intern("France");
/// let italy = interner.intern("Italy");
/// assert_eq!(interner.intern("France"), france);
/// assert_ne!(france, italy);
///
/// assert_eq!(interner.resolve(france), Some("France"));
/// assert_eq!(interner.sorted_strings(), vec!["France", "Italy"]);
/// ```

use std::collections::HashMap;

/// Interned string ID type
pub type StringId = u32;

/// Stores each distinct string once and hands out stable integer codes.
#[derive(Debug, Clone, Default)]
pub struct StringInterner {
    string_to_id: HashMap<String, StringId>,
    /// Stores strings by ID (index = ID)
    id_to_string: Vec<String>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the code of an existing copy if any.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.string_to_id.get(s) {
            return id;
        }

        let id = self.id_to_string.len() as StringId;
        self.id_to_string.push(s.to_string());
        self.string_to_id.insert(s.to_string(), id);
        id
    }

    pub fn resolve(&self, id: StringId) -> Option<&str> {
        self.id_to_string.get(id as usize).map(|s| s.as_str())
    }

    /// Number of distinct strings.
    pub fn len(&self) -> usize {
        self.id_to_string.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_string.is_empty()
    }

    /// Distinct strings in ascending lexical order.
    pub fn sorted_strings(&self) -> Vec<&str> {
        let mut strings: Vec<&str> = self.id_to_string.iter().map(|s| s.as_str()).collect();
        strings.sort_unstable();
        strings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interner_basic() {
        let mut interner = StringInterner::new();

        let id1 = interner.intern("Financials");
        let id2 = interner.intern("Utilities");
        let id3 = interner.intern("Financials");

        assert_eq!(id1, id3);
        assert_ne!(id1, id2);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_resolve_unknown_id() {
        let mut interner = StringInterner::new();
        let id = interner.intern("Germany");

        assert_eq!(interner.resolve(id), Some("Germany"));
        assert_eq!(interner.resolve(id + 1), None);
    }

    #[test]
    fn test_sorted_strings() {
        let mut interner = StringInterner::new();
        interner.intern("Italy");
        interner.intern("France");
        interner.intern("Italy");
        interner.intern("Belgium");

        assert_eq!(interner.sorted_strings(), vec!["Belgium", "France", "Italy"]);
    }

    #[test]
    fn test_interner_empty_string() {
        let mut interner = StringInterner::new();

        let id = interner.intern("");
        assert_eq!(interner.resolve(id), Some(""));
    }
}
