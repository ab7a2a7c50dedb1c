//! The ordered set of tracked symbols.

/// Normalize user input into a symbol: trimmed and uppercased.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_uppercase();
    (!symbol.is_empty()).then_some(symbol)
}

/// Ordered set of symbols. Insertion order is display order; duplicates are
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedSet {
    symbols: Vec<String>,
}

impl TrackedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a sequence, keeping the first occurrence of each symbol.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for symbol in symbols {
            set.insert(symbol);
        }
        set
    }

    /// Whether `symbol` is a member.
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Append `symbol`. Returns false if it was already a member.
    pub fn insert(&mut self, symbol: impl Into<String>) -> bool {
        let symbol = symbol.into();
        if self.contains(&symbol) {
            return false;
        }
        self.symbols.push(symbol);
        true
    }

    /// Remove `symbol`. Returns false if it was not a member.
    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.symbols.len();
        self.symbols.retain(|s| s != symbol);
        self.symbols.len() != before
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.symbols
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.symbols.clone()
    }
}
