//! The ordered shortcut-to-symbol replacement table and the converter.
//!
//! Order is part of the contract: rules are applied sequentially, each rule
//! fully applied across the string before the next one runs. A rule early in
//! the table can therefore create or destroy matches for a later rule, which
//! is why `~ee` must be listed before `ee`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// The default vocabulary, in application order.
const DEFAULT_REPLACEMENTS: &[(&str, &str)] = &[
    ("===", "≡"),     // Logically equivalent
    ("!=", "≠"),      // Is not equal
    ("...", "∴"),     // Therefore
    ("EE", "∃"),      // There exists
    ("AA", "∀"),      // For all
    ("<->", "↔"),     // Iff
    ("->", "→"),      // Implies
    ("=>", "⇒"),      // Implies/equals
    ("~ee", "∉"),     // Is not an element of
    ("ee", "∈"),      // Is an element of
    ("!", "~"),       // Not
    ("/\\", "∧"),     // And
    ("\\/", "∨"),     // Or
    ("xor", "⊕"),     // Xor
    ("_0", "°"),      // Degrees
    ("UU", "𝕌"),      // Universal set
    ("RR", "ℝ"),      // Real numbers
    ("QQ", "ℚ"),      // Rational numbers
    ("ZZ", "ℤ"),      // Integers
    ("NN", "ℕ"),      // Natural numbers
    ("pi", "π"),      // Pi
    (">=", "≥"),      // Greater than or equal to
    ("<=", "≤"),      // Less than or equal to
    ("\\sub", "⊆"),   // Is a subset of
    ("\\sup", "⊇"),   // Is a superset of
    ("\\psub", "⊊"),  // Is a proper subset of
    ("\\nsub", "⊄"),  // Not a subset
    ("\\nsup", "⊅"),  // Not a superset
    ("uu", "∪"),      // Union
    ("nn", "∩"),      // Intersection
];

/// A single shortcut-to-symbol rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// ASCII token the user types (e.g. `->`)
    pub shortcut: String,
    /// Unicode text the shortcut expands to (e.g. `→`)
    pub symbol: String,
}

impl Replacement {
    pub fn new(shortcut: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            shortcut: shortcut.into(),
            symbol: symbol.into(),
        }
    }
}

/// An ordered set of replacement rules with unique shortcuts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementTable {
    entries: Vec<Replacement>,
}

impl Default for ReplacementTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReplacementTable {
    /// Creates a table with no rules.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a table holding the default vocabulary.
    pub fn builtin() -> Self {
        Self {
            entries: DEFAULT_REPLACEMENTS
                .iter()
                .map(|(shortcut, symbol)| Replacement::new(*shortcut, *symbol))
                .collect(),
        }
    }

    /// Adds a rule to the end of the table.
    ///
    /// If the shortcut is already present its symbol is updated in place and
    /// the rule keeps its position, so application order stays stable.
    pub fn add(&mut self, shortcut: impl Into<String>, symbol: impl Into<String>) {
        let shortcut = shortcut.into();
        let symbol = symbol.into();

        if let Some(existing) = self.entries.iter_mut().find(|r| r.shortcut == shortcut) {
            existing.symbol = symbol;
        } else {
            self.entries.push(Replacement { shortcut, symbol });
        }
    }

    /// Returns the symbol a shortcut expands to, if the shortcut is defined.
    pub fn get(&self, shortcut: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|r| r.shortcut == shortcut)
            .map(|r| r.symbol.as_str())
    }

    /// Applies every rule to `text` in table order.
    ///
    /// Each rule is a single non-overlapping greedy pass over the whole
    /// string; replaced output is never re-scanned by the same rule.
    pub fn convert(&self, text: &str) -> String {
        self.entries
            .iter()
            .fold(text.to_string(), |acc, r| acc.replace(&r.shortcut, &r.symbol))
    }

    /// Iterates the rules in application order.
    pub fn iter(&self) -> impl Iterator<Item = &Replacement> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The replacement table as shared between the REPL loop and the poll task.
pub type SharedTable = Arc<RwLock<ReplacementTable>>;
