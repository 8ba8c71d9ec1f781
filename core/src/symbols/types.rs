//! Core types for the symbol table.

use super::monomial::Monomial;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Assumption attached to a free symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assumption {
    Positive,
    Real,
    Nonzero,
}

impl Assumption {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "positive" => Some(Self::Positive),
            "real" => Some(Self::Real),
            "nonzero" => Some(Self::Nonzero),
            _ => None,
        }
    }
}

impl std::fmt::Display for Assumption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Real => write!(f, "real"),
            Self::Nonzero => write!(f, "nonzero"),
        }
    }
}

/// A free algebraic unknown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub assumptions: Vec<Assumption>,
}

impl Symbol {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            assumptions: Vec::new(),
        }
    }

    pub fn positive(name: &str) -> Self {
        Self {
            name: name.to_string(),
            assumptions: vec![Assumption::Positive],
        }
    }

    /// `positive` implies `real` and `nonzero`
    pub fn satisfies(&self, assumption: Assumption) -> bool {
        self.assumptions.contains(&assumption)
            || (assumption != Assumption::Positive
                && self.assumptions.contains(&Assumption::Positive))
    }
}

/// A name bound to a simplified expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    /// Expression text as written in the declaration
    pub expression: String,
    /// Simplified value at the time of binding
    pub value: Monomial,
}

impl Binding {
    pub fn new(name: &str, expression: &str, value: Monomial) -> Self {
        Self {
            name: name.to_string(),
            expression: expression.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    Symbol(Symbol),
    Binding(Binding),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Self::Symbol(s) => &s.name,
            Self::Binding(b) => &b.name,
        }
    }

    /// Value used when the name is substituted into an expression
    pub fn value(&self) -> Monomial {
        match self {
            Self::Symbol(s) => Monomial::symbol(&s.name),
            Self::Binding(b) => b.value.clone(),
        }
    }
}

/// All names known to a session, in declaration order.
/// Redefining a name overwrites its entry but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    entries: BTreeMap<String, Entry>,
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a free symbol. Returns the entry it replaced, if any.
    pub fn declare(&mut self, symbol: Symbol) -> Option<Entry> {
        self.insert(Entry::Symbol(symbol))
    }

    /// Bind a name. Returns the entry it replaced, if any.
    pub fn bind(&mut self, binding: Binding) -> Option<Entry> {
        self.insert(Entry::Binding(binding))
    }

    fn insert(&mut self, entry: Entry) -> Option<Entry> {
        let name = entry.name().to_string();
        let previous = self.entries.insert(name.clone(), entry);
        if previous.is_none() {
            self.order.push(name);
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        match self.entries.get(name)? {
            Entry::Binding(b) => Some(b),
            Entry::Symbol(_) => None,
        }
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        match self.entries.get(name)? {
            Entry::Symbol(s) => Some(s),
            Entry::Binding(_) => None,
        }
    }

    pub fn value(&self, name: &str) -> Option<Monomial> {
        self.entries.get(name).map(Entry::value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// True only for a free symbol declared `positive`
    pub fn is_positive(&self, name: &str) -> bool {
        self.symbol(name)
            .is_some_and(|s| s.satisfies(Assumption::Positive))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn ordered_entries(&self) -> Vec<&Entry> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
