use std::collections::HashMap;
use std::fmt::Display;

/// An interned string.
///
/// This is fast to move, clone and compare. The associated text lives in the
/// [`Interner`] that produced it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Interned(pub u32);

// hack. we pretty much never want this, and instead to print the associated string.
impl Display for Interned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A string interner, mapping each distinct string to a stable [`Interned`] symbol.
#[derive(Debug, Default)]
pub struct Interner {
    names: HashMap<String, Interned>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: HashMap::with_capacity(capacity),
            strings: Vec::with_capacity(capacity),
        }
    }

    /// Intern the given string, returning its symbol.
    pub fn intern(&mut self, text: &str) -> Interned {
        if let Some(sym) = self.names.get(text) {
            return *sym;
        }
        let sym = Interned(self.strings.len() as u32);
        self.strings.push(text.to_string());
        self.names.insert(text.to_string(), sym);
        sym
    }

    /// Get the string for a symbol previously produced by this interner.
    pub fn lookup(&self, sym: Interned) -> &str {
        self.strings[sym.0 as usize].as_str()
    }

    /// Look up a symbol without interning.
    pub fn reverse_lookup(&self, text: &str) -> Option<Interned> {
        self.names.get(text).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut interner = Interner::new();
        let a = interner.intern("fib");
        let b = interner.intern("acc");
        let a2 = interner.intern("fib");
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(interner.lookup(a), "fib");
        assert_eq!(interner.lookup(b), "acc");
    }

    #[test]
    fn reverse_lookup_does_not_intern() {
        let mut interner = Interner::new();
        assert_eq!(interner.reverse_lookup("missing"), None);
        let sym = interner.intern("present");
        assert_eq!(interner.reverse_lookup("present"), Some(sym));
    }
}
