use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonTerminal {
    pub index: usize,
    pub name: String,
    /// Alternatives in declaration order. The empty body is stored as `[epsilon]`.
    pub productions: Vec<Vec<usize>>,
}

impl NonTerminal {
    pub fn new(index: usize, name: String) -> Self {
        Self {
            index,
            name,
            productions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    NonTerminal(NonTerminal),
    Terminal(String),
    Epsilon,
    /// Referenced in a production body but declared nowhere.
    Undeclared(String),
}

impl Symbol {
    pub fn non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            _ => None,
        }
    }

    pub fn mut_non_terminal(&mut self) -> Option<&mut NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}

/// One alternative of a non-terminal, addressed by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionRef {
    pub head: usize,
    pub alternative: usize,
}

/// A context-free grammar. Built once by [`Grammar::parse`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) symbol_table: HashMap<String, usize>,
    pub(crate) start_symbol: usize,
}

impl Grammar {
    pub(crate) fn new() -> Self {
        let mut g = Self {
            symbols: Vec::new(),
            symbol_table: HashMap::new(),
            start_symbol: 0,
        };

        g.symbols.push(Symbol::Epsilon);
        g.symbol_table.insert(super::EPSILON.to_string(), 0);
        g.add_terminal(super::END_MARK.to_string());

        g
    }

    pub fn epsilon(&self) -> usize {
        0
    }

    pub fn end_mark(&self) -> usize {
        1
    }

    pub fn start_symbol(&self) -> usize {
        self.start_symbol
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Declared terminals, without the end marker.
    pub fn terminal_iter(&self) -> impl Iterator<Item = (usize, &String)> {
        self.symbols
            .iter()
            .enumerate()
            .skip(2)
            .filter_map(|(i, s)| match s {
                Symbol::Terminal(name) => Some((i, name)),
                _ => None,
            })
    }

    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &NonTerminal> {
        self.symbols.iter().filter_map(|s| s.non_terminal())
    }

    pub fn non_terminal(&self, index: usize) -> Option<&NonTerminal> {
        self.symbols.get(index).and_then(|s| s.non_terminal())
    }

    /// False for indices this grammar does not own.
    pub fn is_terminal(&self, index: usize) -> bool {
        self.symbols.get(index).map_or(false, Symbol::is_terminal)
    }

    /// Body of the referenced alternative, `None` if the grammar has no such production.
    pub fn production(&self, production: ProductionRef) -> Option<&[usize]> {
        self.non_terminal(production.head)
            .and_then(|nt| nt.productions.get(production.alternative))
            .map(Vec::as_slice)
    }

    pub fn get_symbol_index(&self, name: &str) -> Option<usize> {
        self.symbol_table.get(name).cloned()
    }

    pub(crate) fn add_non_terminal(&mut self, name: &str) -> usize {
        let idx = self.symbols.len();
        self.symbols
            .push(Symbol::NonTerminal(NonTerminal::new(idx, name.to_string())));
        self.symbol_table.insert(name.to_string(), idx);
        idx
    }

    pub(crate) fn add_terminal(&mut self, name: String) -> usize {
        let idx = self.symbols.len();
        self.symbols.push(Symbol::Terminal(name.clone()));
        self.symbol_table.insert(name, idx);
        idx
    }

    pub(crate) fn add_undeclared(&mut self, name: &str) -> usize {
        let idx = self.symbols.len();
        self.symbols.push(Symbol::Undeclared(name.to_string()));
        self.symbol_table.insert(name.to_string(), idx);
        idx
    }

    pub(crate) fn add_production(&mut self, left: usize, right: Vec<usize>) {
        if let Some(nt) = self.symbols[left].mut_non_terminal() {
            nt.productions.push(right);
        }
    }

    pub fn symbol_name(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(|symbol| match symbol {
            Symbol::NonTerminal(e) => e.name.as_str(),
            Symbol::Terminal(e) | Symbol::Undeclared(e) => e.as_str(),
            Symbol::Epsilon => super::EPSILON,
        })
    }

    /// Name lookup for indices taken from this grammar.
    pub(crate) fn get_symbol_name(&self, index: usize) -> &str {
        self.symbol_name(index).unwrap_or_default()
    }

    pub fn production_to_vec_str(&self, production: &[usize]) -> Vec<&str> {
        production
            .iter()
            .map(|idx| self.get_symbol_name(*idx))
            .collect()
    }

    /// `head -> body` as written in grammar text.
    pub fn production_to_string(&self, production: ProductionRef) -> String {
        format!(
            "{} -> {}",
            self.get_symbol_name(production.head),
            self.production_to_vec_str(self.production(production).unwrap_or_default())
                .join(" ")
        )
    }
}
