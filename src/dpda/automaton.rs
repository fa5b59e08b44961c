use log::trace;

use super::{
    token::Token,
    tree::{NodeId, ParseTree},
};
use crate::error::{Error, Result, SyntaxError, SyntaxErrorKind};
use crate::grammar::{
    first_follow::FirstFollow,
    ll1_parsing_table::{ConflictPolicy, ParseTable},
    END_MARK,
};
use crate::Grammar;

/// Bounds on a single parse run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub max_steps: usize,
    pub max_nodes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            max_nodes: 1_000_000,
        }
    }
}

impl ParserConfig {
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }
}

/// A grammar together with its FIRST/FOLLOW sets and parse table.
///
/// Immutable once built; any number of token streams can be parsed against it,
/// from several threads at once.
#[derive(Debug, Clone)]
pub struct Parser {
    grammar: Grammar,
    sets: FirstFollow,
    table: ParseTable,
}

impl Parser {
    pub fn new(grammar: &str) -> Result<Self> {
        Self::with_policy(grammar, ConflictPolicy::default())
    }

    pub fn with_policy(grammar: &str, policy: ConflictPolicy) -> Result<Self> {
        Self::from_grammar(Grammar::parse(grammar)?, policy)
    }

    pub fn from_grammar(grammar: Grammar, policy: ConflictPolicy) -> Result<Self> {
        let sets = grammar.calculate_first_follow();
        let table = grammar.build_parse_table(&sets, policy)?;
        Ok(Self {
            grammar,
            sets,
            table,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn first_follow(&self) -> &FirstFollow {
        &self.sets
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    pub fn parse(&self, tokens: &[Token]) -> Result<ParseTree> {
        self.parse_with_config(tokens, &ParserConfig::default())
    }

    pub fn parse_with_config(&self, tokens: &[Token], config: &ParserConfig) -> Result<ParseTree> {
        Automaton::new(&self.grammar, &self.table, tokens, config).run()
    }
}

/// Kind and literal of the token at `index`; the end marker past the last token.
fn lookahead(tokens: &[Token], index: usize) -> (&str, Option<&str>) {
    match tokens.get(index) {
        Some(token) => (token.kind.as_str(), Some(token.value.as_str())),
        None => (END_MARK, None),
    }
}

struct Automaton<'a> {
    grammar: &'a Grammar,
    table: &'a ParseTable,
    tokens: &'a [Token],
    config: &'a ParserConfig,
    /// Symbols still to be derived, each with the node that will own its subtree.
    stack: Vec<(usize, Option<NodeId>)>,
    index: usize,
    tree: ParseTree,
}

impl<'a> Automaton<'a> {
    fn new(
        grammar: &'a Grammar,
        table: &'a ParseTable,
        tokens: &'a [Token],
        config: &'a ParserConfig,
    ) -> Self {
        Self {
            grammar,
            table,
            tokens,
            config,
            stack: vec![(grammar.end_mark(), None), (grammar.start_symbol(), None)],
            index: 0,
            tree: ParseTree::new(),
        }
    }

    fn run(mut self) -> Result<ParseTree> {
        let g = self.grammar;
        let mut steps = 0;

        while let Some((top, parent)) = self.stack.pop() {
            steps += 1;
            if steps > self.config.max_steps {
                return Err(Error::LimitExceeded {
                    what: "step",
                    limit: self.config.max_steps,
                });
            }

            let (kind, value) = lookahead(self.tokens, self.index);
            trace!(
                "step {}: top `{}`, lookahead `{}` at {}, depth {}",
                steps,
                g.get_symbol_name(top),
                kind,
                self.index,
                self.stack.len()
            );

            if g.is_terminal(top) {
                if g.get_symbol_name(top) != kind {
                    return Err(self.syntax_error(
                        SyntaxErrorKind::Mismatch,
                        vec![g.get_symbol_name(top).to_string()],
                    ));
                }
                self.index += 1;
                // the end marker has no owner and stays out of the tree
                if let Some(parent) = parent {
                    self.add_node(Some(parent), kind, value)?;
                }
                continue;
            }

            let nt = match g.non_terminal(top) {
                Some(nt) => nt,
                None => return Err(self.syntax_error(SyntaxErrorKind::NoRule, Vec::new())),
            };
            let production = g
                .get_symbol_index(kind)
                .filter(|&t| g.is_terminal(t))
                .and_then(|t| self.table.get(top, t));
            let production = match production {
                Some(production) => production,
                None => {
                    let expected = self
                        .table
                        .expected_terminals(g, top)
                        .into_iter()
                        .map(|t| g.get_symbol_name(t).to_string())
                        .collect();
                    return Err(self.syntax_error(SyntaxErrorKind::NoRule, expected));
                }
            };

            trace!("apply {}", g.production_to_string(production));
            let node = self.add_node(parent, &nt.name, None)?;
            self.stack.extend(
                g.production(production)
                    .unwrap_or_default()
                    .iter()
                    .rev()
                    .filter(|&&s| s != g.epsilon())
                    .map(|&s| (s, Some(node))),
            );
        }

        if self.index != self.tokens.len() + 1 {
            return Err(self.syntax_error(SyntaxErrorKind::TrailingInput, Vec::new()));
        }
        Ok(self.tree)
    }

    fn add_node(&mut self, parent: Option<NodeId>, symbol: &str, value: Option<&str>) -> Result<NodeId> {
        if self.tree.len() >= self.config.max_nodes {
            return Err(Error::LimitExceeded {
                what: "node",
                limit: self.config.max_nodes,
            });
        }
        Ok(self.tree.push(parent, symbol, value))
    }

    fn syntax_error(&self, kind: SyntaxErrorKind, expected: Vec<String>) -> Error {
        let (found, value) = lookahead(self.tokens, self.index);
        Error::Syntax(SyntaxError {
            kind,
            position: self.index,
            expected,
            found: found.to_string(),
            value: value.map(str::to_string),
        })
    }
}
