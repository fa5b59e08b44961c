use std::collections::{HashMap, HashSet};

use crowbook_text_processing::escape::tex as escape_tex;
use log::{debug, warn};
use serde::Serialize;

use super::{
    first_follow::FirstFollow,
    grammar::ProductionRef,
    pretty_print::{symbol_to_latex, ProductionOutput},
    Grammar,
};
use crate::error::{Conflict, Error, Result};

/// What to do when two productions land in the same table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Fail with [`Error::GrammarNotLL1`].
    #[default]
    Reject,
    /// Keep the production written last.
    LastWriteWins,
}

/// Predictive parse table. A missing `(non-terminal, terminal)` cell is a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseTable {
    cells: HashMap<(usize, usize), ProductionRef>,
}

impl Grammar {
    pub fn build_parse_table(
        &self,
        sets: &FirstFollow,
        policy: ConflictPolicy,
    ) -> Result<ParseTable> {
        let epsilon = self.epsilon();
        let mut table = ParseTable::default();

        for nt in self.non_terminal_iter() {
            for (alternative, production) in nt.productions.iter().enumerate() {
                let production_ref = ProductionRef {
                    head: nt.index,
                    alternative,
                };
                let first = sets.first_of_symbols(self, production);

                let mut lookaheads: Vec<usize> =
                    first.iter().cloned().filter(|&t| t != epsilon).collect();
                if first.contains(&epsilon) {
                    if let Some(follow) = sets.follow(nt.index) {
                        lookaheads.extend(follow.iter().cloned());
                    }
                }
                lookaheads.sort_unstable();
                lookaheads.dedup();

                for terminal in lookaheads {
                    table.insert(self, nt.index, terminal, production_ref, policy)?;
                }
            }
        }

        debug!("parse table built with {} cells", table.len());
        Ok(table)
    }
}

impl ParseTable {
    fn insert(
        &mut self,
        g: &Grammar,
        non_terminal: usize,
        terminal: usize,
        production: ProductionRef,
        policy: ConflictPolicy,
    ) -> Result<()> {
        if let Some(&existing) = self.cells.get(&(non_terminal, terminal)) {
            if existing != production {
                let conflict = Conflict {
                    non_terminal: g.get_symbol_name(non_terminal).to_string(),
                    terminal: g.get_symbol_name(terminal).to_string(),
                    existing: g.production_to_string(existing),
                    incoming: g.production_to_string(production),
                };
                match policy {
                    ConflictPolicy::Reject => return Err(Error::GrammarNotLL1(conflict)),
                    ConflictPolicy::LastWriteWins => warn!("overwriting {}", conflict),
                }
            }
        }
        self.cells.insert((non_terminal, terminal), production);
        Ok(())
    }

    pub fn get(&self, non_terminal: usize, terminal: usize) -> Option<ProductionRef> {
        self.cells.get(&(non_terminal, terminal)).cloned()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Terminals with an entry in the row of `non_terminal`, in declaration order
    /// with the end marker last.
    pub fn expected_terminals(&self, g: &Grammar, non_terminal: usize) -> Vec<usize> {
        let mut terminals: Vec<usize> = self
            .cells
            .keys()
            .filter(|(nt, _)| *nt == non_terminal)
            .map(|(_, t)| *t)
            .collect();
        terminals.sort_by_key(|&t| (t == g.end_mark(), t));
        terminals
    }

    /// Every cell as `M[A, t] = A -> body`, row by row.
    pub fn entries(&self, g: &Grammar) -> Vec<String> {
        let mut keys: Vec<&(usize, usize)> = self.cells.keys().collect();
        keys.sort_by_key(|&&(nt, t)| (nt, t == g.end_mark(), t));
        keys.into_iter()
            .map(|&(nt, t)| {
                format!(
                    "M[{}, {}] = {}",
                    g.get_symbol_name(nt),
                    g.get_symbol_name(t),
                    g.production_to_string(self.cells[&(nt, t)])
                )
            })
            .collect()
    }

    pub fn to_output<'a>(&self, g: &'a Grammar) -> LL1ParsingTable<'a> {
        let mut columns: Vec<usize> = g.terminal_iter().map(|(i, _)| i).collect();
        columns.push(g.end_mark());
        let terminals: Vec<&str> = columns.iter().map(|&t| g.get_symbol_name(t)).collect();

        let rows = g
            .non_terminal_iter()
            .map(|nt| {
                let left = nt.name.as_str();
                let row = columns
                    .iter()
                    .map(|&t| ProductionOutput {
                        left,
                        rights: self
                            .get(nt.index, t)
                            .and_then(|p| g.production(p))
                            .map(|body| vec![g.production_to_vec_str(body)])
                            .unwrap_or_default(),
                    })
                    .collect();
                (left, row)
            })
            .collect();

        LL1ParsingTable { terminals, rows }
    }
}

#[derive(Serialize)]
pub struct LL1ParsingTable<'a> {
    terminals: Vec<&'a str>,
    rows: Vec<(&'a str, Vec<ProductionOutput<'a>>)>,
}

impl LL1ParsingTable<'_> {
    pub fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().map(|&t| t.to_string()));
        let mut output: Vec<Vec<String>> = vec![header];
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![left.to_string()];
            line.extend(
                row.iter()
                    .map(|productions| productions.to_plaintext(left.len(), false)),
            );
            output.push(line);
        }

        let width: Vec<usize> = (0..output[0].len())
            .map(|j| output.iter().map(|line| line[j].len()).max().unwrap_or(0))
            .collect();
        output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|&t| format!("\\text{{{}}}", escape_tex(t))),
        );
        let header = header.join(" & ");

        let mut output: Vec<String> = Vec::new();
        let terminal_set: HashSet<&str> = self.terminals.iter().cloned().collect();
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![symbol_to_latex(left, &terminal_set)];
            line.extend(
                row.iter()
                    .map(|productions| productions.to_latex(false, &terminal_set)),
            );
            output.push(line.join(" & "));
        }

        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::ConflictPolicy;
    use crate::error::{Conflict, Error};
    use crate::fixtures::EXPR;
    use crate::grammar::grammar::ProductionRef;
    use crate::Grammar;

    #[test]
    fn expression_table() {
        let g = Grammar::parse(EXPR).unwrap();
        let ff = g.calculate_first_follow();
        let table = g.build_parse_table(&ff, ConflictPolicy::Reject).unwrap();

        assert_eq!(table.len(), 16);
        assert_eq!(
            table.entries(&g),
            vec![
                "M[E, (] = E -> T E'",
                "M[E, id] = E -> T E'",
                "M[E, num] = E -> T E'",
                "M[E', +] = E' -> + T E'",
                "M[E', )] = E' -> eps",
                "M[E', $] = E' -> eps",
                "M[T, (] = T -> F T'",
                "M[T, id] = T -> F T'",
                "M[T, num] = T -> F T'",
                "M[T', +] = T' -> eps",
                "M[T', *] = T' -> * F T'",
                "M[T', )] = T' -> eps",
                "M[T', $] = T' -> eps",
                "M[F, (] = F -> ( E )",
                "M[F, id] = F -> id",
                "M[F, num] = F -> num",
            ]
        );
    }

    #[test]
    fn rebuilding_gives_the_same_table() {
        let g = Grammar::parse(EXPR).unwrap();
        let ff = g.calculate_first_follow();
        assert_eq!(
            g.build_parse_table(&ff, ConflictPolicy::Reject).unwrap(),
            g.build_parse_table(&ff, ConflictPolicy::Reject).unwrap()
        );
    }

    #[test]
    fn expected_terminals_follow_declaration_order() {
        let g = Grammar::parse(EXPR).unwrap();
        let ff = g.calculate_first_follow();
        let table = g.build_parse_table(&ff, ConflictPolicy::Reject).unwrap();
        let t_prime = g.get_symbol_index("T'").unwrap();
        let names: Vec<&str> = table
            .expected_terminals(&g, t_prime)
            .into_iter()
            .map(|t| g.get_symbol_name(t))
            .collect();
        assert_eq!(names, vec!["+", "*", ")", "$"]);
    }

    const AMBIGUOUS: &str = "START = S
NON_TERMINALS = S
TERMINALS = a, b
S -> a b | a";

    #[test]
    fn conflicts_are_rejected() {
        let g = Grammar::parse(AMBIGUOUS).unwrap();
        let ff = g.calculate_first_follow();
        assert_eq!(
            g.build_parse_table(&ff, ConflictPolicy::Reject),
            Err(Error::GrammarNotLL1(Conflict {
                non_terminal: "S".to_string(),
                terminal: "a".to_string(),
                existing: "S -> a b".to_string(),
                incoming: "S -> a".to_string(),
            }))
        );
    }

    #[test]
    fn last_write_wins_keeps_the_later_production() {
        let g = Grammar::parse(AMBIGUOUS).unwrap();
        let ff = g.calculate_first_follow();
        let table = g
            .build_parse_table(&ff, ConflictPolicy::LastWriteWins)
            .unwrap();
        let s = g.start_symbol();
        let a = g.get_symbol_index("a").unwrap();
        assert_eq!(
            table.get(s, a),
            Some(ProductionRef {
                head: s,
                alternative: 1
            })
        );
    }

    #[test]
    fn nullable_conflict_with_follow() {
        // FIRST(A a) and FOLLOW(A) share `a`
        let g = Grammar::parse(
            "START = S\nNON_TERMINALS = S, A\nTERMINALS = a\nS -> A a\nA -> a | eps",
        )
        .unwrap();
        let ff = g.calculate_first_follow();
        assert!(matches!(
            g.build_parse_table(&ff, ConflictPolicy::Reject),
            Err(Error::GrammarNotLL1(Conflict { ref non_terminal, .. })) if non_terminal == "A"
        ));
    }

    #[test]
    fn table_plaintext_has_a_column_per_terminal() {
        let g = Grammar::parse("START = S\nNON_TERMINALS = S\nTERMINALS = a\nS -> a S | eps").unwrap();
        let ff = g.calculate_first_follow();
        let table = g.build_parse_table(&ff, ConflictPolicy::Reject).unwrap();
        assert_eq!(
            table.to_output(&g).to_plaintext(),
            "  |        a |        $\nS | S -> a S | S -> eps"
        );
    }
}
