use log::{debug, warn};

use super::{END_MARK, EPSILON};
use crate::error::{Error, Result};
use crate::Grammar;

const START: &str = "START";
const NON_TERMINALS: &str = "NON_TERMINALS";
const TERMINALS: &str = "TERMINALS";

impl Grammar {
    /// Parses grammar text of the form
    ///
    /// ```text
    /// START = E
    /// NON_TERMINALS = E, E', T
    /// TERMINALS = +, id
    /// E -> T E'
    /// E' -> + T E' | eps
    /// T -> id
    /// ```
    ///
    /// Declarations and productions may come in any order. A line starting with `|`
    /// continues the alternatives of the previous production line.
    pub fn parse(grammar: &str) -> Result<Self> {
        let mut g = Self::new();

        let mut start: Option<(usize, &str)> = None;
        let mut non_terminals: Vec<(usize, &str)> = Vec::new();
        let mut terminals: Vec<(usize, &str)> = Vec::new();
        let mut raw_productions: Vec<(usize, &str, &str)> = Vec::new();

        let mut previous_left: Option<&str> = None;
        for (i, line) in grammar.lines().enumerate() {
            let line_no = i + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((left, rights)) = line.split_once("->") {
                let left = left.trim();
                if left.is_empty() {
                    return Err(Error::malformed(Some(line_no), "empty left side"));
                } else if left.split_whitespace().count() != 1 {
                    return Err(Error::malformed(
                        Some(line_no),
                        "left side contains whitespace",
                    ));
                } else if rights.contains("->") {
                    return Err(Error::malformed(Some(line_no), "too many \"->\""));
                }
                previous_left = Some(left);
                raw_productions.push((line_no, left, rights));
            } else if let Some(rights) = line.strip_prefix('|') {
                match previous_left {
                    Some(left) => raw_productions.push((line_no, left, rights)),
                    None => {
                        return Err(Error::malformed(
                            Some(line_no),
                            "cannot find left side",
                        ))
                    }
                }
            } else if let Some((key, value)) = line.split_once('=') {
                let value = value.trim();
                match key.trim() {
                    START => {
                        if let Some((previous, name)) = start {
                            warn!(
                                "line {}: START overrides `{}` declared on line {}",
                                line_no, name, previous
                            );
                        }
                        start = Some((line_no, value));
                    }
                    NON_TERMINALS => non_terminals.extend(split_names(line_no, value)),
                    TERMINALS => terminals.extend(split_names(line_no, value)),
                    other => {
                        return Err(Error::malformed(
                            Some(line_no),
                            format!("unknown declaration `{}`", other),
                        ))
                    }
                }
            } else {
                return Err(Error::malformed(
                    Some(line_no),
                    "expected a declaration or a production",
                ));
            }
        }

        for (line_no, name) in non_terminals {
            check_reserved(line_no, name)?;
            if g.get_symbol_index(name).is_none() {
                g.add_non_terminal(name);
            }
        }
        for (line_no, name) in terminals {
            check_reserved(line_no, name)?;
            match g.get_symbol_index(name) {
                None => {
                    g.add_terminal(name.to_string());
                }
                Some(idx) if g.is_terminal(idx) => {}
                Some(_) => {
                    return Err(Error::malformed(
                        Some(line_no),
                        format!("`{}` is declared both terminal and non-terminal", name),
                    ))
                }
            }
        }

        for (line_no, left, rights) in raw_productions {
            let left_idx = match g.get_symbol_index(left) {
                Some(idx) if g.non_terminal(idx).is_some() => idx,
                _ => {
                    return Err(Error::malformed(
                        Some(line_no),
                        format!("`{}` is not a declared non-terminal", left),
                    ))
                }
            };
            for right in rights.split('|') {
                let production = g.parse_alternative(line_no, right)?;
                g.add_production(left_idx, production);
            }
        }

        let (line_no, start) = start.ok_or_else(|| Error::malformed(None, "missing START"))?;
        g.start_symbol = match g.get_symbol_index(start).and_then(|idx| g.non_terminal(idx)) {
            Some(nt) if !nt.productions.is_empty() => nt.index,
            Some(_) => {
                return Err(Error::malformed(
                    Some(line_no),
                    format!("start symbol `{}` has no productions", start),
                ))
            }
            None => {
                return Err(Error::malformed(
                    Some(line_no),
                    format!("start symbol `{}` is not a declared non-terminal", start),
                ))
            }
        };

        debug!(
            "parsed grammar: {} symbols, start `{}`",
            g.symbols.len(),
            start
        );
        Ok(g)
    }

    fn parse_alternative(&mut self, line_no: usize, right: &str) -> Result<Vec<usize>> {
        let names: Vec<&str> = right.split_whitespace().collect();
        if names.is_empty() {
            return Err(Error::malformed(Some(line_no), "empty alternative"));
        }
        if names.contains(&EPSILON) {
            if names.len() > 1 {
                return Err(Error::malformed(
                    Some(line_no),
                    format!("`{}` must be the only symbol of an alternative", EPSILON),
                ));
            }
            return Ok(vec![self.epsilon()]);
        }
        if names.contains(&END_MARK) {
            return Err(Error::malformed(
                Some(line_no),
                format!("`{}` is reserved", END_MARK),
            ));
        }

        Ok(names
            .into_iter()
            .map(|s| match self.get_symbol_index(s) {
                Some(idx) => idx,
                None => {
                    // resolved lazily: a missing table entry at parse time
                    warn!("line {}: `{}` is not declared", line_no, s);
                    self.add_undeclared(s)
                }
            })
            .collect())
    }
}

fn split_names(line_no: usize, value: &str) -> impl Iterator<Item = (usize, &str)> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(move |s| (line_no, s))
}

fn check_reserved(line_no: usize, name: &str) -> Result<()> {
    if name == EPSILON || name == END_MARK {
        Err(Error::malformed(
            Some(line_no),
            format!("`{}` is reserved", name),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Malformed};
    use crate::grammar::grammar::Symbol;
    use crate::Grammar;

    const HEADER: &str = "START = S\nNON_TERMINALS = S, A\nTERMINALS = a, b\n";

    fn parse(body: &str) -> Grammar {
        Grammar::parse(&format!("{}{}", HEADER, body)).unwrap()
    }

    fn malformed_line(text: &str) -> Option<usize> {
        match Grammar::parse(text) {
            Err(Error::MalformedGrammar(Malformed { line, .. })) => line,
            other => panic!("expected a malformed grammar, got {:?}", other),
        }
    }

    #[test]
    fn simple_parse() {
        let g = parse("S -> a A\nA -> b | eps");

        let s = g.get_symbol_index("S").unwrap();
        let a_nt = g.get_symbol_index("A").unwrap();
        let a = g.get_symbol_index("a").unwrap();
        let b = g.get_symbol_index("b").unwrap();

        assert_eq!(g.start_symbol(), s);
        assert_eq!(g.get_symbol_name(s), "S");
        assert_eq!(g.non_terminal(s).unwrap().productions, vec![vec![a, a_nt]]);
        assert_eq!(
            g.non_terminal(a_nt).unwrap().productions,
            vec![vec![b], vec![g.epsilon()]]
        );
    }

    #[test]
    fn declaration_order_is_kept() {
        let g = parse("S -> a\nA -> b");
        let terminals: Vec<&str> = g.terminal_iter().map(|(_, t)| t.as_str()).collect();
        let non_terminals: Vec<&str> = g.non_terminal_iter().map(|nt| nt.name.as_str()).collect();
        assert_eq!(terminals, vec!["a", "b"]);
        assert_eq!(non_terminals, vec!["S", "A"]);
    }

    #[test]
    fn productions_in_any_order_and_continuations() {
        let g = Grammar::parse(
            "S -> a\n  | b\n# comment\nS -> A\n\nA -> eps\nSTART = S\nTERMINALS = a, b\nNON_TERMINALS = S, A",
        )
        .unwrap();
        let s = g.get_symbol_index("S").unwrap();
        assert_eq!(g.non_terminal(s).unwrap().productions.len(), 3);
    }

    #[test]
    fn undeclared_symbols_are_accepted() {
        let g = parse("S -> a X\nA -> b");
        let x = g.get_symbol_index("X").unwrap();
        assert_eq!(g.symbols()[x], Symbol::Undeclared("X".to_string()));
    }

    #[test]
    fn missing_start() {
        assert_eq!(
            Grammar::parse("NON_TERMINALS = S\nTERMINALS = a\nS -> a"),
            Err(Error::malformed(None, "missing START"))
        );
    }

    #[test]
    fn start_must_be_a_non_terminal_with_productions() {
        assert_eq!(malformed_line("START = a\nNON_TERMINALS = S\nTERMINALS = a\nS -> a"), Some(1));
        assert_eq!(malformed_line("START = S\nNON_TERMINALS = S\nTERMINALS = a"), Some(1));
    }

    #[test]
    fn bad_production_lines() {
        assert_eq!(malformed_line(&format!("{}S -> a -> b", HEADER)), Some(4));
        assert_eq!(malformed_line(&format!("{}-> a", HEADER)), Some(4));
        assert_eq!(malformed_line(&format!("{}| a b\nS -> a", HEADER)), Some(4));
        assert_eq!(malformed_line(&format!("{}S a -> b", HEADER)), Some(4));
        assert_eq!(malformed_line(&format!("{}S -> a |", HEADER)), Some(4));
        assert_eq!(malformed_line(&format!("{}S -> a eps", HEADER)), Some(4));
        assert_eq!(malformed_line(&format!("{}a -> b", HEADER)), Some(4));
        assert_eq!(malformed_line(&format!("{}S a", HEADER)), Some(4));
        assert_eq!(malformed_line(&format!("{}S -> a $", HEADER)), Some(4));
    }

    #[test]
    fn bad_declarations() {
        assert_eq!(malformed_line("START = S\nNON_TERMINALS = S\nTERMINALS = S\nS -> S"), Some(3));
        assert_eq!(malformed_line("START = S\nNON_TERMINALS = S, eps\nS -> a"), Some(2));
        assert_eq!(malformed_line("START = S\nSYMBOLS = a\nS -> a"), Some(2));
    }
}
