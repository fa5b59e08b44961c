use std::collections::{HashMap, HashSet};

use log::debug;

use super::{grammar::Symbol, Grammar};

/// FIRST and FOLLOW sets of every non-terminal, keyed by symbol index.
///
/// FIRST sets may contain the epsilon symbol, FOLLOW sets may contain the end marker.
/// Both are least fixpoints and never change once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFollow {
    first: HashMap<usize, HashSet<usize>>,
    follow: HashMap<usize, HashSet<usize>>,
}

impl Grammar {
    pub fn calculate_first_follow(&self) -> FirstFollow {
        let first = self.calculate_first();
        let follow = self.calculate_follow(&first);
        FirstFollow { first, follow }
    }

    fn calculate_first(&self) -> HashMap<usize, HashSet<usize>> {
        let mut first: HashMap<usize, HashSet<usize>> = self
            .non_terminal_iter()
            .map(|nt| (nt.index, HashSet::new()))
            .collect();

        let mut rounds = 0;
        let mut changed = true;
        while changed {
            changed = false;
            rounds += 1;
            for nt in self.non_terminal_iter() {
                for production in &nt.productions {
                    let production_first = first_of_symbols(self, &first, production);
                    let set = first.entry(nt.index).or_default();
                    let before = set.len();
                    set.extend(production_first);
                    changed |= set.len() != before;
                }
            }
        }
        debug!("FIRST converged after {} rounds", rounds);

        first
    }

    fn calculate_follow(
        &self,
        first: &HashMap<usize, HashSet<usize>>,
    ) -> HashMap<usize, HashSet<usize>> {
        let mut follow: HashMap<usize, HashSet<usize>> = self
            .non_terminal_iter()
            .map(|nt| (nt.index, HashSet::new()))
            .collect();
        follow
            .entry(self.start_symbol())
            .or_default()
            .insert(self.end_mark());

        let epsilon = self.epsilon();
        let mut rounds = 0;
        let mut changed = true;
        while changed {
            changed = false;
            rounds += 1;
            for left in self.non_terminal_iter() {
                for production in &left.productions {
                    for (i, &b) in production.iter().enumerate() {
                        if self.non_terminal(b).is_none() {
                            continue;
                        }

                        let beta_first = first_of_symbols(self, first, &production[i + 1..]);
                        let mut add: HashSet<usize> = beta_first
                            .iter()
                            .cloned()
                            .filter(|&s| s != epsilon)
                            .collect();
                        if beta_first.contains(&epsilon) {
                            if let Some(left_follow) = follow.get(&left.index) {
                                add.extend(left_follow.iter().cloned());
                            }
                        }

                        let set = follow.entry(b).or_default();
                        let before = set.len();
                        set.extend(add);
                        changed |= set.len() != before;
                    }
                }
            }
        }
        debug!("FOLLOW converged after {} rounds", rounds);

        follow
    }
}

/// FIRST of a symbol string: scan left to right, stop at the first terminal or
/// non-nullable non-terminal; epsilon is included when the scan runs off the end.
fn first_of_symbols(
    g: &Grammar,
    first: &HashMap<usize, HashSet<usize>>,
    symbols: &[usize],
) -> HashSet<usize> {
    let epsilon = g.epsilon();
    let mut result = HashSet::new();
    for &idx in symbols {
        match &g.symbols[idx] {
            Symbol::Terminal(_) => {
                result.insert(idx);
                return result;
            }
            Symbol::NonTerminal(nt) => {
                let nt_first = match first.get(&nt.index) {
                    Some(set) => set,
                    None => return result,
                };
                result.extend(nt_first.iter().cloned().filter(|&s| s != epsilon));
                if !nt_first.contains(&epsilon) {
                    return result;
                }
            }
            Symbol::Epsilon => {}
            // never derives anything
            Symbol::Undeclared(_) => return result,
        }
    }
    result.insert(epsilon);
    result
}

impl FirstFollow {
    pub fn first(&self, non_terminal: usize) -> Option<&HashSet<usize>> {
        self.first.get(&non_terminal)
    }

    pub fn follow(&self, non_terminal: usize) -> Option<&HashSet<usize>> {
        self.follow.get(&non_terminal)
    }

    pub fn is_nullable(&self, g: &Grammar, non_terminal: usize) -> bool {
        self.first(non_terminal)
            .map_or(false, |first| first.contains(&g.epsilon()))
    }

    pub fn first_of_symbols(&self, g: &Grammar, symbols: &[usize]) -> HashSet<usize> {
        first_of_symbols(g, &self.first, symbols)
    }

    /// FIRST sets by name, in non-terminal declaration order.
    pub fn first_names<'a>(&self, g: &'a Grammar) -> Vec<(&'a str, Vec<&'a str>)> {
        named(g, &self.first)
    }

    /// FOLLOW sets by name, in non-terminal declaration order.
    pub fn follow_names<'a>(&self, g: &'a Grammar) -> Vec<(&'a str, Vec<&'a str>)> {
        named(g, &self.follow)
    }
}

/// Members are listed in declaration order with epsilon and the end marker last.
pub(crate) fn sorted_names<'a>(g: &'a Grammar, set: &HashSet<usize>) -> Vec<&'a str> {
    let mut indices: Vec<usize> = set.iter().cloned().collect();
    indices.sort_by_key(|&i| (i <= g.end_mark(), i));
    indices.into_iter().map(|i| g.get_symbol_name(i)).collect()
}

fn named<'a>(g: &'a Grammar, sets: &HashMap<usize, HashSet<usize>>) -> Vec<(&'a str, Vec<&'a str>)> {
    g.non_terminal_iter()
        .map(|nt| {
            let names = sets
                .get(&nt.index)
                .map(|set| sorted_names(g, set))
                .unwrap_or_default();
            (nt.name.as_str(), names)
        })
        .collect()
}
