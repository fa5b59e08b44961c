extern crate wasm_bindgen;

use wasm_bindgen::prelude::*;

pub mod dpda;
pub mod error;
pub mod grammar;

pub use dpda::{Node, NodeId, ParseTree, Parser, ParserConfig, Token};
pub use error::{Error, Result};
pub use grammar::{ll1_parsing_table::ConflictPolicy, Grammar};

fn error_to_json(e: impl std::fmt::Display) -> String {
    serde_json::json!({ "error": e.to_string() }).to_string()
}

fn json_or_error(output: Result<serde_json::Result<String>>) -> String {
    match output {
        Ok(Ok(json)) => json,
        Ok(Err(e)) => error_to_json(e),
        Err(e) => error_to_json(e),
    }
}

#[wasm_bindgen]
pub fn first_follow_to_json(grammar: &str) -> String {
    json_or_error(Grammar::parse(grammar).map(|g| {
        g.calculate_first_follow()
            .to_non_terminal_output_vec(&g)
            .to_json()
    }))
}

#[wasm_bindgen]
pub fn parse_table_to_json(grammar: &str) -> String {
    json_or_error(Parser::new(grammar).map(|p| p.table().to_output(p.grammar()).to_json()))
}

/// Parses `tokens` (one `KIND literal` per line) and returns the tree as nested JSON.
#[wasm_bindgen]
pub fn parse_to_json(grammar: &str, tokens: &str) -> String {
    let tokens = Token::parse_stream(tokens);
    json_or_error(
        Parser::new(grammar)
            .and_then(|p| p.parse(&tokens))
            .map(|tree| tree.to_json()),
    )
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::Token;

    pub const EXPR: &str = "START = E
NON_TERMINALS = E, E', T, T', F
TERMINALS = +, *, (, ), id, num
E -> T E'
E' -> + T E' | eps
T -> F T'
T' -> * F T' | eps
F -> ( E ) | id | num
";

    /// Tokens whose literal is their kind.
    pub fn tokens(kinds: &[&str]) -> Vec<Token> {
        kinds.iter().map(|&k| Token::new(k, k)).collect()
    }
}


#[cfg(test)]
mod scenario_tests {
    use pretty_assertions::assert_eq;

    use crate::fixtures::{tokens, EXPR};
    use crate::{Error, Parser, Token};

    const ASSIGNMENT: &str = "START = E
NON_TERMINALS = E, E_prime, T, T_prime, F
TERMINALS = IDENTIFIER, LITERAL, PLUS, STAR, LEFT_PAR, RIGHT_PAR
E -> T E_prime
E_prime -> PLUS T E_prime | eps
T -> F T_prime
T_prime -> STAR F T_prime | eps
F -> LEFT_PAR E RIGHT_PAR | IDENTIFIER | LITERAL
";

    #[test]
    fn identifiers_can_be_renamed_after_parsing() {
        let parser = Parser::new(ASSIGNMENT).unwrap();
        // x + 5 * ( y + 1 )
        let input = Token::parse_stream(
            "IDENTIFIER x\nPLUS +\nLITERAL 5\nSTAR *\nLEFT_PAR (\nIDENTIFIER y\nPLUS +\nLITERAL 1\nRIGHT_PAR )",
        );
        let mut tree = parser.parse(&input).unwrap();

        assert_eq!(tree.rename_leaves("IDENTIFIER", "x", "var_1"), 1);
        assert_eq!(tree.rename_leaves("IDENTIFIER", "y", "var_2"), 1);
        assert_eq!(
            tree.leaf_values(),
            vec!["var_1", "+", "5", "*", "(", "var_2", "+", "1", ")"]
        );
    }

    #[test]
    fn one_table_many_parses() {
        let parser = Parser::new(EXPR).unwrap();
        let before = parser.table().clone();
        for input in [
            vec!["id"],
            vec!["num", "*", "num"],
            vec!["(", "id", "+", "num", ")", "*", "id"],
        ] {
            let tree = parser.parse(&tokens(&input)).unwrap();
            assert_eq!(tree.leaf_kinds(), input);
        }
        assert!(matches!(
            parser.parse(&tokens(&["id", "id"])),
            Err(Error::Syntax(_))
        ));
        assert_eq!(parser.table(), &before);
    }

    #[test]
    fn grammar_errors_abort_before_parsing() {
        assert!(matches!(
            Parser::new("NON_TERMINALS = S\nTERMINALS = a\nS -> a"),
            Err(Error::MalformedGrammar(_))
        ));
        assert!(matches!(
            Parser::new("START = S\nNON_TERMINALS = S\nTERMINALS = a\nS -> a | a"),
            Err(Error::GrammarNotLL1(_))
        ));
    }
}
