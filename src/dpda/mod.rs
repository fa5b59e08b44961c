pub mod automaton;
pub mod token;
pub mod tree;

pub use automaton::{Parser, ParserConfig};
pub use token::Token;
pub use tree::{Node, NodeId, ParseTree};
