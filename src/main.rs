use std::{fs, io::Read, process};

use ll1_dpda::{ConflictPolicy, Parser, Token};

fn print_help() {
    println!("Usage: ll1-dpda outputs [options] <grammar file> [token file]");
    println!("outputs:");
    println!("  prod: Productions");
    println!("  ff: First and follow sets");
    println!("  table: LL(1) parsing table");
    println!("  tree: Parse tree of the tokens (token file or stdin, one `KIND literal` per line)");
    println!("options:");
    println!("  -h: Print this help");
    println!("  -l: Print in LaTeX format");
    println!("  -j: Print in JSON format");
    println!("  -w: Resolve table conflicts by keeping the last production");
}

enum OutputFormat {
    Plain,
    LaTeX,
    JSON,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", message);
    process::exit(1);
}

fn main() {
    pretty_env_logger::init();

    let mut outputs: Vec<&str> = Vec::new();
    let args = std::env::args().skip(1).collect::<Vec<String>>();
    let mut i: usize = 0;
    while i < args.len() && ["prod", "ff", "table", "tree"].contains(&args[i].as_str()) {
        outputs.push(args[i].as_str());
        i += 1;
    }

    let mut output_format = OutputFormat::Plain;
    let mut policy = ConflictPolicy::Reject;

    while i < args.len() && ["-h", "--help", "-l", "-j", "-w"].contains(&args[i].as_str()) {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-l" => output_format = OutputFormat::LaTeX,
            "-j" => output_format = OutputFormat::JSON,
            _ => policy = ConflictPolicy::LastWriteWins,
        }
        i += 1;
    }

    if i >= args.len() || i + 2 < args.len() || outputs.is_empty() {
        print_help();
        return;
    }

    let grammar = fs::read_to_string(&args[i])
        .unwrap_or_else(|e| fail(format!("cannot read {}: {}", args[i], e)));
    let parser = Parser::with_policy(&grammar, policy).unwrap_or_else(|e| fail(e));
    let g = parser.grammar();

    for output in outputs {
        let text = match output {
            "prod" => {
                let t = g.to_production_output_vec();
                match output_format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json().unwrap_or_else(|e| fail(e)),
                }
            }
            "ff" => {
                let t = parser.first_follow().to_non_terminal_output_vec(g);
                match output_format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json().unwrap_or_else(|e| fail(e)),
                }
            }
            "table" => {
                let t = parser.table().to_output(g);
                match output_format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json().unwrap_or_else(|e| fail(e)),
                }
            }
            _ => {
                let input: String = match args.get(i + 1) {
                    Some(path) => fs::read_to_string(path)
                        .unwrap_or_else(|e| fail(format!("cannot read {}: {}", path, e))),
                    None => {
                        let mut input = String::new();
                        std::io::stdin()
                            .read_to_string(&mut input)
                            .unwrap_or_else(|e| fail(e));
                        input
                    }
                };
                let tokens = Token::parse_stream(&input);
                let tree = parser.parse(&tokens).unwrap_or_else(|e| fail(e));
                match output_format {
                    OutputFormat::JSON => tree.to_json().unwrap_or_else(|e| fail(e)),
                    _ => tree.display(),
                }
            }
        };
        println!("{}", text);
    }
}
