//! The Nox runtime: wires scanner → parser → resolver → evaluator for one
//! source unit, and hosts the script runner and the REPL on top of that.

use std::io::{self, BufRead, Write};
use std::path::Path;

use log::info;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Host-facing runtime holding one persistent interpreter.
pub struct Nox {
    interpreter: Interpreter,
}

impl Default for Nox {
    fn default() -> Self {
        Nox::new()
    }
}

impl Nox {
    pub fn new() -> Self {
        Nox {
            interpreter: Interpreter::new(),
        }
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Run one source unit against this runtime's interpreter.
    pub fn run(&mut self, source: &str) -> Result<()> {
        Nox::run_with(source, &mut self.interpreter)
    }

    /// The full pipeline for one source unit.  The node-id base is threaded
    /// through the parser so resolver distances recorded by earlier units
    /// (REPL lines, modules) stay unique.
    pub fn run_with(source: &str, interpreter: &mut Interpreter) -> Result<()> {
        let scanner = Scanner::new(source.as_bytes().to_vec());

        let mut parser = Parser::with_id_base(scanner, interpreter.next_node_id());
        let statements = parser.parse()?;
        interpreter.claim_node_ids(parser.next_node_id());

        let mut resolver = Resolver::new(interpreter);
        resolver.resolve(&statements)?;

        interpreter.interpret(&statements)
    }

    pub fn run_file(&mut self, path: &Path) -> Result<()> {
        let source = std::fs::read_to_string(path)?;

        info!("Running file {} ({} bytes)", path.display(), source.len());

        self.run(&source)
    }

    /// Interactive prompt.  Lines accumulate until a blank line executes
    /// them; `exit`, `quit`, `\q` or EOF leaves.  Errors are reported and
    /// the session continues with state intact.
    pub fn run_prompt(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        println!("Welcome to Nox! Type 'exit', 'quit' or '\\q' to leave.");
        println!("Press ENTER twice to execute multiline input.");

        loop {
            let mut buffer: Vec<String> = Vec::new();

            loop {
                print!(">> ");
                io::stdout().flush()?;

                let line = match lines.next() {
                    Some(line) => line?,
                    None => {
                        println!("Exiting Nox.");
                        return Ok(());
                    }
                };

                let text = line.trim();

                if matches!(text, "exit" | "quit" | "\\q") {
                    println!("Exiting Nox.");
                    return Ok(());
                }

                if text.is_empty() {
                    break;
                }

                buffer.push(line);
            }

            if buffer.is_empty() {
                continue;
            }

            let source = buffer.join("\n");

            if let Err(err) = self.run(&source) {
                eprintln!("{}", err);
            }
        }
    }
}
