//! Interactive CLI mode

use crate::commands::{Cli, CommandExecutor};
use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};

/// Interactive CLI session
pub struct InteractiveSession {
    executor: CommandExecutor,
}

impl InteractiveSession {
    pub fn new() -> Self {
        Self::with_executor(CommandExecutor::new())
    }

    /// Continue with an executor that may already hold a knowledge base
    pub fn with_executor(executor: CommandExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Start interactive session on stdin/stdout
    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Read commands from `input` until `quit` or end of input
    pub fn run_with<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        writeln!(output, "Welcome to Mimizuku Interactive Mode")?;
        writeln!(output, "Type 'help' for available commands, 'quit' to exit")?;
        writeln!(output, "{}", "=".repeat(50))?;

        let mut lines = input.lines();
        loop {
            write!(output, "mimizuku> ")?;
            output.flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match line {
                "quit" | "exit" | "q" => {
                    writeln!(output, "Goodbye!")?;
                    break;
                }
                "help" | "h" => {
                    self.show_help(&mut output)?;
                }
                "clear" => {
                    // Clear screen (ANSI terminals)
                    write!(output, "\x1B[2J\x1B[1;1H")?;
                }
                _ => {
                    if let Err(e) = self.execute_command(line, &mut output) {
                        writeln!(output, "Error: {:#}", e)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Parse one line as a command line and run it
    pub fn execute_command<W: Write>(&mut self, line: &str, output: &mut W) -> Result<()> {
        let mut args = vec!["mimizuku".to_string()];
        args.extend(shell_words::split(line)?);

        let cli = match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) => {
                writeln!(output, "Parse error: {}", e)?;
                return Ok(());
            }
        };

        let result = self.executor.execute_cli(cli)?;
        if !result.message.is_empty() {
            writeln!(output, "{}", result.message)?;
        }

        Ok(())
    }

    fn show_help<W: Write>(&self, output: &mut W) -> io::Result<()> {
        writeln!(output, "Available commands:")?;
        writeln!(output, "  classify [--format F]           Classify the loaded knowledge base")?;
        writeln!(output, "  realize [--format F]            Classify, then realize every individual")?;
        writeln!(output, "  query --class C [--direct]      Show equivalents, supers and subs of a class")?;
        writeln!(output, "  query --individual I [--direct] Show the types of an individual")?;
        writeln!(output, "  --input <kb.json>               Load a knowledge base")?;
        writeln!(output, "  --config <cfg.json>             Load a classifier configuration")?;
        writeln!(output, "  help                            Show this help")?;
        writeln!(output, "  clear                           Clear screen")?;
        writeln!(output, "  quit                            Exit interactive mode")?;
        writeln!(output)?;
        writeln!(output, "Use '<command> --help' for detailed help on each command")
    }
}

impl Default for InteractiveSession {
    fn default() -> Self {
        Self::new()
    }
}
