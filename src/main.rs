use std::fs;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use exprcalc::Lexer;
use exprcalc::ParseError;
use exprcalc::TokenizeError;
use log::{LevelFilter, info};
use miette::IntoDiagnostic;
use miette::Report;
use miette::WrapErr;

#[derive(Parser, Debug)]
#[command(version, about = "Tokenize, parse and evaluate arithmetic expressions")]
struct Args {
    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the token stream
    Tokenize(Input),
    /// Print the fully parenthesized tree
    Parse(Input),
    /// Print the numeric result
    Evaluate(Input),
}

#[derive(Debug, clap::Args)]
struct Input {
    /// Expression text, e.g. "(2+3)*4"
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    expression: Option<String>,

    /// Read the expression from a file instead
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl Input {
    fn read(&self) -> miette::Result<(Option<String>, String)> {
        match (&self.expression, &self.file) {
            (Some(expression), _) => Ok((None, expression.clone())),
            (None, Some(filename)) => {
                let contents = fs::read_to_string(filename)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("reading `{}` failed", filename.display()))?;
                Ok((Some(filename.display().to_string()), contents))
            }
            (None, None) => Err(miette::miette!("no expression given")),
        }
    }
}

fn main() -> miette::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match args.command {
        Commands::Tokenize(input) => {
            let (filename, contents) = input.read()?;
            info!("tokenizing {} bytes", contents.len());

            for token in Lexer::new(filename.as_deref(), contents.trim_end()) {
                let token = token.unwrap_or_else(|e| syntax_error(e));
                println!("{token}");
            }
            println!("EOF");
        }
        Commands::Parse(input) => {
            let (filename, contents) = input.read()?;
            let contents = contents.trim_end();
            let tokens = Lexer::new(filename.as_deref(), contents)
                .collect::<Result<Vec<_>, TokenizeError>>()
                .unwrap_or_else(|e| syntax_error(e));
            let expr = exprcalc::parse(&tokens)
                .unwrap_or_else(|e| parse_error(e, filename.as_deref(), contents));
            println!("{expr}");
        }
        Commands::Evaluate(input) => {
            let (filename, contents) = input.read()?;
            let contents = contents.trim_end();
            match exprcalc::calculate(filename.as_deref(), contents) {
                Ok(value) => println!("{value}"),
                Err(exprcalc::Error::Tokenize(e)) => syntax_error(e),
                Err(exprcalc::Error::Parse(e)) => parse_error(e, filename.as_deref(), contents),
                Err(exprcalc::Error::Eval(e)) => {
                    eprintln!("{:?}", Report::new(e));
                    std::process::exit(70);
                }
            }
        }
    }
    Ok(())
}

fn syntax_error(e: TokenizeError) -> ! {
    eprintln!("Error: Unrecognized input: {}", e.unit);
    eprintln!("{:?}", Report::new(e));
    std::process::exit(65);
}

fn parse_error(e: ParseError, filename: Option<&str>, contents: &str) -> ! {
    let source = miette::NamedSource::new(filename.unwrap_or("<input>"), contents.to_string());
    eprintln!("{:?}", Report::new(e).with_source_code(source));
    std::process::exit(65);
}
