use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::diagnostics::Diagnostics;
use rox::interpreter::Interpreter;
use rox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a program from a file and prints each statement's tree
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive prompt
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module and source line
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Prints every collected diagnostic to stderr.
fn report(diagnostics: &mut Diagnostics) {
    for e in diagnostics.drain() {
        debug!("Reporting: {}", e);
        eprintln!("{}", e);
    }
}

fn no_input() -> ! {
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn tokenize(source: &str, json: bool) -> Result<()> {
    let mut diagnostics = Diagnostics::new();
    let tokens: Vec<Token<'_>> = rox::scan(source, &mut diagnostics);

    report(&mut diagnostics);

    if json {
        let out = serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", out);
    } else {
        for token in &tokens {
            debug!("Scanned token: {}", token);
            println!("{}", token);
        }
    }

    if diagnostics.had_error() {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(source: &str) {
    let mut diagnostics = Diagnostics::new();
    let tokens = rox::scan(source, &mut diagnostics);
    let statements = rox::parse(&tokens, &mut diagnostics);

    report(&mut diagnostics);

    if diagnostics.had_error() {
        debug!("Parse failed, exiting with code 65");
        std::process::exit(65);
    }

    for stmt in &statements {
        let ast_str = AstPrinter::print_stmt(stmt);
        debug!("AST: {}", ast_str);
        println!("{}", ast_str);
    }

    info!("Parse subcommand completed");
}

fn run(source: &str) {
    info!("Provided input:\n {}", source);

    let mut diagnostics = Diagnostics::new();
    rox::run(source, io::stdout(), &mut diagnostics);

    report(&mut diagnostics);

    if diagnostics.had_error() {
        std::process::exit(65);
    }

    if diagnostics.had_runtime_error() {
        std::process::exit(70);
    }

    info!("Program executed successfully");
}

/// Each line is leaked so that functions and classes defined on it can
/// outlive the line and be called from later ones.
fn repl() -> Result<()> {
    let mut interpreter: Interpreter<'static> = Interpreter::new();
    let mut diagnostics = Diagnostics::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let line = match lines.next() {
            Some(line) => line.context("Failed to read line")?,
            None => break,
        };

        let source: &'static str = Box::leak(line.into_boxed_str());
        let tokens: &'static [Token<'static>] =
            Box::leak(rox::scan(source, &mut diagnostics).into_boxed_slice());
        let statements = rox::parse(tokens, &mut diagnostics);

        if !diagnostics.had_error() {
            let locals = rox::resolve(&statements, &mut diagnostics);

            if !diagnostics.had_error() {
                rox::interpret(&mut interpreter, &statements, locals, &mut diagnostics);
            }
        }

        report(&mut diagnostics);
        diagnostics.reset();
    }

    println!();
    info!("REPL session ended");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");
                tokenize(&read_file(filename)?, json)?;
            }
            None => no_input(),
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");
                parse(&read_file(filename)?);
            }
            None => no_input(),
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");
                run(&read_file(filename)?);
            }
            None => no_input(),
        },

        Commands::Repl => {
            info!("Running Repl subcommand");
            repl()?;
        }
    }

    Ok(())
}
