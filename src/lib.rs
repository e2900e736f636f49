//! A tree-walking interpreter for Lox.
//!
//! The pipeline is `scan` → `parse` → `resolve` → `interpret`.  Each stage
//! reports into a caller-owned [`Diagnostics`]; nothing here prints or exits.
//!
//! ```no_run
//! use rox::diagnostics::Diagnostics;
//!
//! let mut diagnostics = Diagnostics::new();
//! rox::run("print 1 + 2;", std::io::stdout(), &mut diagnostics);
//! assert!(!diagnostics.had_error());
//! ```

pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use crate::ast::Stmt;
use crate::diagnostics::Diagnostics;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::{Locals, Resolver};
use crate::scanner::Scanner;
use crate::token::Token;

/// Tokenize `source`.  Lexical errors are reported and skipped, so the
/// result always ends with `EOF`.
pub fn scan<'a>(source: &'a str, diagnostics: &mut Diagnostics) -> Vec<Token<'a>> {
    let mut tokens: Vec<Token<'a>> = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => diagnostics.report(e),
        }
    }

    tokens
}

pub fn parse<'a>(tokens: &'a [Token<'a>], diagnostics: &mut Diagnostics) -> Vec<Stmt<'a>> {
    let mut parser = Parser::new(tokens);
    let statements = parser.parse();

    diagnostics.extend(parser.take_errors());
    statements
}

pub fn resolve<'a>(statements: &[Stmt<'a>], diagnostics: &mut Diagnostics) -> Locals {
    let mut resolver = Resolver::new();
    let locals = resolver.resolve(statements);

    diagnostics.extend(resolver.take_errors());
    locals
}

/// Execute on `interpreter`, reporting at most one runtime error.
pub fn interpret<'a>(
    interpreter: &mut Interpreter<'a>,
    statements: &[Stmt<'a>],
    locals: Locals,
    diagnostics: &mut Diagnostics,
) {
    if let Err(e) = interpreter.interpret(statements, locals) {
        diagnostics.report(e);
    }
}

/// The whole pipeline on a fresh interpreter writing to `output`.  Nothing
/// runs if scanning, parsing or resolution reported an error.
pub fn run<W: Write>(source: &str, output: W, diagnostics: &mut Diagnostics) {
    let tokens = scan(source, diagnostics);
    let statements = parse(&tokens, diagnostics);

    if diagnostics.had_error() {
        info!("Static errors after parsing; not resolving");
        return;
    }

    let locals = resolve(&statements, diagnostics);

    if diagnostics.had_error() {
        info!("Static errors after resolving; not running");
        return;
    }

    let mut interpreter = Interpreter::with_output(output);
    interpret(&mut interpreter, &statements, locals, diagnostics);
}
