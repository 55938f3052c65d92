// arturo - The Arturo programming language interpreter
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use arturo_core::{Error, ErrorKind};
use arturo_embed::Engine;
use colored::Colorize;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("--version") | Some("-v") => {
            println!("Arturo v{}", VERSION);
        }
        Some("--help") | Some("-h") => {
            print_help();
        }
        Some("--evaluate") | Some("-e") => match args.get(2) {
            Some(code) => run_code(code),
            None => {
                eprintln!("Error: -e/--evaluate needs a code argument");
                process::exit(1);
            }
        },
        Some(script) => run_file(script),
        None => run_repl(),
    }
}

fn print_help() {
    println!("Arturo v{}", VERSION);
    println!();
    println!("Usage:");
    println!("    arturo                  start the interactive console");
    println!("    arturo <script>.art     execute a script");
    println!("    arturo -e <code>        evaluate a code string");
    println!();
    println!("Options:");
    println!("    -h, --help              print this help");
    println!("    -v, --version           print the version");
    println!("    -e, --evaluate <code>   evaluate a code string and exit");
}

/// Exit code 2 for parse errors, 1 for runtime errors.
fn exit_code(error: &Error) -> i32 {
    match error.kind {
        ErrorKind::Parse { .. } => 2,
        _ => 1,
    }
}

fn report(error: &Error) {
    let prefix = format!(">> {}:", error.kind.human_name()).red().bold();
    eprintln!("{} {}", prefix, error);
}

fn run_code(code: &str) {
    let mut engine = Engine::new();
    if let Err(e) = engine.eval(code) {
        report(&e);
        process::exit(exit_code(&e));
    }
}

fn run_file(path_arg: &str) {
    let path = Path::new(path_arg);

    match path.extension().and_then(|e| e.to_str()) {
        Some("art") => {}
        Some(ext) => {
            eprintln!(
                "Error: unsupported file extension '.{}' for '{}' (expected .art)",
                ext, path_arg
            );
            process::exit(1);
        }
        None => {
            eprintln!(
                "Error: file '{}' has no extension (expected .art)",
                path_arg
            );
            process::exit(1);
        }
    }

    let mut engine = Engine::new();
    if let Err(e) = engine.eval_file(path) {
        report(&e);
        process::exit(exit_code(&e));
    }
}

fn run_repl() {
    println!("Arturo v{}", VERSION);

    let mut engine = Engine::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                if input == "exit" || input == "quit" {
                    break;
                }
                match engine.eval(input) {
                    Ok(arturo_parser::ArturoVal::Null) => {}
                    Ok(value) => println!("{}", value),
                    Err(e) => report(&e),
                }
            }
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }
}
