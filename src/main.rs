//! sasak CLI

use std::io::{stdin, stdout};

use sasak::error::Error;
use sasak::{init_tracing, repl, run_source};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        if let Err(err) = repl::start(stdin(), stdout()) {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "version" | "--version" | "-v" => println!("sasak {}", VERSION),
        "help" | "--help" | "-h" => print_usage(),
        "run" => {
            if args.len() < 3 {
                eprintln!("Usage: sasak run <file>");
                std::process::exit(1);
            }
            run_file(&args[2]);
        }
        path if std::path::Path::new(path).is_file() => run_file(path),
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn run_file(path: &str) {
    if let Err(err) = run_path(path) {
        match err {
            Error::Parse(errors) => {
                for err in errors {
                    eprintln!("{}", err);
                }
            }
            Error::Io(err) => eprintln!("error: cannot read {}: {}", path, err),
            other => eprintln!("{}", other),
        }
        std::process::exit(1);
    }
}

fn run_path(path: &str) -> Result<(), Error> {
    let source = std::fs::read_to_string(path)?;
    run_source(&source)?;
    Ok(())
}

fn print_usage() {
    println!("sasak {}", VERSION);
    println!();
    println!("Usage:");
    println!("  sasak                 Start the REPL");
    println!("  sasak run <file>      Run a script");
    println!("  sasak <file>          Run a script (shortcut)");
    println!("  sasak version         Print the version");
    println!("  sasak help            Print this help");
}
