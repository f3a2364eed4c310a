use std::io::{BufRead, BufReader, Read, Write};

use crate::environment::Environment;
use crate::error::ParseError;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::object::{Object, Signal};
use crate::parser::Parser;

const PROMPT: &str = ">> ";

const LOGO: &str = r#"
   _____                 __
  / ___/____ _________ _/ /__
  \__ \/ __ `/ ___/ __ `/ //_/
 ___/ / /_/ (__  ) /_/ / ,<
/____/\__,_/____/\__,_/_/|_|
"#;

const FAREWELL: &str = "Goodbye!";

/// Reads lines from `reader` until EOF or `exit`, evaluating each one in a
/// single persistent environment.
pub fn start<R: Read, W: Write>(reader: R, mut writer: W) -> std::io::Result<()> {
    let evaluator = Evaluator::new();
    let env = Environment::new();
    let mut reader = BufReader::new(reader);

    write!(writer, "{}", LOGO)?;
    writeln!(writer, "Welcome to the sasak REPL!")?;
    writeln!(writer, "Type 'exit' or press Ctrl+D to quit.")?;
    writeln!(writer)?;

    loop {
        write!(writer, "{}", PROMPT)?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            writeln!(writer, "\n{}", FAREWELL)?;
            return Ok(());
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "keluar" {
            writeln!(writer, "{}", FAREWELL)?;
            return Ok(());
        }

        let l = Lexer::new(line);
        let mut p = Parser::new(l);
        let program = p.parse_program();
        if !p.errors().is_empty() {
            print_parser_errors(&mut writer, p.errors())?;
            continue;
        }

        match evaluator.eval_program(&program, &env) {
            Ok(Object::Null) => {}
            Ok(obj) => writeln!(writer, "{}", obj)?,
            Err(Signal::Error(err)) => writeln!(writer, "{}", err)?,
            Err(Signal::Break) => writeln!(writer, "error: 'break' outside of a loop")?,
            Err(Signal::Continue) => writeln!(writer, "error: 'continue' outside of a loop")?,
            Err(Signal::Return(obj)) => writeln!(writer, "{}", obj)?,
        }
    }
}

fn print_parser_errors<W: Write>(mut writer: W, errs: &[ParseError]) -> std::io::Result<()> {
    writeln!(writer, "parser errors:")?;
    for err in errs {
        writeln!(writer, "    {}", err)?;
    }
    writer.flush()
}

#[cfg(test)]
mod test {
    use super::start;
    use std::io::Cursor;

    fn session(input: &str) -> String {
        let mut out = Vec::new();
        start(Cursor::new(input.as_bytes()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_bindings_persist_between_lines() {
        let out = session("let a = 2\nlet b = a * 3\nb + 1\n");
        assert!(out.contains(">> 2\n"), "{}", out);
        assert!(out.contains(">> 6\n"), "{}", out);
        assert!(out.contains(">> 7\n"), "{}", out);
        assert!(out.ends_with("\nGoodbye!\n"), "{}", out);
    }

    #[test]
    fn test_null_results_are_not_printed() {
        let out = session("null\nexit\n");
        assert!(out.ends_with(">> >> Goodbye!\n"), "{}", out);
    }

    #[test]
    fn test_errors_do_not_end_the_session() {
        let out = session("let = 1\nmissing\nbreak\n1 + 1\n");
        assert!(out.contains("parser errors:\n    parse error [line 1, column 5]"), "{}", out);
        assert!(out.contains("error [line 1, column 1]: undefined variable 'missing'"), "{}", out);
        assert!(out.contains("error: 'break' outside of a loop"), "{}", out);
        assert!(out.contains(">> 2\n"), "{}", out);
    }

    #[test]
    fn test_exit_stops_reading() {
        let out = session("exit\n1 + 1\n");
        assert!(!out.contains('2'), "{}", out);
    }
}
