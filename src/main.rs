use std::{env, process};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use lox::Lox;

const HISTORY_FILE: &str = ".lox_history";

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut stdout = std::io::stdout();
    let mut lox = Lox::new(&mut stdout);

    match args.len() {
        n if n > 2 => {
            println!("Usage: lox [script]");
            process::exit(64);
        }
        2 => process::exit(lox.run_file(&args[1])),
        _ => run_prompt(&mut lox),
    };
}

/// A rustyline-backed REPL: each line is run through the same pipeline as
/// a script, with history persisted to `~/.lox_history` across sessions.
/// Errors on a line only clear that line's flags — they never carry over
/// and poison the next one.
fn run_prompt(lox: &mut Lox) {
    let mut editor = DefaultEditor::new().expect("should be able to start the line editor");

    let history_path = home::home_dir().map(|home| home.join(HISTORY_FILE));
    if let Some(path) = &history_path {
        let _ = editor.load_history(path);
    }

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                lox.run(&line);
                lox.reset_errors();
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(error) => {
                eprintln!("Error reading input: {error}");
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        let _ = editor.save_history(path);
    }
}
