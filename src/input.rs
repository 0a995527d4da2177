use crossterm::{
    cursor,
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, read},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::io::{self, BufRead, Write, stdout};
use zeroize::Zeroizing;

use crate::error::SupakeyError;

/// Blocking operator input. EOF and Ctrl+C surface as `SupakeyError::Cancelled`.
pub trait Prompter {
    /// Read one visible line, without its line ending.
    fn read_line(&mut self, prompt: &str) -> Result<String, SupakeyError>;

    /// Read one line without echoing it.
    fn read_secret(&mut self, prompt: &str) -> Result<String, SupakeyError>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String, SupakeyError> {
        print!("{}", prompt);
        stdout().flush()?;
        let stdin = io::stdin();
        read_plain_line(&mut stdin.lock())
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String, SupakeyError> {
        prompt_secret_with_fallback(prompt)
    }
}

fn read_plain_line(reader: &mut impl BufRead) -> Result<String, SupakeyError> {
    let mut input = Zeroizing::new(String::new());
    if reader.read_line(&mut input)? == 0 {
        return Err(SupakeyError::Cancelled);
    }
    Ok(strip_line_ending(&input).to_string())
}

fn strip_line_ending(input: &str) -> &str {
    let input = input.strip_suffix('\n').unwrap_or(input);
    input.strip_suffix('\r').unwrap_or(input)
}

/// Read a secret with visual masking (shows asterisks) using crossterm
pub fn prompt_secret_masked(prompt: &str) -> Result<String, io::Error> {
    print!("{}", prompt);
    stdout().flush()?;

    enable_raw_mode()?;

    let mut secret = Zeroizing::new(String::new());
    let result = read_masked_chars(&mut secret);

    let _ = disable_raw_mode();
    println!();

    result.map(|()| secret.to_string())
}

fn read_masked_chars(secret: &mut String) -> Result<(), io::Error> {
    loop {
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = read()?
        {
            if kind == KeyEventKind::Release {
                continue;
            }
            match code {
                KeyCode::Enter => break,

                KeyCode::Backspace => {
                    if secret.pop().is_some() {
                        execute!(
                            stdout(),
                            cursor::MoveLeft(1),
                            crossterm::style::Print(" "),
                            cursor::MoveLeft(1)
                        )?;
                    }
                }

                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "cancelled"));
                }

                KeyCode::Char(c) => {
                    secret.push(c);
                    print!("*");
                    stdout().flush()?;
                }

                _ => {}
            }
        }
    }

    Ok(())
}

/// Masked prompt, dropping to a plain stdin read when raw mode is unavailable
/// (piped input, dumb terminals).
pub fn prompt_secret_with_fallback(prompt: &str) -> Result<String, SupakeyError> {
    match prompt_secret_masked(prompt) {
        Ok(secret) => Ok(secret),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(SupakeyError::Cancelled),
        Err(_e) => {
            eprintln!("Note: Visual masking unavailable, input will be visible");

            print!("{}", prompt);
            stdout().flush()?;
            let stdin = io::stdin();
            read_plain_line(&mut stdin.lock())
        }
    }
}
