use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("Please enter a valid number")]
    NotANumber,
    #[error("Please enter a number between 1 and {count}")]
    OutOfRange { count: usize },
    #[error("Please enter 'y' or 'n'")]
    InvalidAnswer,
}

/// Parses a 1-based menu selection into a 0-based index below `count`.
pub fn parse_choice(raw: &str, count: usize) -> Result<usize, ChoiceError> {
    let number: usize = raw.trim().parse().map_err(|_| ChoiceError::NotANumber)?;
    if number == 0 || number > count {
        return Err(ChoiceError::OutOfRange { count });
    }
    Ok(number - 1)
}

/// Like [`parse_choice`], but blank input selects `default` (0-based).
pub fn parse_menu_choice(raw: &str, count: usize, default: usize) -> Result<usize, ChoiceError> {
    if raw.trim().is_empty() {
        return Ok(default);
    }
    parse_choice(raw, count)
}

pub fn parse_yes_no(raw: &str, default: bool) -> Result<bool, ChoiceError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        _ => Err(ChoiceError::InvalidAnswer),
    }
}

/// Line-oriented prompt over arbitrary streams; stdin/stdout in the binary.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("Input closed before an answer was given");
        }
        Ok(line)
    }

    /// Repeats `message` until `parse` accepts the answer.
    pub fn ask_until<T>(
        &mut self,
        message: &str,
        parse: impl Fn(&str) -> Result<T, ChoiceError>,
    ) -> Result<T> {
        loop {
            let answer = self.ask(message)?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(err) => writeln!(self.output, "{err}")?,
            }
        }
    }

    pub fn select(&mut self, message: &str, count: usize) -> Result<usize> {
        self.ask_until(message, |raw| parse_choice(raw, count))
    }

    pub fn select_with_default(
        &mut self,
        message: &str,
        count: usize,
        default: usize,
    ) -> Result<usize> {
        self.ask_until(message, |raw| parse_menu_choice(raw, count, default))
    }

    pub fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        self.ask_until(message, |raw| parse_yes_no(raw, default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_choice_maps_to_zero_based_index() {
        assert_eq!(parse_choice("1", 3), Ok(0));
        assert_eq!(parse_choice(" 3\n", 3), Ok(2));
        assert_eq!(parse_choice("0", 3), Err(ChoiceError::OutOfRange { count: 3 }));
        assert_eq!(parse_choice("4", 3), Err(ChoiceError::OutOfRange { count: 3 }));
        assert_eq!(parse_choice("two", 3), Err(ChoiceError::NotANumber));
        assert_eq!(parse_choice("-1", 3), Err(ChoiceError::NotANumber));
    }

    #[test]
    fn blank_menu_input_uses_default() {
        assert_eq!(parse_menu_choice("\n", 3, 0), Ok(0));
        assert_eq!(parse_menu_choice("2", 3, 0), Ok(1));
    }

    #[test]
    fn yes_no_accepts_short_and_long_forms() {
        assert_eq!(parse_yes_no("Y", false), Ok(true));
        assert_eq!(parse_yes_no("no", true), Ok(false));
        assert_eq!(parse_yes_no("", true), Ok(true));
        assert_eq!(parse_yes_no("maybe", true), Err(ChoiceError::InvalidAnswer));
    }

    #[test]
    fn prompter_retries_until_valid() {
        let input = Cursor::new("abc\n9\n2\n");
        let mut output = Vec::new();
        let choice = Prompter::new(input, &mut output)
            .select("Select preset (1-2): ", 2)
            .unwrap();
        assert_eq!(choice, 1);

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Please enter a valid number"));
        assert!(transcript.contains("Please enter a number between 1 and 2"));
    }

    #[test]
    fn closed_input_cancels() {
        let mut output = Vec::new();
        let result = Prompter::new(Cursor::new(""), &mut output).confirm("Proceed? ", true);
        assert!(result.is_err());
    }
}
