//! Terminal output for the interactive driver.
//!
//! Status lines are colored only when the stream supports it, so piping the
//! output into a file or CI log stays readable.

use owo_colors::{OwoColorize, Stream};

pub mod symbols {
    pub const SUCCESS: &str = "✓";
    pub const ERROR: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const INFO: &str = "•";
}

const RULE_WIDTH: usize = 80;

pub fn print_header(text: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    println!();
    println!("{}", rule.if_supports_color(Stream::Stdout, |s| s.cyan()));
    println!("  {}", text.if_supports_color(Stream::Stdout, |s| s.bold()));
    println!("{}", rule.if_supports_color(Stream::Stdout, |s| s.cyan()));
    println!();
}

pub fn print_section(text: &str) {
    println!();
    println!(
        "{}",
        format!("--- {text} ---").if_supports_color(Stream::Stdout, |s| s.bold())
    );
}

pub fn print_success(message: &str) {
    println!(
        "{} {}",
        symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
        message
    );
}

pub fn print_error(message: &str) {
    eprintln!(
        "{} {}",
        symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
        format!("ERROR: {message}").if_supports_color(Stream::Stderr, |s| s.red())
    );
}

pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
        format!("WARNING: {message}").if_supports_color(Stream::Stderr, |s| s.yellow())
    );
}

pub fn print_info(message: &str) {
    println!(
        "{} {}",
        symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
        message
    );
}

/// Indented detail line under a section or status message.
pub fn print_detail(message: &str) {
    println!("  {message}");
}

pub fn print_stat(label: &str, value: &str) {
    println!(
        "  {}: {}",
        label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
        value
    );
}
