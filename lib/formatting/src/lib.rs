//! Terminal-colored text helpers for deployment reports.
//!
//! There is no browser UI here, so output is plain ANSI via `colored`
//! rather than HTML spans.

use colored::Colorize;

pub fn muted(content: impl std::fmt::Display) -> String {
  content.to_string().dimmed().to_string()
}

pub fn bold(content: impl std::fmt::Display) -> String {
  content.to_string().bold().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
  Red,
  Green,
  Blue,
  Yellow,
}

pub fn colored(content: impl std::fmt::Display, color: Color) -> String {
  let content = content.to_string();
  match color {
    Color::Red => content.red().to_string(),
    Color::Green => content.green().to_string(),
    Color::Blue => content.blue().to_string(),
    Color::Yellow => content.yellow().to_string(),
  }
}
