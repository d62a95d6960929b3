//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics are kept lightweight on purpose – description errors format
//! a one-line excerpt of the offending text and point at the offending
//! byte with a caret. I/O failures carry the path they occurred on.

use snafu::Snafu;
use std::path::PathBuf;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CompileError {
  #[snafu(display("{excerpt}\n{marker} {message}"))]
  WithLocation {
    excerpt: String,
    marker: String,
    message: String,
  },

  #[snafu(display("{message}"))]
  Invalid { message: String },

  #[snafu(display("cannot read description '{}': {source}", path.display()))]
  ReadInput {
    path: PathBuf,
    source: std::io::Error,
  },

  #[snafu(display("cannot create output directory '{}': {source}", path.display()))]
  CreateOutDir {
    path: PathBuf,
    source: std::io::Error,
  },

  #[snafu(display("cannot write header '{}': {source}", path.display()))]
  WriteHeader {
    path: PathBuf,
    source: std::io::Error,
  },
}

impl CompileError {
  /// Construct an error anchored at a specific byte offset in the source.
  ///
  /// The excerpt is clamped to the line containing `loc` so diagnostics stay
  /// one line even for multi-line descriptions.
  pub fn at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let safe_loc = loc.min(source.len());
    let line_start = source[..safe_loc].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = source[safe_loc..]
      .find('\n')
      .map(|i| safe_loc + i)
      .unwrap_or(source.len());
    let excerpt = format!("'{}'", &source[line_start..line_end]);
    let char_offset = source[line_start..safe_loc].chars().count() + 1; // account for opening quote
    let marker = format!("{}^", " ".repeat(char_offset));
    Self::WithLocation {
      excerpt,
      marker,
      message: message.into(),
    }
  }

  /// Construct a validation error with no source anchor.
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::Invalid {
      message: message.into(),
    }
  }
}
