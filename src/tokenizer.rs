//! Lexical analysis: turns the raw description text into a vector of tokens.
//!
//! The tokenizer is intentionally tiny – it knows nothing about clause
//! structure beyond recognising punctuators and identifier runs. The
//! two-character arrow is matched before single-character punctuators to
//! avoid ambiguity, and whitespace (including newlines) only separates
//! tokens, which gives the description language its whitespace-insensitive
//! surface.

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  /// A `\w`-class run (state names, symbols, push strings) or a lone `$`.
  Ident,
  Punctuator,
  Eof,
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  /// Convenience constructor to keep the `tokenize` loop readable.
  pub fn new(kind: TokenKind, loc: usize, len: usize) -> Self {
    Self { kind, loc, len }
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_alphanumeric() || c == b'_' {
      let start = i;
      i += 1;
      while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
      }
      tokens.push(Token::new(TokenKind::Ident, start, i - start));
      continue;
    }

    // The end marker is a one-character symbol of its own.
    if c == b'$' {
      tokens.push(Token::new(TokenKind::Ident, i, 1));
      i += 1;
      continue;
    }

    if input[i..].starts_with("->") {
      tokens.push(Token::new(TokenKind::Punctuator, i, 2));
      i += 2;
      continue;
    }

    if matches!(c, b'{' | b'}' | b'(' | b')' | b',' | b'=') {
      tokens.push(Token::new(TokenKind::Punctuator, i, 1));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::at(
      input,
      i,
      format!("invalid token: '{invalid_char}'"),
    ));
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0));
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}
