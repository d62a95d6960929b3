//! Clause parser producing the raw description record.
//!
//! The description language is a fixed sequence of key–value clauses
//! (`kind`, `alphabet`, `states`, `initial`, `final`, for pushdown machines
//! `stack` and `bottom`, then `transitions`). Each clause must appear
//! exactly once, in that order, with no intervening text; the first
//! violation aborts with a structural diagnostic naming the clause. The
//! parser only records what it saw – names stay strings and nothing is
//! checked against the alphabet or state set. Cross-reference validation
//! lives in the builder.

use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Which machine family a description declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
  Dfa,
  Ctr,
  Dpda,
}

impl Flavor {
  pub fn name(self) -> &'static str {
    match self {
      Flavor::Dfa => "dfa",
      Flavor::Ctr => "ctr",
      Flavor::Dpda => "dpda",
    }
  }
}

/// A transition exactly as written, fields still raw text.
///
/// Optional fields hold `None` when the description left the slot empty
/// (an ε input symbol, an `any` counter guard, a `nop` counter action, an
/// empty push string).
#[derive(Debug, Clone)]
pub enum RawTransition {
  Dfa {
    from: String,
    sym: String,
    to: String,
    loc: usize,
  },
  Ctr {
    from: String,
    sym: Option<String>,
    guard: Option<String>,
    to: String,
    action: Option<String>,
    loc: usize,
  },
  Dpda {
    from: String,
    sym: Option<String>,
    top: String,
    to: String,
    push: Option<String>,
    loc: usize,
  },
}

/// Parsed-but-unvalidated description: lists and records, nothing resolved.
#[derive(Debug, Clone)]
pub struct RawDescription {
  pub flavor: Flavor,
  pub alphabet: Vec<(String, usize)>,
  pub states: Vec<(String, usize)>,
  pub initial: (String, usize),
  pub finals: Vec<(String, usize)>,
  pub stack: Vec<(String, usize)>,
  pub bottom: Option<(String, usize)>,
  pub transitions: Vec<RawTransition>,
}

/// Parse a tokenized description into the raw record.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<RawDescription> {
  let mut stream = TokenStream::new(tokens, source);

  if stream.is_eof() {
    return Err(CompileError::at(source, 0, "description is empty"));
  }

  stream.clause_key("kind")?;
  let (kind_text, kind_loc) = stream.get_ident()?;
  let flavor = match kind_text.as_str() {
    "dfa" => Flavor::Dfa,
    "ctr" => Flavor::Ctr,
    "dpda" => Flavor::Dpda,
    other => {
      return Err(CompileError::at(
        source,
        kind_loc,
        format!("unknown machine kind '{other}' (expected dfa, ctr or dpda)"),
      ));
    }
  };

  stream.clause_key("alphabet")?;
  let alphabet = parse_ident_set(&mut stream)?;

  stream.clause_key("states")?;
  let states = parse_ident_set(&mut stream)?;

  stream.clause_key("initial")?;
  let initial = stream.get_ident()?;

  stream.clause_key("final")?;
  let finals = parse_ident_set(&mut stream)?;

  let (stack, bottom) = if flavor == Flavor::Dpda {
    stream.clause_key("stack")?;
    let stack = parse_ident_set(&mut stream)?;
    stream.clause_key("bottom")?;
    let bottom = stream.get_ident()?;
    (stack, Some(bottom))
  } else {
    (Vec::new(), None)
  };

  stream.clause_key("transitions")?;
  let transitions = parse_transition_set(&mut stream, flavor)?;

  if !stream.is_eof() {
    let loc = stream.current_loc();
    let got = describe_token(stream.peek(), source);
    return Err(CompileError::at(
      source,
      loc,
      format!("trailing text after transitions clause: \"{got}\""),
    ));
  }

  Ok(RawDescription {
    flavor,
    alphabet,
    states,
    initial,
    finals,
    stack,
    bottom,
    transitions,
  })
}

/// `{a,b,…}` – possibly empty, duplicates not checked here.
fn parse_ident_set(stream: &mut TokenStream) -> CompileResult<Vec<(String, usize)>> {
  stream.skip("{")?;
  let mut items = Vec::new();
  if !stream.peek_is("}") {
    loop {
      items.push(stream.get_ident()?);
      if !stream.equal(",") {
        break;
      }
    }
  }
  stream.skip("}")?;
  Ok(items)
}

fn parse_transition_set(
  stream: &mut TokenStream,
  flavor: Flavor,
) -> CompileResult<Vec<RawTransition>> {
  stream.skip("{")?;
  let mut transitions = Vec::new();
  if !stream.peek_is("}") {
    loop {
      transitions.push(parse_transition(stream, flavor)?);
      if !stream.equal(",") {
        break;
      }
    }
  }
  stream.skip("}")?;
  Ok(transitions)
}

fn parse_transition(stream: &mut TokenStream, flavor: Flavor) -> CompileResult<RawTransition> {
  let loc = stream.current_loc();
  stream.skip("(")?;
  match flavor {
    Flavor::Dfa => {
      let (from, _) = stream.get_ident()?;
      stream.skip(",")?;
      let (sym, _) = stream.get_ident()?;
      stream.skip(")")?;
      stream.skip("->")?;
      let (to, _) = stream.get_ident()?;
      Ok(RawTransition::Dfa { from, sym, to, loc })
    }
    Flavor::Ctr => {
      let (from, _) = stream.get_ident()?;
      stream.skip(",")?;
      let sym = optional_field(stream, ",")?;
      stream.skip(",")?;
      let guard = optional_field(stream, ")")?;
      stream.skip(")")?;
      stream.skip("->")?;
      stream.skip("(")?;
      let (to, _) = stream.get_ident()?;
      stream.skip(",")?;
      let action = optional_field(stream, ")")?;
      stream.skip(")")?;
      Ok(RawTransition::Ctr {
        from,
        sym,
        guard,
        to,
        action,
        loc,
      })
    }
    Flavor::Dpda => {
      let (from, _) = stream.get_ident()?;
      stream.skip(",")?;
      let sym = optional_field(stream, ",")?;
      stream.skip(",")?;
      let (top, _) = stream.get_ident()?;
      stream.skip(")")?;
      stream.skip("->")?;
      stream.skip("(")?;
      let (to, _) = stream.get_ident()?;
      stream.skip(",")?;
      let push = optional_field(stream, ")")?;
      stream.skip(")")?;
      Ok(RawTransition::Dpda {
        from,
        sym,
        top,
        to,
        push,
        loc,
      })
    }
  }
}

/// A field that may be left empty before `closer` (`(q,,z)` style).
fn optional_field(stream: &mut TokenStream, closer: &str) -> CompileResult<Option<String>> {
  if stream.peek_is(closer) {
    return Ok(None);
  }
  let (text, _) = stream.get_ident()?;
  Ok(Some(text))
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  /// Take ownership of the token stream; the parser will advance `pos` as it consumes input.
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn current_loc(&self) -> usize {
    self
      .tokens
      .get(self.pos)
      .map(|token| token.loc)
      .unwrap_or(self.source.len())
  }

  fn peek_is(&self, symbol: &str) -> bool {
    self
      .peek()
      .filter(|token| {
        token.kind == TokenKind::Punctuator && token_text(token, self.source) == symbol
      })
      .is_some()
  }

  /// Consume the current token if it matches the provided punctuator.
  fn equal(&mut self, op: &str) -> bool {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Punctuator
      && token.len == op.len()
      && token_text(token, self.source) == op
    {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, s: &str) -> CompileResult<()> {
    if self.equal(s) {
      Ok(())
    } else {
      let (loc, got) = match self.tokens.get(self.pos) {
        Some(token) => (token.loc, describe_token(Some(token), self.source)),
        None => (self.source.len(), "EOF".to_string()),
      };
      Err(CompileError::at(
        self.source,
        loc,
        format!("expected \"{s}\", but got \"{got}\""),
      ))
    }
  }

  /// Consume the fixed `key=` prefix of a clause, diagnosing order violations.
  fn clause_key(&mut self, key: &str) -> CompileResult<()> {
    let loc = self.current_loc();
    let (text, _) = self.get_ident().map_err(|_| {
      let got = describe_token(self.tokens.get(self.pos), self.source);
      CompileError::at(
        self.source,
        loc,
        format!("expected clause '{key}', but got \"{got}\""),
      )
    })?;
    if text != key {
      return Err(CompileError::at(
        self.source,
        loc,
        format!("expected clause '{key}', found '{text}'"),
      ));
    }
    self.skip("=")
  }

  /// Parse the current token as an identifier.
  fn get_ident(&mut self) -> CompileResult<(String, usize)> {
    if let Some(token) = self.tokens.get(self.pos)
      && token.kind == TokenKind::Ident
    {
      let text = token_text(token, self.source);
      let loc = token.loc;
      self.pos += 1;
      return Ok((text.to_string(), loc));
    }

    let Some(token) = self.tokens.get(self.pos) else {
      return Err(CompileError::at(
        self.source,
        self.source.len(),
        "unexpected end of input while parsing identifier",
      ));
    };
    let got = describe_token(Some(token), self.source);
    Err(CompileError::at(
      self.source,
      token.loc,
      format!("expected an identifier, but got \"{got}\""),
    ))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof))
  }
}
