//! Header emission: shared plumbing for the three families.
//!
//! Emitters build every header as an in-memory string first; writing to
//! the output directory happens in one final step once the whole family
//! has been rendered.

use crate::error::{CompileResult, CreateOutDirSnafu, WriteHeaderSnafu};
use snafu::ResultExt;
use std::fs;
use std::path::Path;

pub mod ctr;
pub mod dfa;
pub mod dpda;

/// An ordered collection of named header files.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
  files: Vec<(String, String)>,
}

impl HeaderSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, name: impl Into<String>, contents: impl Into<String>) {
    self.files.push((name.into(), contents.into()));
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.files.iter().map(|(name, _)| name.as_str())
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .files
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, contents)| contents.as_str())
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// Write every header under `dir`, creating the directory if absent.
  pub fn write_to_dir(&self, dir: &Path) -> CompileResult<()> {
    fs::create_dir_all(dir).context(CreateOutDirSnafu { path: dir })?;
    for (name, contents) in &self.files {
      let path = dir.join(name);
      fs::write(&path, contents).context(WriteHeaderSnafu { path: &path })?;
      log::debug!("wrote {}", path.display());
    }
    Ok(())
  }
}

/// String builder that tracks the physical line number as it goes.
///
/// The pushdown emitter needs this: its `TOP(L)` reads subtract a line
/// offset that must match exactly where in the file the comparison ends
/// up, so every emitted line is accounted for.
pub struct HeaderWriter {
  buf: String,
  line: usize,
}

impl HeaderWriter {
  pub fn new() -> Self {
    Self {
      buf: String::new(),
      line: 1,
    }
  }

  /// The physical line number the next `push` will occupy (1-based).
  pub fn current_line(&self) -> usize {
    self.line
  }

  /// Append one line. The text must not itself contain newlines.
  pub fn push(&mut self, text: &str) {
    debug_assert!(!text.contains('\n'));
    self.buf.push_str(text);
    self.buf.push('\n');
    self.line += 1;
  }

  pub fn finish(self) -> String {
    self.buf
  }
}

impl Default for HeaderWriter {
  fn default() -> Self {
    Self::new()
  }
}

/// Emit the `A_*` symbol codes shared by every family's entry header.
pub(crate) fn push_symbol_codes(lines: &mut Vec<String>, enc: &crate::encoding::Encoding) {
  lines.push(format!("#define A_SIZE {}", enc.a_size));
  lines.push(format!("#define A_MASK {}", enc.mask));
  lines.push("#define END 0".to_string());
  for &(sym, code) in &enc.codes {
    lines.push(format!(
      "#define {} {code}",
      crate::encoding::Encoding::macro_name(sym)
    ));
  }
}

/// Emit the `__COUNTER__`-driven stream macros used by the DFA and DPDA
/// families. Evaluating `CTR` once per decoder arm advances the stream by
/// one field every `CTR_STEP` evaluations.
pub(crate) fn push_counter_stream_defs(lines: &mut Vec<String>, enc: &crate::encoding::Encoding) {
  lines.push(format!("#define CTR_STEP {}", enc.step));
  lines.push("#define CTR (__COUNTER__ / CTR_STEP)".to_string());
  lines.push("#define GET_SYM ((INPUT >> (CTR * A_SIZE)) & A_MASK)".to_string());
}

/// The `get_sym.h` decoder for the counter-driven families: pins the
/// current symbol into `CUR_SYM` and pads the counter so that every arm,
/// matched or not, leaves the stream at the next field boundary.
pub(crate) fn counter_decoder(enc: &crate::encoding::Encoding) -> String {
  let mut lines = vec!["#undef CUR_SYM".to_string()];
  for (arm, &(sym, _)) in enc.codes.iter().enumerate() {
    let name = crate::encoding::Encoding::macro_name(sym);
    let keyword = if arm == 0 { "#if" } else { "#elif" };
    lines.push(format!("{keyword} GET_SYM == {name}"));
    lines.push(format!("#define CUR_SYM {name}"));
    // arm is 0-based; this arm evaluated GET_SYM arm+1 times so far
    let pad = enc.step as usize - (arm + 1);
    if pad > 0 {
      let ticks = vec!["CTR"; pad].join(" + ");
      lines.push(format!("#if 0 * ({ticks})"));
      lines.push("#endif".to_string());
    }
  }
  lines.push("#elif GET_SYM == END".to_string());
  lines.push("#define CUR_SYM END".to_string());
  lines.push("#else".to_string());
  lines.push("#define CUR_SYM (-1)".to_string());
  lines.push("#endif".to_string());
  let mut out = lines.join("\n");
  out.push('\n');
  out
}

/// Join condition conjuncts into a `#if`-ready expression.
pub(crate) fn conjoin(conjuncts: &[String]) -> String {
  if conjuncts.is_empty() {
    "1".to_string()
  } else {
    conjuncts.join(" && ")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn writer_tracks_physical_lines() {
    let mut w = HeaderWriter::new();
    assert_eq!(w.current_line(), 1);
    w.push("#line NEXT_ST_SYM");
    w.push("#include \"get_sym.h\"");
    assert_eq!(w.current_line(), 3);
    assert_eq!(w.finish(), "#line NEXT_ST_SYM\n#include \"get_sym.h\"\n");
  }

  #[test]
  fn conjoin_falls_back_to_always_true() {
    assert_eq!(conjoin(&[]), "1");
    assert_eq!(
      conjoin(&["CUR_SYM == A_a".into(), "IS_ZERO".into()]),
      "CUR_SYM == A_a && IS_ZERO"
    );
  }

  #[test]
  fn decoder_arms_tick_the_counter_a_constant_number_of_times() {
    let enc = crate::encoding::Encoding::for_alphabet(&['a', 'b', 'c']);
    let decoder = counter_decoder(&enc);
    // Matching arm k evaluated GET_SYM k times; its dead padding must
    // bring the total to CTR_STEP. The END arm needs no padding by
    // construction.
    let mut arm = 0usize;
    for line in decoder.lines() {
      if line.starts_with("#if GET_SYM") || line.starts_with("#elif GET_SYM") {
        arm += 1;
      }
      if let Some(rest) = line.strip_prefix("#if 0 * (") {
        let pad = rest.matches("CTR").count();
        assert_eq!(arm + pad, enc.step as usize);
      }
    }
    // one arm per symbol plus the END arm
    assert_eq!(arm, enc.codes.len() + 1);
  }

  #[test]
  fn header_set_preserves_order_and_lookup() {
    let mut set = HeaderSet::new();
    set.push("dfa.h", "x");
    set.push("get_sym.h", "y");
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["dfa.h", "get_sym.h"]);
    assert_eq!(set.get("get_sym.h"), Some("y"));
    assert_eq!(set.get("missing.h"), None);
  }
}
