//! DFA header family: one entry header, the shared decoder, one header
//! per state.
//!
//! The entry header defines the symbol codes and the counter-driven
//! stream macros, then includes the initial state. A state header reads
//! one symbol and dispatches on it; following an edge is just including
//! the successor's header, so the include nesting depth mirrors the run
//! length. A final state optimistically defines `RECOGNIZED`: every
//! outgoing branch takes it back before moving on, and a trailing guard
//! takes it back when input remains that no edge can consume, so the
//! definition survives exactly when the machine halts accepting.

use crate::automaton::Dfa;
use crate::emit::{HeaderSet, counter_decoder, push_counter_stream_defs, push_symbol_codes};
use crate::encoding::Encoding;

pub fn emit(dfa: &Dfa, enc: &Encoding) -> HeaderSet {
  let mut set = HeaderSet::new();
  set.push("dfa.h", entry(dfa, enc));
  set.push("get_sym.h", counter_decoder(enc));
  for q in 0..dfa.states.len() {
    set.push(state_file(dfa, q), state_header(dfa, q));
  }
  set
}

pub(crate) fn state_file(dfa: &Dfa, q: usize) -> String {
  format!("dfa_{}.h", dfa.states[q])
}

fn entry(dfa: &Dfa, enc: &Encoding) -> String {
  let mut lines = vec![
    "/* Define INPUT, include this file, then test for RECOGNIZED. */".to_string(),
    "#ifndef INPUT".to_string(),
    "#error \"INPUT must be defined before including dfa.h\"".to_string(),
    "#endif".to_string(),
  ];
  push_symbol_codes(&mut lines, enc);
  push_counter_stream_defs(&mut lines, enc);
  lines.push(format!("#include \"{}\"", state_file(dfa, dfa.initial)));
  let mut out = lines.join("\n");
  out.push('\n');
  out
}

fn state_header(dfa: &Dfa, q: usize) -> String {
  let is_final = dfa.is_final[q];
  let mut lines = vec!["#include \"get_sym.h\"".to_string()];
  if is_final {
    lines.push("#define RECOGNIZED".to_string());
  }

  let mut keyword = "#if";
  for edge in &dfa.edges[q] {
    lines.push(format!(
      "{keyword} CUR_SYM == {}",
      Encoding::macro_name(edge.sym)
    ));
    if is_final {
      lines.push("#undef RECOGNIZED".to_string());
    }
    lines.push(format!("#include \"{}\"", state_file(dfa, edge.to)));
    keyword = "#elif";
  }
  if is_final {
    // leftover input that no edge consumes means the run dies here
    lines.push(format!("{keyword} CUR_SYM != END"));
    lines.push("#undef RECOGNIZED".to_string());
    keyword = "#elif";
  }
  if keyword == "#elif" {
    lines.push("#endif".to_string());
  }

  let mut out = lines.join("\n");
  out.push('\n');
  out
}
