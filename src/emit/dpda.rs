//! Pushdown header family: the stack lives in `__LINE__`.
//!
//! Every state header opens with `#line NEXT_ST_SYM`, restamping its own
//! line counter to the small integer id of the stack symbol it was
//! entered under. `TOP(L)` reads the stamp back as `__LINE__ - L`, where
//! `L` is the distance from the stamp to the line performing the test –
//! the writer tracks physical lines so the emitted offsets are exact.
//! Pushing includes the successor header with a fresh stamp; the include
//! nesting is the stack. Popping never restamps: the popping header
//! records the successor in `NEXT_STATE`, defines `POP` and falls off its
//! end, unwinding to the nearest frame whose stamp is live again. That
//! frame's shim re-reads its own top into `NEXT_ST_SYM` and includes
//! `NEXT_STATE`. A frame is live behind exactly one include – a push –
//! and dead once it has delegated its cell to a replace or shim include,
//! so a pending `POP` simply falls through dead frames.
//!
//! A header entered by an ε-atom must dispatch on the symbol that is
//! still pending, so those states get an `_empty` variant that skips the
//! decoder; everything else about the two variants is identical.

use crate::atomize::{AtomAction, AtomDpda};
use crate::automaton::InputSym;
use crate::emit::{
  HeaderSet, HeaderWriter, conjoin, counter_decoder, push_counter_stream_defs, push_symbol_codes,
};
use crate::encoding::Encoding;

pub fn emit(atom: &AtomDpda, enc: &Encoding) -> HeaderSet {
  let mut set = HeaderSet::new();
  set.push("dpda.h", entry(atom, enc));
  set.push("get_sym.h", counter_decoder(enc));
  for q in 0..atom.states.len() {
    set.push(state_file(atom, q), state_header(atom, q, true));
    if atom.eps_entry[q] {
      set.push(empty_file(atom, q), state_header(atom, q, false));
    }
  }
  set
}

pub(crate) fn state_file(atom: &AtomDpda, q: usize) -> String {
  format!("dpda_{}.h", atom.states[q])
}

pub(crate) fn empty_file(atom: &AtomDpda, q: usize) -> String {
  format!("dpda_{}_empty.h", atom.states[q])
}

/// `ST_<g>`: the stack symbol's stamp id. Ids start at 1 because `#line 0`
/// is not valid C.
fn st_macro(g: char) -> String {
  format!("ST_{g}")
}

fn entry(atom: &AtomDpda, enc: &Encoding) -> String {
  let mut lines = vec![
    "/* Define INPUT, include this file, then test for RECOGNIZED. */".to_string(),
    "#ifndef INPUT".to_string(),
    "#error \"INPUT must be defined before including dpda.h\"".to_string(),
    "#endif".to_string(),
  ];
  push_symbol_codes(&mut lines, enc);
  push_counter_stream_defs(&mut lines, enc);
  for (i, &g) in atom.stack.iter().enumerate() {
    lines.push(format!("#define {} {}", st_macro(g), i + 1));
  }
  lines.push("#define TOP(L) (__LINE__ - (L))".to_string());
  lines.push(format!("#define NEXT_ST_SYM {}", st_macro(atom.bottom)));
  lines.push(format!("#include \"{}\"", state_file(atom, atom.initial)));
  let mut out = lines.join("\n");
  out.push('\n');
  out
}

/// One state header. `reading` selects the plain variant (decode a fresh
/// symbol) over the `_empty` one (dispatch on the pending symbol).
fn state_header(atom: &AtomDpda, q: usize, reading: bool) -> String {
  let is_final = atom.is_final[q];
  let mut w = HeaderWriter::new();
  w.push("#line NEXT_ST_SYM");
  if reading {
    w.push("#include \"get_sym.h\"");
  }
  if is_final {
    w.push("#define RECOGNIZED");
  }

  let mut keyword = "#if";
  for edge in &atom.edges[q] {
    let mut conjuncts = vec![format!(
      "TOP({}) == {}",
      w.current_line() - 2,
      st_macro(edge.top)
    )];
    match edge.sym {
      InputSym::Sym(c) => conjuncts.push(format!("CUR_SYM == {}", Encoding::macro_name(c))),
      InputSym::End => conjuncts.push("CUR_SYM == END".to_string()),
      InputSym::Epsilon => {}
    }
    w.push(&format!("{keyword} {}", conjoin(&conjuncts)));
    keyword = "#elif";

    if is_final {
      w.push("#undef RECOGNIZED");
    }
    let successor = if edge.sym.consumes() {
      state_file(atom, edge.to)
    } else {
      empty_file(atom, edge.to)
    };
    match edge.action {
      AtomAction::Push(pushed) => {
        w.push("#undef NEXT_ST_SYM");
        w.push(&format!("#define NEXT_ST_SYM {}", st_macro(pushed)));
        w.push(&format!("#include \"{successor}\""));
        pop_shim(atom, &mut w);
      }
      AtomAction::Replace(written) => {
        w.push("#undef NEXT_ST_SYM");
        w.push(&format!("#define NEXT_ST_SYM {}", st_macro(written)));
        w.push(&format!("#include \"{successor}\""));
      }
      AtomAction::Pop => {
        w.push("#undef NEXT_STATE");
        w.push(&format!("#define NEXT_STATE \"{successor}\""));
        w.push("#define POP");
      }
    }
  }
  if is_final {
    w.push(&format!("{keyword} CUR_SYM != END"));
    w.push("#undef RECOGNIZED");
    keyword = "#elif";
  }
  if keyword == "#elif" {
    w.push("#endif");
  }
  w.finish()
}

/// After a pushed frame returns with a pop pending, this frame's cell is
/// the top again: re-read the stamp into `NEXT_ST_SYM` and continue in
/// the recorded state. The shim's own include delegates the cell, so a
/// pop arriving back here afterwards falls through to the caller.
fn pop_shim(atom: &AtomDpda, w: &mut HeaderWriter) {
  w.push("#ifdef POP");
  w.push("#undef POP");
  let mut keyword = "#if";
  for &g in &atom.stack {
    w.push(&format!(
      "{keyword} TOP({}) == {}",
      w.current_line() - 2,
      st_macro(g)
    ));
    keyword = "#elif";
    w.push("#undef NEXT_ST_SYM");
    w.push(&format!("#define NEXT_ST_SYM {}", st_macro(g)));
  }
  w.push("#endif");
  w.push("#include NEXT_STATE");
  w.push("#endif");
}
