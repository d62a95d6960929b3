use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use ppac::error::ReadInputSnafu;
use snafu::ResultExt;

#[derive(Parser)]
#[command(author, version, about = "Compile automaton descriptions into C preprocessor recognizers")]
struct Cli {
  /// Description file (kind, alphabet, states, transitions, …)
  input: PathBuf,

  /// Directory the generated headers are written to (created if absent)
  outdir: PathBuf,

  /// Pretty-print the validated automaton to stderr before emission
  #[arg(long)]
  dump: bool,

  /// Log each generated header as it is written
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> Result<()> {
  color_eyre::install()?;
  let cli = Cli::parse();

  simplelog::TermLogger::init(
    if cli.verbose {
      simplelog::LevelFilter::Debug
    } else {
      simplelog::LevelFilter::Info
    },
    simplelog::Config::default(),
    simplelog::TerminalMode::Stderr,
    simplelog::ColorChoice::Auto,
  )?;

  let description = fs::read_to_string(&cli.input).context(ReadInputSnafu { path: &cli.input })?;

  let tokens = ppac::tokenizer::tokenize(&description)?;
  log::debug!("tokenized {} tokens from {}", tokens.len(), cli.input.display());

  let raw = ppac::parser::parse(tokens, &description)?;
  log::info!(
    "parsed {} description with {} states and {} transitions",
    raw.flavor.name(),
    raw.states.len(),
    raw.transitions.len()
  );

  let automaton = ppac::automaton::build(&raw, &description)?;
  if cli.dump {
    eprintln!("{automaton:#?}");
  }
  let (kind, states, transitions) = match &automaton {
    ppac::Automaton::Dfa(dfa) => ("dfa", dfa.states.len(), edge_count(&dfa.edges)),
    ppac::Automaton::Ctr(ctr) => ("ctr", ctr.states.len(), edge_count(&ctr.edges)),
    ppac::Automaton::Dpda(dpda) => ("dpda", dpda.states.len(), edge_count(&dpda.edges)),
  };
  log::info!("validated {kind} machine with {states} states and {transitions} transitions");

  let headers = ppac::emit_headers(&automaton);
  log::info!("emitted {} headers", headers.len());

  headers.write_to_dir(&cli.outdir)?;
  log::info!(
    "wrote {} headers to {}",
    headers.len(),
    cli.outdir.display()
  );

  Ok(())
}

fn edge_count<T>(edges: &[Vec<T>]) -> usize {
  edges.iter().map(Vec::len).sum()
}
