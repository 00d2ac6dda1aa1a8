//! Grammaticality checker over POS-tag sequences using a CFG recognizer.
//!
//! Reads a labeled TSV dataset, decides for each row whether its POS sequence
//! is in the grammar's language, writes per-row predictions, and reports a
//! confusion matrix with precision/recall.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::Context;
use clap::Parser;
use log::info;

use posgram::classify;
use posgram::dataset::{self, InputRow, OutputRow};
use posgram::eval::{Confusion, Metrics};
use posgram::Grammar;

#[derive(Parser)]
#[command(
    name = "posgram",
    about = "Classify POS-tag sequences as grammatical via CFG membership",
    long_about = "Reads a TSV dataset with columns id, label, sentence, pos,\n\
                  runs an Earley recognizer over each row's POS sequence against\n\
                  the given CFG, writes a TSV of predictions (0 = grammatical,\n\
                  1 = ungrammatical), and reports precision/recall against the\n\
                  ground-truth labels."
)]
struct Args {
    /// Input TSV with columns: id, label, sentence, pos (any order)
    input_tsv: PathBuf,

    /// CFG grammar file (POS-tag terminals, first LHS is the start symbol)
    grammar_cfg: PathBuf,

    /// Output TSV with columns: id, ground_truth, prediction
    output_tsv: PathBuf,

    /// JSON metrics report destination
    #[arg(long = "metrics-json", default_value = "reports/metrics.json")]
    metrics_json: PathBuf,

    /// Text metrics report destination
    #[arg(long = "metrics-txt", default_value = "reports/metrics.txt")]
    metrics_txt: PathBuf,

    /// Worker threads (default: available parallelism)
    #[arg(short = 'j', long = "jobs")]
    jobs: Option<usize>,

    /// Per-row chart state budget; rows exceeding it count as ungrammatical
    #[arg(long = "max-states")]
    max_states: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let grammar_text = fs::read_to_string(&args.grammar_cfg)
        .with_context(|| format!("Failed to read grammar file: {:?}", args.grammar_cfg))?;
    let grammar = Grammar::load(&grammar_text)
        .with_context(|| format!("Failed to parse grammar file: {:?}", args.grammar_cfg))?;
    info!(
        "loaded grammar with start symbol '{}' from {:?}",
        grammar.start_symbol(),
        args.grammar_cfg
    );

    let rows = dataset::read_input(&args.input_tsv)
        .with_context(|| format!("Failed to read input dataset: {:?}", args.input_tsv))?;
    info!("read {} rows from {:?}", rows.len(), args.input_tsv);

    let jobs = args.jobs.filter(|&j| j > 0).unwrap_or_else(|| {
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    });

    let (output, confusion) = run_batch(&grammar, &rows, jobs, args.max_states);

    dataset::write_output(&args.output_tsv, &output)
        .with_context(|| format!("Failed to write output dataset: {:?}", args.output_tsv))?;
    info!("wrote {} predictions to {:?}", output.len(), args.output_tsv);

    write_reports(&confusion, &args.metrics_json, &args.metrics_txt)?;
    println!("{}", confusion.summary());

    Ok(())
}

/// Classify every row and tally the confusion matrix.
///
/// The grammar is read-only after load, so it is shared by reference across
/// scoped worker threads. Each worker handles a contiguous chunk and returns
/// its rows in order plus a private partial tally; concatenating chunk
/// results preserves input order and merging partials needs no locking.
fn run_batch(
    grammar: &Grammar,
    rows: &[InputRow],
    jobs: usize,
    max_states: Option<usize>,
) -> (Vec<OutputRow>, Confusion) {
    if rows.is_empty() {
        return (Vec::new(), Confusion::new());
    }
    let jobs = jobs.min(rows.len());
    let chunk_size = (rows.len() + jobs - 1) / jobs;

    let partials: Vec<(Vec<OutputRow>, Confusion)> = thread::scope(|scope| {
        let handles: Vec<_> = rows
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    let mut out = Vec::with_capacity(chunk.len());
                    let mut conf = Confusion::new();
                    for row in chunk {
                        let prediction = classify::predict(grammar, &row.tokens, max_states);
                        conf.accumulate(row.ground_truth, prediction);
                        out.push(OutputRow {
                            id: row.id.clone(),
                            ground_truth: row.ground_truth,
                            prediction,
                        });
                    }
                    (out, conf)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker thread panicked"))
            .collect()
    });

    let mut output = Vec::with_capacity(rows.len());
    let mut confusion = Confusion::new();
    for (rows, partial) in partials {
        output.extend(rows);
        confusion.merge(partial);
    }
    (output, confusion)
}

fn write_reports(confusion: &Confusion, json_path: &Path, txt_path: &Path) -> anyhow::Result<()> {
    let metrics = Metrics::from(confusion);

    for path in [json_path, txt_path] {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create report directory: {:?}", parent))?;
            }
        }
    }

    let json = serde_json::to_string_pretty(&metrics).context("Failed to serialize metrics")?;
    fs::write(json_path, json)
        .with_context(|| format!("Failed to write JSON metrics: {:?}", json_path))?;

    fs::write(txt_path, format!("{}\n", confusion.summary()))
        .with_context(|| format!("Failed to write text metrics: {:?}", txt_path))?;

    info!("wrote metrics to {:?} and {:?}", json_path, txt_path);
    Ok(())
}
