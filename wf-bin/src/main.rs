use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::process::ExitCode;
use wf_align::{cli::AlignerArgs, AlignerParams, Alignment, AlignmentSpan, LogStatus};
use wf_types::{seq_to_string, Result};

#[derive(ValueEnum, Default, Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    #[default]
    EndToEnd,
    Extension,
    EndsFree,
}

/// Align two sequences with the wavefront algorithm.
///
/// Set `RUST_LOG=trace` to follow the search score by score.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    pattern: String,
    text: String,

    /// Which ends of the sequences must be aligned.
    #[clap(long, value_enum, default_value_t)]
    span: SpanKind,

    /// Free leading pattern symbols for `--span ends-free`.
    #[clap(long, default_value_t = 0, value_name = "N")]
    pattern_begin_free: usize,
    #[clap(long, default_value_t = 0, value_name = "N")]
    pattern_end_free: usize,
    #[clap(long, default_value_t = 0, value_name = "N")]
    text_begin_free: usize,
    #[clap(long, default_value_t = 0, value_name = "N")]
    text_end_free: usize,

    /// Align the reversed sequences, preferring alignments found from the ends.
    #[clap(long)]
    reverse: bool,

    /// Print the result as JSON.
    #[clap(long)]
    json: bool,

    #[clap(flatten)]
    aligner: AlignerArgs,
}

#[derive(Serialize)]
struct Output<'a> {
    params: AlignerParams,
    alignment: &'a Alignment,
}

impl Cli {
    fn span(&self) -> AlignmentSpan {
        match self.span {
            SpanKind::EndToEnd => AlignmentSpan::EndToEnd,
            SpanKind::Extension => AlignmentSpan::Extension,
            SpanKind::EndsFree => AlignmentSpan::ends_free(
                self.pattern_begin_free,
                self.pattern_end_free,
                self.text_begin_free,
                self.text_end_free,
            ),
        }
    }

    fn run(&self) -> Result<String> {
        let params = self.aligner.params();
        let mut aligner = params.build()?.with_reporter(LogStatus::default());
        let (a, b) = (self.pattern.as_bytes(), self.text.as_bytes());
        let aln = if self.reverse {
            aligner.align_reversed(a, b, self.span())?
        } else {
            aligner.align(a, b, self.span())?
        };

        if self.json {
            let output = Output {
                params,
                alignment: &aln,
            };
            return Ok(serde_json::to_string_pretty(&output)
                .unwrap_or_else(|e| unreachable!("alignments always serialize: {e}")));
        }
        let (ra, rb) = aln.aligned_rows(a, b);
        let mut out = format!("score {}\ncigar {}\n", aln.score, aln.cigar);
        if self.span != SpanKind::EndToEnd {
            out += &format!(
                "pattern {}..{}\ntext {}..{}\n",
                aln.pattern_range.start,
                aln.pattern_range.end,
                aln.text_range.start,
                aln.text_range.end
            );
        }
        if !aln.exact {
            out += "cutoffs were active; the score is an upper bound\n";
        }
        out += &format!("{}\n{}", seq_to_string(&ra), seq_to_string(&rb));
        Ok(out)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.run() {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
