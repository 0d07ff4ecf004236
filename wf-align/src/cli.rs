use crate::{AlignerParams, Fr, HeuristicConfig, MemoryMode};
use clap::Parser;
use serde::{Deserialize, Serialize};
use wf_types::{Cost, Penalties, ScoringKind};

fn parse_band(s: &str) -> Result<(Fr, Fr), String> {
    let (lo, hi) = s
        .split_once(',')
        .ok_or_else(|| format!("expected MIN,MAX but got `{s}`"))?;
    let parse = |x: &str| {
        x.trim()
            .parse::<Fr>()
            .map_err(|e| format!("invalid diagonal `{x}`: {e}"))
    };
    Ok((parse(lo)?, parse(hi)?))
}

/// Scoring arguments.
#[derive(Parser, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[clap(next_help_heading = "Scoring")]
#[serde(deny_unknown_fields)]
pub struct ScoringArgs {
    /// The cost model.
    #[clap(long, default_value_t, value_enum, display_order = 10)]
    pub scoring: ScoringKind,

    #[clap(short = 'x', long, default_value_t = 4, display_order = 10)]
    pub mismatch: Cost,

    #[clap(short = 'o', long, default_value_t = 6, display_order = 10)]
    pub gap_open1: Cost,

    #[clap(short = 'e', long, default_value_t = 2, display_order = 10)]
    pub gap_extend1: Cost,

    /// Gap-open of the second piece; only used by `affine2p`.
    #[clap(long, default_value_t = 24, hide_short_help = true)]
    pub gap_open2: Cost,

    /// Gap-extend of the second piece; only used by `affine2p`.
    #[clap(long, default_value_t = 1, hide_short_help = true)]
    pub gap_extend2: Cost,
}

/// Memory and cutoff arguments.
#[derive(Parser, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[clap(next_help_heading = "Engine")]
#[serde(deny_unknown_fields)]
pub struct EngineArgs {
    /// Which frames to keep for the backtrace.
    #[clap(long, default_value_t, value_enum)]
    pub memory: MemoryMode,

    /// Scores between checkpoints in the checkpointed memory modes.
    #[clap(long, default_value_t = 32, hide_short_help = true)]
    pub checkpoint_interval: Cost,

    /// Only explore diagonals `MIN..=MAX`.
    #[clap(long, value_name = "MIN,MAX", value_parser = parse_band)]
    pub band: Option<(Fr, Fr)>,

    /// Drop diagonals lagging this far behind the best antidiagonal.
    #[clap(long)]
    pub drop_off: Option<Fr>,

    #[clap(long, default_value_t = 1, hide_short_help = true)]
    pub steps_between_cutoffs: Cost,

    /// Give up at this score.
    #[clap(long)]
    pub max_score: Option<Cost>,
}

/// All aligner arguments, mapping one to one onto `AlignerParams`.
#[derive(Parser, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct AlignerArgs {
    #[clap(flatten)]
    pub scoring: ScoringArgs,

    #[clap(flatten)]
    pub engine: EngineArgs,
}

impl AlignerArgs {
    pub fn params(&self) -> AlignerParams {
        let s = &self.scoring;
        let e = &self.engine;
        AlignerParams {
            scoring: s.scoring,
            penalties: Penalties {
                mismatch: s.mismatch,
                gap_open1: s.gap_open1,
                gap_extend1: s.gap_extend1,
                gap_open2: s.gap_open2,
                gap_extend2: s.gap_extend2,
            },
            memory: e.memory,
            checkpoint_interval: e.checkpoint_interval,
            heuristic: HeuristicConfig {
                band: e.band,
                drop_off: e.drop_off,
                steps_between_cutoffs: e.steps_between_cutoffs,
            },
            max_score: e.max_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_test() {
        AlignerArgs::command().debug_assert();
    }

    #[test]
    fn defaults_match_params() {
        let args = AlignerArgs::parse_from(["wfalign"]);
        assert_eq!(args.params(), AlignerParams::default());
    }

    #[test]
    fn parses_flags() {
        let args = AlignerArgs::parse_from([
            "wfalign",
            "--scoring",
            "affine2p",
            "-x",
            "3",
            "--memory",
            "checkpointed-low",
            "--band=-5,7",
            "--drop-off",
            "20",
        ]);
        let p = args.params();
        assert_eq!(p.scoring, ScoringKind::Affine2Piece);
        assert_eq!(p.penalties.mismatch, 3);
        assert_eq!(p.memory, MemoryMode::CheckpointedLow);
        assert_eq!(p.heuristic.band, Some((-5, 7)));
        assert_eq!(p.heuristic.drop_off, Some(20));
        assert!(p.build().is_ok());
    }

    #[test]
    fn band_parser() {
        assert_eq!(parse_band("-3, 4"), Ok((-3, 4)));
        assert!(parse_band("3").is_err());
        assert!(parse_band("a,1").is_err());
    }
}
