use super::*;

fn models() -> Vec<ScoringModel> {
    vec![
        ScoringModel::edit(),
        ScoringModel::linear(4, 3).unwrap(),
        ScoringModel::affine(4, 6, 2).unwrap(),
        ScoringModel::affine2p(4, 6, 2, 24, 1).unwrap(),
    ]
}

#[test]
fn single_deletion() {
    let mut aligner = WavefrontAligner::new(ScoringModel::edit());
    let aln = aligner.align_end_to_end(b"ACGT", b"AGT").unwrap();
    assert_eq!(aln.score, 1);
    assert_eq!(aln.cigar.ops_string(), "MDMM");
    assert_eq!(aln.cigar.to_string(), "1M1D2M");
    assert_eq!(aln.pattern_range, 0..4);
    assert_eq!(aln.text_range, 0..3);
    assert!(aln.exact);

    let mut aligner = WavefrontAligner::new(ScoringModel::affine(4, 6, 2).unwrap());
    let aln = aligner.align_end_to_end(b"ACGT", b"AGT").unwrap();
    assert_eq!(aln.score, 8);
    assert_eq!(aln.cigar.ops_string(), "MDMM");
}

#[test]
fn identical() {
    for cm in models() {
        for memory in [
            MemoryMode::FullHistory,
            MemoryMode::CheckpointedMedium,
            MemoryMode::CheckpointedLow,
        ] {
            let mut aligner = WavefrontAligner::new(cm.clone()).memory_mode(memory);
            let aln = aligner.align_end_to_end(b"AAAA", b"AAAA").unwrap();
            assert_eq!(aln.score, 0);
            assert_eq!(aln.cigar.ops_string(), "MMMM");
            assert_eq!(aligner.stats().frames, 1);
        }
    }
}

#[test]
fn empty_sequences() {
    let mut aligner = WavefrontAligner::new(ScoringModel::affine(4, 6, 2).unwrap());
    let aln = aligner.align_end_to_end(b"", b"").unwrap();
    assert_eq!(aln.score, 0);
    assert!(aln.cigar.is_empty());

    let aln = aligner.align_end_to_end(b"", b"ACGT").unwrap();
    assert_eq!(aln.score, 6 + 4 * 2);
    assert_eq!(aln.cigar.to_string(), "4I");

    let aln = aligner.align_end_to_end(b"ACGT", b"").unwrap();
    assert_eq!(aln.score, 6 + 4 * 2);
    assert_eq!(aln.cigar.to_string(), "4D");
}

#[test]
fn mismatches_only() {
    let mut aligner = WavefrontAligner::new(ScoringModel::affine(4, 6, 2).unwrap());
    let aln = aligner.align_end_to_end(b"AAAA", b"CCCC").unwrap();
    assert_eq!(aln.score, 16);
    assert_eq!(aln.cigar.to_string(), "4X");
}

#[test]
fn long_gap_uses_second_piece() {
    let cm = ScoringModel::affine2p(4, 6, 2, 24, 1).unwrap();
    let a = b"ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT";
    let b = &a[..24];
    let mut aligner = WavefrontAligner::new(cm.clone());
    let aln = aligner.align_end_to_end(a, b).unwrap();
    assert_eq!(aln.score, 64);
    assert_eq!(aln.cigar.verify(&cm, a, b), Some(64));

    // A short gap still prefers the first piece.
    let aln = aligner.align_end_to_end(b"ACGTTACGT", b"ACGTACGT").unwrap();
    assert_eq!(aln.score, 8);
}

#[test]
fn extension() {
    let mut aligner = WavefrontAligner::new(ScoringModel::affine(4, 6, 2).unwrap());
    let aln = aligner.align_extension(b"ACGTACGT", b"ACGTACGTTTTTT").unwrap();
    assert_eq!(aln.score, 0);
    assert_eq!(aln.cigar.to_string(), "8M");
    assert_eq!(aln.pattern_range, 0..8);
    assert_eq!(aln.text_range, 0..8);

    let aln = aligner.align_extension(b"ACGTAAAA", b"ACGT").unwrap();
    assert_eq!(aln.score, 0);
    assert_eq!(aln.pattern_range, 0..4);
    assert_eq!(aln.text_range, 0..4);

    // Leading differences are not free.
    let aln = aligner.align_extension(b"TACGT", b"ACGT").unwrap();
    assert_eq!(aln.score, 8);
}

#[test]
fn ends_free() {
    let mut aligner = WavefrontAligner::new(ScoringModel::affine(4, 6, 2).unwrap());
    let aln = aligner
        .align_ends_free(b"ACGT", b"TTACGTTT", 0, 0, 2, 2)
        .unwrap();
    assert_eq!(aln.score, 0);
    assert_eq!(aln.cigar.to_string(), "4M");
    assert_eq!(aln.text_range, 2..6);
    assert_eq!(aln.pattern_range, 0..4);
    let (p, t) = aln.aligned_rows(b"ACGT", b"TTACGTTT");
    assert_eq!(p, b"ACGT");
    assert_eq!(t, b"ACGT");

    // One more trailing symbol than is free costs a one-symbol gap.
    let aln = aligner
        .align_ends_free(b"ACGT", b"TTACGTTT", 0, 0, 2, 1)
        .unwrap();
    assert_eq!(aln.score, 8);
    assert_eq!(aln.text_range, 2..7);

    // Overlap: the end of the pattern against the start of the text.
    let aln = aligner
        .align_ends_free(b"GGGGACGT", b"ACGTCCCC", 4, 0, 0, 4)
        .unwrap();
    assert_eq!(aln.score, 0);
    assert_eq!(aln.pattern_range, 4..8);
    assert_eq!(aln.text_range, 0..4);
}

#[test]
fn ends_free_larger_than_sequence() {
    let mut aligner = WavefrontAligner::new(ScoringModel::edit());
    let r = aligner.align_ends_free(b"ACGT", b"ACGT", 5, 0, 0, 0);
    assert!(matches!(r, Err(Error::Sequence { .. })));
    let r = aligner.align_ends_free(b"ACGT", b"ACGT", 0, 0, 0, 5);
    assert!(matches!(r, Err(Error::Sequence { .. })));
    // The engine is still usable afterwards.
    assert_eq!(aligner.align_end_to_end(b"ACGT", b"AGT").unwrap().score, 1);
}

#[test]
fn reversed() {
    let mut aligner = WavefrontAligner::new(ScoringModel::edit());
    let aln = aligner
        .align_reversed(b"ACGT", b"AGT", AlignmentSpan::EndToEnd)
        .unwrap();
    assert_eq!(aln.score, 1);
    assert_eq!(aln.cigar.ops_string(), "MDMM");
    assert_eq!(aln.pattern_range, 0..4);
    assert_eq!(aln.text_range, 0..3);

    // The free trailing text becomes free leading text of the reversed run.
    let aln = aligner
        .align_reversed(b"ACGT", b"TTACGTTT", AlignmentSpan::ends_free(0, 0, 2, 2))
        .unwrap();
    assert_eq!(aln.score, 0);
    assert_eq!(aln.text_range, 2..6);

    // Extension still anchors both starts.
    let cm = ScoringModel::affine(4, 6, 2).unwrap();
    let mut aligner = WavefrontAligner::new(cm.clone());
    let forward = aligner.align_extension(b"TTTTACGT", b"ACGT").unwrap();
    let aln = aligner
        .align_reversed(b"TTTTACGT", b"ACGT", AlignmentSpan::Extension)
        .unwrap();
    assert_eq!(forward.score, 12);
    assert_eq!(aln.score, 12);
    assert_eq!(aln.pattern_range, 0..4);
    assert_eq!(aln.text_range, 0..4);
    assert_eq!(aln.cigar.verify(&cm, b"TTTT", b"ACGT"), Some(12));
}

#[test]
fn score_bound() {
    let mut aligner = WavefrontAligner::new(ScoringModel::affine(4, 6, 2).unwrap())
        .max_score(Some(3))
        .unwrap();
    let r = aligner.align_end_to_end(b"ACGT", b"TTTT");
    assert!(matches!(r, Err(Error::Unreachable { score: 3, .. })));
    assert_eq!(aligner.stats().score, 3);
    // Within the bound.
    assert_eq!(aligner.align_end_to_end(b"ACGT", b"ACGT").unwrap().score, 0);

    let mut aligner = aligner.max_score(Some(8)).unwrap();
    assert_eq!(aligner.align_end_to_end(b"ACGT", b"AGT").unwrap().score, 8);
}

#[test]
fn band_excludes_end_diagonal() {
    let mut aligner = WavefrontAligner::new(ScoringModel::edit())
        .heuristic(HeuristicConfig::band(0, 0))
        .unwrap();
    let r = aligner.align_end_to_end(b"ACGT", b"AGT");
    assert!(r.as_ref().is_err_and(|e| e.is_unreachable()), "{r:?}");

    // A band containing the end diagonal finds the optimum.
    let mut aligner = aligner.heuristic(HeuristicConfig::band(-1, 0)).unwrap();
    assert_eq!(aligner.align_end_to_end(b"ACGT", b"AGT").unwrap().score, 1);
}

#[test]
fn invalid_configuration() {
    assert!(matches!(
        ScoringModel::affine(4, -1, 2),
        Err(Error::Config { .. })
    ));
    assert!(matches!(ScoringModel::linear(0, 2), Err(Error::Config { .. })));
    assert!(matches!(ScoringModel::linear(4, 0), Err(Error::Config { .. })));

    let aligner = WavefrontAligner::new(ScoringModel::edit());
    assert!(aligner.checkpoint_interval(0).is_err());
    let aligner = WavefrontAligner::new(ScoringModel::edit());
    assert!(aligner.heuristic(HeuristicConfig::band(3, 2)).is_err());
    let aligner = WavefrontAligner::new(ScoringModel::edit());
    assert!(aligner.max_score(Some(-1)).is_err());

    let params = AlignerParams {
        penalties: Penalties {
            gap_extend1: -2,
            ..Penalties::default()
        },
        ..AlignerParams::default()
    };
    assert!(matches!(params.build(), Err(Error::Config { .. })));
}

#[test]
fn edit_ignores_penalties() {
    let params = AlignerParams {
        scoring: ScoringKind::Edit,
        penalties: Penalties {
            mismatch: 10,
            ..Penalties::default()
        },
        ..AlignerParams::default()
    };
    let mut aligner = params.build().unwrap();
    assert_eq!(aligner.align_end_to_end(b"ACGT", b"AGGT").unwrap().score, 1);
}

#[test]
fn params_from_json() {
    let json = r#"{
        "scoring": "Affine2Piece",
        "penalties": {"mismatch": 4, "gap_open1": 6, "gap_extend1": 2, "gap_open2": 24, "gap_extend2": 1},
        "memory": "checkpointed-medium",
        "heuristic": {"drop_off": 50}
    }"#;
    let params: AlignerParams = serde_json::from_str(json).unwrap();
    assert_eq!(params.memory, MemoryMode::CheckpointedMedium);
    assert_eq!(params.checkpoint_interval, DEFAULT_CHECKPOINT_INTERVAL);
    assert_eq!(params.heuristic.drop_off, Some(50));
    assert_eq!(params.heuristic.steps_between_cutoffs, 1);
    let mut aligner = params.build().unwrap();
    assert_eq!(aligner.align_end_to_end(b"ACGT", b"AGT").unwrap().score, 8);

    assert!(serde_json::from_str::<AlignerParams>(r#"{"scoring": "Edit", "penalties": {"mismatch": 1, "gap_open1": 0, "gap_extend1": 1}, "bogus": 1}"#).is_err());
}

#[test]
fn alignment_to_json() {
    let mut aligner = WavefrontAligner::new(ScoringModel::edit());
    let aln = aligner.align_end_to_end(b"ACGT", b"AGT").unwrap();
    let json = serde_json::to_value(&aln).unwrap();
    assert_eq!(json["score"], 1);
    assert_eq!(json["cigar"], "1M1D2M");
    assert_eq!(json["exact"], true);
}

#[test]
fn reuse_matches_fresh_engine() {
    let cm = ScoringModel::affine2p(4, 6, 2, 24, 1).unwrap();
    let mut reused = WavefrontAligner::new(cm.clone())
        .memory_mode(MemoryMode::CheckpointedMedium)
        .checkpoint_interval(4)
        .unwrap();
    for (n, e) in [(100, 0.2), (10, 0.5), (300, 0.05), (0, 0.0), (50, 1.0)] {
        let (a, b) = setup_sequences(n, e);
        let mut fresh = reused.fork();
        assert_eq!(
            reused.align_end_to_end(&a, &b).unwrap(),
            fresh.align_end_to_end(&a, &b).unwrap()
        );
        assert_eq!(reused.stats().frames, fresh.stats().frames);
    }
}

#[test]
fn fork_across_threads() {
    let aligner = WavefrontAligner::new(ScoringModel::affine(4, 6, 2).unwrap());
    let inputs = (0..4u64)
        .map(|seed| generate_model(200, 0.1, ErrorModel::Uniform, seed))
        .collect::<Vec<_>>();
    std::thread::scope(|scope| {
        for (a, b) in &inputs {
            let mut local = aligner.fork();
            scope.spawn(move || {
                let aln = local.align_end_to_end(a, b).unwrap();
                assert_eq!(aln.score, reference::cost(local.model(), a, b));
            });
        }
    });
}
