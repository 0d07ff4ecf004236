//! Shared test tooling: sequence generators, a quadratic reference aligner and
//! harnesses that run an `Aligner` over many inputs.

pub mod generate;
pub mod reference;

pub use generate::{generate_model, generate_pair, setup_sequences, ErrorModel};

use itertools::Itertools;
use rand::{seq::IteratorRandom, thread_rng, Rng};
use std::fmt::Debug;
use wf_types::*;

pub fn test_sequences() -> Vec<(Seq<'static>, Seq<'static>)> {
    vec![
        (b"", b""),
        (b"ACGT", b""),
        (b"", b"ACGT"),
        (b"ACGT", b"AGT"),
        (b"TTGGGTCAATCAGCCAGTTTTTA", b"TTTGAGTGGGTCATCACCGATTTTAT"),
        (b"ACTGACCAGT", b"CCGACAGGA"),
        (b"AGTTTTAT", b"ACCGATTTTTA"),
        (b"CTCTCTTCTCTCTCTA", b"CCTCTCTCTCTCCTCTC"),
        (b"AGTGGGTTGCCTTCATTCCG", b"AGTGGTGTCTTCAGGCCTTCATTCCG"),
        (b"GCACGTCGCCCCCCGCCCGCG", b"GCCCGCCCGCCCGCCCCCGCCCCC"),
        (b"CGCGTGTATCCGTCCACATCGAGCCGCCCTTGTTGCTTTTCGAGCGCTCATTTCCCGCAAGAGTGGCGTGCGGTCACTTTCGCGCAGCAATTAGAGTACTAACGGGTAGACGTGGCTTTCCTCCTCGTCCTGTCAACGCGCATAGGATGTCCTGCAGCAGGCCGCCGCGATTGCCTAAATCAAGGGGTTCCAATGGAGTTTCCATCTGATATCCGCGCTCCGGTTCTGAGTCTAAAGTGGAAATACTCCGAATGGGCCGGTATGAGGTTGGGTCAATCAGCCAGTTTTTA",
         b"CGCTGGGGATGCCTCCACCTTTCGAGTGCCTGTTGGTTCCGACGCTATCATAGTCCCCATGCAAGGAGATGGCTGCGCGTCCTATCGCGCGGCAAATAGAGTCTACGGGGGCGGCTGTCCTCCTCGTCCTGGTCAACGGCCATAGGATTTCCGCGATGGTCGCCCGGATGTGCCTAAACCAAGGCTCCGATGGAGCTGCCTCTGATATCCGCGCTGCCGGTTTCCTGACGTCTGAAAACGTTGGAAAATACCTCCGAATGGGCCCCGTTTGAGTGGGTCATCACCGATTTTAT"),
    ]
}

const FIXED: bool = false;

pub fn gen_seqs() -> impl Iterator<Item = ((Sequence, Sequence), (usize, f32, ErrorModel, u64))> {
    let rng = &mut thread_rng();
    let mut ns = vec![
        0usize, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 30, 40, 50,
        60, 70, 80, 90, 100, 110, 120, 130, 140, 150, 160, 170, 180, 190, 200, 250, 256, 257, 300,
    ];
    let mut es = vec![
        0.0f32, 0.01, 0.02, 0.03, 0.05, 0.10, 0.20, 0.30, 0.40, 0.50, 0.60, 0.70, 1.0,
    ];

    // A random subset of the above; repeated runs cover the rest.
    if !FIXED {
        let nl = ns.len();
        ns = ns.into_iter().choose_multiple(rng, nl / 4);
        let el = es.len();
        es = es.into_iter().choose_multiple(rng, el / 4);
    }

    let models = [
        ErrorModel::Uniform,
        ErrorModel::NoisyInsert,
        ErrorModel::NoisyDelete,
        ErrorModel::SymmetricRepeat,
    ];
    let seeds = if FIXED {
        [31415]
    } else {
        [rng.gen_range(0..u64::MAX)]
    };
    ns.into_iter()
        .cartesian_product(es)
        .cartesian_product(models)
        .cartesian_product(seeds)
        .map(|(((n, e), error_model), seed)| {
            let (a, b) = generate_model(n, e, error_model, seed);
            ((a, b), (n, e, error_model, seed))
        })
}

/// Aligns `a` and `b` and checks the cost against the reference DP under
/// `cm`, and the cigar against the sequences.
pub fn test_aligner_on_input(
    a: Seq,
    b: Seq,
    cm: &ScoringModel,
    aligner: &mut (impl Aligner + Debug),
    params: &str,
) {
    // Set to true for local debugging.
    const D: bool = false;

    // useful in case of panics inside the alignment code.
    eprintln!("{params}");
    if D {
        eprintln!("a {}\nb {}", seq_to_string(a), seq_to_string(b));
    }
    let cost = reference::cost(cm, a, b);
    let (aligner_cost, cigar) = match aligner.align(a, b) {
        Ok(r) => r,
        Err(e) => panic!(
            "\n{params}\nlet a = \"{}\".as_bytes();\nlet b = \"{}\".as_bytes();\n{e}",
            seq_to_string(a),
            seq_to_string(b),
        ),
    };
    assert_eq!(
        cost,
        aligner_cost,
        "\n{params}\nlet a = \"{}\".as_bytes();\nlet b = \"{}\".as_bytes();\nAligner\n{aligner:?}",
        seq_to_string(a),
        seq_to_string(b),
    );
    assert_eq!(
        cigar.verify(cm, a, b),
        Some(cost),
        "\n{params}\nlet a = \"{}\".as_bytes();\nlet b = \"{}\".as_bytes();\ncigar: {cigar}",
        seq_to_string(a),
        seq_to_string(b),
    );
}

/// Test the given aligner on a large set of random sequences:
/// - length 0 to 300
/// - error rate 0.0 to 1.0
/// - error models: uniform, noisy insert, noisy delete, symmetric repeat
///
/// - The cost reported by the aligner must match `reference::cost`.
/// - The returned cigar must be valid and have that cost.
pub fn test_aligner(cm: &ScoringModel, aligner: impl Aligner + Debug) {
    test_aligner_up_to(cm, aligner, usize::MAX);
}

/// As test_aligner, but only test sequences with n <= max_n.
pub fn test_aligner_up_to(cm: &ScoringModel, mut aligner: impl Aligner + Debug, max_n: usize) {
    for (a, b) in test_sequences() {
        test_aligner_on_input(
            a,
            b,
            cm,
            &mut aligner,
            &format!(
                "hardcoded test_sequences: a {:?} b {:?}",
                seq_to_string(a),
                seq_to_string(b)
            ),
        );
    }
    for ((a, b), (n, e, error_model, seed)) in gen_seqs() {
        if n > max_n {
            continue;
        }
        test_aligner_on_input(
            &a,
            &b,
            cm,
            &mut aligner,
            &format!("seed {seed:>10} n {n:>5} e {e:>.2} error_model {error_model:?}"),
        );
    }
}
