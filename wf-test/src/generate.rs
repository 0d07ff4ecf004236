//! Random sequence pairs with a controlled amount of divergence.

use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wf_types::Sequence;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorModel {
    /// Substitutions, insertions and deletions at uniformly random positions.
    #[default]
    Uniform,
    /// Half the errors uniform, half as a single inserted random region.
    NoisyInsert,
    /// Half the errors uniform, half as a single deleted region.
    NoisyDelete,
    /// A region that occurs twice in the pattern, with independent noise on
    /// both copies, followed by uniform errors.
    SymmetricRepeat,
}

const ALPH: [u8; 4] = *b"ACGT";

enum Mutation {
    // Replace char at pos.
    Substitution(usize, u8),
    // Insert char before pos.
    Insertion(usize, u8),
    // Delete char at pos.
    Deletion(usize),
}

fn rand_char(rng: &mut impl Rng) -> u8 {
    ALPH[rng.gen_range(0..4)]
}

pub fn random_sequence(n: usize, rng: &mut impl Rng) -> Sequence {
    (0..n).map(|_| rand_char(rng)).collect_vec()
}

fn random_mutation(len: usize, rng: &mut impl Rng) -> Mutation {
    // For empty sequences, only generate insertions.
    match if len == 0 { 1 } else { rng.gen_range(0..3usize) } {
        0 => Mutation::Substitution(rng.gen_range(0..len), rand_char(rng)),
        1 => Mutation::Insertion(rng.gen_range(0..len + 1), rand_char(rng)),
        2 => Mutation::Deletion(rng.gen_range(0..len)),
        _ => unreachable!(),
    }
}

/// Applies `cnt` uniformly random single-symbol edits.
pub fn mutate(seq: &mut Sequence, cnt: usize, rng: &mut impl Rng) {
    for _ in 0..cnt {
        match random_mutation(seq.len(), rng) {
            Mutation::Substitution(i, c) => seq[i] = c,
            Mutation::Insertion(i, c) => seq.insert(i, c),
            Mutation::Deletion(i) => {
                seq.remove(i);
            }
        }
    }
}

/// Generates a random pattern of length `n` and a text at roughly error rate
/// `e` from it.
pub fn generate_pair(
    n: usize,
    e: f32,
    error_model: ErrorModel,
    rng: &mut impl Rng,
) -> (Sequence, Sequence) {
    let num_mutations = (e * n as f32).ceil() as usize;
    match error_model {
        ErrorModel::Uniform => {
            let a = random_sequence(n, rng);
            let mut b = a.clone();
            mutate(&mut b, num_mutations, rng);
            (a, b)
        }
        ErrorModel::NoisyInsert => {
            let a = random_sequence(n, rng);
            let mut b = a.clone();
            let piece = num_mutations / 2;
            mutate(&mut b, num_mutations - piece, rng);
            let start = rng.gen_range(0..=b.len());
            let region = random_sequence(piece, rng);
            b.splice(start..start, region);
            (a, b)
        }
        ErrorModel::NoisyDelete => {
            let a = random_sequence(n, rng);
            let mut b = a.clone();
            let piece = (num_mutations / 2).min(n);
            let start = rng.gen_range(0..=n - piece);
            b.drain(start..start + piece);
            mutate(&mut b, num_mutations - piece, rng);
            (a, b)
        }
        ErrorModel::SymmetricRepeat => {
            let len = n / 4;
            let repeat = random_sequence(len, rng);
            let flank = n - 2 * len;
            let left = rng.gen_range(0..=flank);
            let noise = num_mutations / 4;
            let mut first = repeat.clone();
            let mut second = repeat;
            mutate(&mut first, noise, rng);
            mutate(&mut second, noise, rng);
            let mut a = random_sequence(left, rng);
            a.extend(first);
            a.extend(random_sequence(flank - left, rng));
            a.extend(second);
            let mut b = a.clone();
            mutate(&mut b, num_mutations - 2 * noise, rng);
            (a, b)
        }
    }
}

/// As `generate_pair`, with a fresh ChaCha RNG for `seed`.
pub fn generate_model(n: usize, e: f32, error_model: ErrorModel, seed: u64) -> (Sequence, Sequence) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate_pair(n, e, error_model, &mut rng)
}

/// A pair of length `n` at error rate `e` with a fixed seed, for quick testing.
pub fn setup_sequences(n: usize, e: f32) -> (Sequence, Sequence) {
    generate_model(n, e, ErrorModel::Uniform, 31415)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deterministic() {
        for model in [
            ErrorModel::Uniform,
            ErrorModel::NoisyInsert,
            ErrorModel::NoisyDelete,
            ErrorModel::SymmetricRepeat,
        ] {
            assert_eq!(
                generate_model(100, 0.1, model, 1234),
                generate_model(100, 0.1, model, 1234)
            );
        }
    }

    #[test]
    fn lengths() {
        for n in [0, 1, 5, 100] {
            let (a, b) = generate_model(n, 0.0, ErrorModel::Uniform, 7);
            assert_eq!(a.len(), n);
            assert_eq!(a, b);
            let (a, b) = generate_model(n, 0.2, ErrorModel::NoisyDelete, 7);
            assert_eq!(a.len(), n);
            assert!(b.len() <= n + n);
        }
        let (a, b) = generate_model(0, 0.5, ErrorModel::NoisyInsert, 7);
        assert!(a.is_empty() && b.is_empty());
    }

    #[test]
    fn alphabet() {
        let (a, b) = setup_sequences(200, 0.3);
        assert!(a.iter().chain(&b).all(|c| ALPH.contains(c)));
    }
}
