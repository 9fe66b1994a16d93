use rand::rngs::StdRng;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::SeedableRng;

use crate::models::ResamplingStrategy;

/// Stratified k-fold split: test indices of each fold
///
/// Each class is shuffled with a seeded RNG and dealt round-robin across the
/// folds, so every index lands in exactly one fold and class proportions are
/// kept as far as counts allow.
pub fn stratified_folds(labels: &[bool], k: usize, seed: u64) -> Vec<Vec<usize>> {
    let k = k.max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds = vec![Vec::new(); k];

    let mut next = 0;
    for class in [true, false] {
        let mut members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        members.shuffle(&mut rng);
        for idx in members {
            folds[next % k].push(idx);
            next += 1;
        }
    }

    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

/// Indices of every fold except `test_fold`, in ascending order
pub fn train_indices(folds: &[Vec<usize>], test_fold: usize) -> Vec<usize> {
    let mut train: Vec<usize> = folds
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != test_fold)
        .flat_map(|(_, f)| f.iter().copied())
        .collect();
    train.sort_unstable();
    train
}

/// Rebalance a training fold by label
///
/// `indices` point into `labels`. Oversampling draws minority rows with
/// replacement until both labels have the majority count; undersampling keeps
/// a random subset of the majority label of the minority's size. A fold with
/// a single label is returned unchanged.
pub fn resample(
    indices: &[usize],
    labels: &[bool],
    strategy: ResamplingStrategy,
    rng: &mut StdRng,
) -> Vec<usize> {
    let (positives, negatives): (Vec<usize>, Vec<usize>) =
        indices.iter().copied().partition(|&i| labels[i]);

    if positives.is_empty() || negatives.is_empty() {
        return indices.to_vec();
    }
    let (minority, majority) = if positives.len() <= negatives.len() {
        (positives, negatives)
    } else {
        (negatives, positives)
    };

    let mut out = match strategy {
        ResamplingStrategy::None => return indices.to_vec(),
        ResamplingStrategy::Oversample => {
            let extra = majority.len() - minority.len();
            let mut out: Vec<usize> = indices.to_vec();
            for _ in 0..extra {
                if let Some(&idx) = minority.choose(rng) {
                    out.push(idx);
                }
            }
            out
        }
        ResamplingStrategy::Undersample => {
            let mut kept = majority.into_iter().choose_multiple(rng, minority.len());
            kept.extend(minority);
            kept
        }
    };

    out.sort_unstable();
    tracing::trace!(
        "Resampled training fold ({:?}): {} -> {} rows",
        strategy,
        indices.len(),
        out.len()
    );
    out
}
