//! Deterministic train/eval partitioning.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use sftprep_core::{Result, SftPrepError};

/// Row indices assigned to each partition, in shuffled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    /// Indices of training rows.
    pub train: Vec<usize>,
    /// Indices of evaluation rows.
    pub eval: Vec<usize>,
}

/// Number of eval rows for `n` rows at `ratio`: `ceil(ratio * n)`.
pub fn eval_size(n: usize, ratio: f64) -> usize {
    ((ratio * n as f64).ceil() as usize).min(n)
}

/// Shuffle `0..n` with `seed` and split off `ceil(ratio * n)` rows for eval.
///
/// Eval takes the head of the permutation, train the remainder. Fails if the
/// train partition would be empty.
pub fn split_indices(n: usize, ratio: f64, seed: u64) -> Result<SplitIndices> {
    if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
        return Err(SftPrepError::config(format!(
            "split_ratio must be in (0, 1), got {ratio}"
        )));
    }
    let n_eval = eval_size(n, ratio);
    if n_eval >= n {
        return Err(SftPrepError::data_format(format!(
            "With {n} rows and split_ratio {ratio}, the train partition would be empty"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_eval);
    Ok(SplitIndices {
        train,
        eval: indices,
    })
}

/// Split `items` into `(train, eval)` using [`split_indices`].
pub fn train_eval_split<T>(items: Vec<T>, ratio: f64, seed: u64) -> Result<(Vec<T>, Vec<T>)> {
    let split = split_indices(items.len(), ratio, seed)?;
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut take = |indices: &[usize]| -> Vec<T> {
        indices
            .iter()
            .filter_map(|&i| slots[i].take())
            .collect()
    };
    let train = take(&split.train);
    let eval = take(&split.eval);
    Ok((train, eval))
}
