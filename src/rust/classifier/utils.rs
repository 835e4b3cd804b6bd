use ndarray::ArrayView1;

/// Index and value of the largest element. Ties go to the lowest index and
/// non-finite scores (NaN, ±inf) never win; returns `None` when there is no
/// finite element.
pub(crate) fn arg_max(scores: ArrayView1<f32>) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| score.is_finite())
        .fold(None, |best, (i, score)| match best {
            Some((_, top)) if score <= top => best,
            _ => Some((i, score)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_picks_largest() {
        let scores = array![0.1f32, 0.7, 0.2];
        assert_eq!(arg_max(scores.view()), Some((1, 0.7)));
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let scores = array![0.5f32, 0.5];
        assert_eq!(arg_max(scores.view()), Some((0, 0.5)));

        let scores = array![0.1f32, 0.9, 0.3, 0.9];
        assert_eq!(arg_max(scores.view()), Some((1, 0.9)));
    }

    #[test]
    fn test_negative_logits() {
        let scores = array![-3.0f32, -0.5, -1.0];
        assert_eq!(arg_max(scores.view()), Some((1, -0.5)));
    }

    #[test]
    fn test_nan_is_skipped() {
        let scores = array![f32::NAN, 0.2, 0.1];
        assert_eq!(arg_max(scores.view()), Some((1, 0.2)));
    }

    #[test]
    fn test_infinity_is_skipped() {
        let scores = array![0.3f32, f32::INFINITY, 0.4];
        assert_eq!(arg_max(scores.view()), Some((2, 0.4)));

        let scores = array![f32::NEG_INFINITY, -2.0];
        assert_eq!(arg_max(scores.view()), Some((1, -2.0)));
    }

    #[test]
    fn test_nothing_comparable() {
        let empty = ndarray::Array1::<f32>::zeros(0);
        assert_eq!(arg_max(empty.view()), None);

        let all_nan = array![f32::NAN, f32::NAN];
        assert_eq!(arg_max(all_nan.view()), None);

        let all_inf = array![f32::INFINITY, f32::NEG_INFINITY];
        assert_eq!(arg_max(all_inf.view()), None);
    }
}
