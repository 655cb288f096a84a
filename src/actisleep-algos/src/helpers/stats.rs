pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0_f64
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Standard deviation with one degree of freedom removed; 0 for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0_f64;
    }

    let mean = mean(values);
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;

    variance.sqrt()
}

/// `max - min`; 0 for an empty slice.
pub fn range(values: &[f64]) -> f64 {
    let mut iter = values.iter().copied();
    let Some(first) = iter.next() else {
        return 0_f64;
    };

    let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    max - min
}

/// `part / whole * 100`, 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0_f64
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Lengths of the maximal runs of `value` in `items`, in order.
pub fn run_lengths<T: PartialEq>(items: &[T], value: &T) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut current = 0;
    for item in items {
        if item == value {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn mean_basic() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
    }

    #[test]
    fn sample_std_dev_uses_n_minus_one() {
        // mean 5, squared deviations sum to 32, / 7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_std_dev(&values) - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn sample_std_dev_short_input() {
        assert_eq!(sample_std_dev(&[]), 0.0);
        assert_eq!(sample_std_dev(&[3.0]), 0.0);
    }

    #[test]
    fn range_basic() {
        assert_eq!(range(&[]), 0.0);
        assert_eq!(range(&[0.5, -0.25, 0.1]), 0.75);
    }

    #[test]
    fn percentage_of_zero_whole() {
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn run_lengths_groups_runs() {
        let items = [1, 1, 0, 1, 0, 0, 1, 1, 1];
        assert_eq!(run_lengths(&items, &1), vec![2, 1, 3]);
        assert_eq!(run_lengths(&items, &0), vec![1, 2]);
        assert!(run_lengths(&[] as &[i32], &1).is_empty());
    }
}
