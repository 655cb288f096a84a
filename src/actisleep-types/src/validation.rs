use crate::error::{ActisleepError, MAX_REPORTED_INDICES, Result};

/// Upper bound on the number of epochs any component accepts.
pub const MAX_EPOCHS: usize = 1_000_000;

/// Checks the length bounds shared by every algorithm input.
pub fn validate_length(len: usize) -> Result<()> {
    if len == 0 {
        return Err(ActisleepError::EmptyInput);
    }
    if len > MAX_EPOCHS {
        return Err(ActisleepError::TooManyEpochs {
            len,
            max: MAX_EPOCHS,
        });
    }
    Ok(())
}

pub fn validate_same_length(
    left_name: &'static str,
    left: usize,
    right_name: &'static str,
    right: usize,
) -> Result<()> {
    if left != right {
        return Err(ActisleepError::LengthMismatch {
            left_name,
            left,
            right_name,
            right,
        });
    }
    Ok(())
}

/// Rejects empty, oversized, non-finite and negative activity columns.
pub fn validate_counts(values: &[f64]) -> Result<()> {
    validate_length(values.len())?;
    check_values(values.iter().copied().enumerate())
}

/// Validates `(index, value)` pairs, reporting non-finite values before negative ones.
pub(crate) fn check_values(values: impl Iterator<Item = (usize, f64)> + Clone) -> Result<()> {
    let non_finite = offending(values.clone(), |v| !v.is_finite());
    if non_finite.1 > 0 {
        return Err(ActisleepError::InvalidActivityValues {
            reason: "non-finite",
            indices: non_finite.0,
            count: non_finite.1,
        });
    }

    let negative = offending(values, |v| v < 0.0);
    if negative.1 > 0 {
        return Err(ActisleepError::InvalidActivityValues {
            reason: "negative",
            indices: negative.0,
            count: negative.1,
        });
    }

    Ok(())
}

fn offending(
    values: impl Iterator<Item = (usize, f64)>,
    predicate: impl Fn(f64) -> bool,
) -> (Vec<usize>, usize) {
    let mut indices = Vec::new();
    let mut count = 0;
    for (index, value) in values {
        if predicate(value) {
            if indices.len() < MAX_REPORTED_INDICES {
                indices.push(index);
            }
            count += 1;
        }
    }
    (indices, count)
}
