use crate::Rating;

/// Arithmetic mean of the ratings, rounded to one decimal. A spot or review
/// set with no ratings averages to 0 rather than NaN.
pub fn average_rating<T: Rating>(ratings: &[T]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    let mean = ratings.iter().map(|r| r.rating()).sum::<f64>() / ratings.len() as f64;

    (mean * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stars(i32);

    impl Rating for Stars {
        fn rating(&self) -> f64 {
            self.0 as f64
        }
    }

    #[test]
    fn no_ratings_average_to_zero() {
        let ratings: Vec<Stars> = vec![];
        assert_eq!(average_rating(&ratings), 0.0);
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        // 4, 5, 5 -> 4.666... -> 4.7
        let ratings = vec![Stars(4), Stars(5), Stars(5)];
        assert_eq!(average_rating(&ratings), 4.7);

        // 1, 2 -> 1.5
        let ratings = vec![Stars(1), Stars(2)];
        assert_eq!(average_rating(&ratings), 1.5);
    }

    #[test]
    fn single_rating_is_itself() {
        let ratings = vec![Stars(3)];
        assert_eq!(average_rating(&ratings), 3.0);
    }
}
