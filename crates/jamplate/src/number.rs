use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, Mul, Neg, Rem, Sub},
};

/// A numeric reading of a value's text.
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct Number(f64);

impl Number {
    pub fn new(value: f64) -> Self {
        Number(value)
    }

    /// Reads a finite number from text, ignoring surrounding whitespace.
    ///
    /// `inf`, `NaN` and friends are text, not numbers.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty()
            || !text
                .bytes()
                .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        {
            return None;
        }

        text.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Number)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns `true` if the number represents an integer value.
    pub fn is_int(&self) -> bool {
        self.0.fract() == 0.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Divides, or `None` when dividing by zero.
    pub fn checked_div(self, other: Self) -> Option<Self> {
        (!other.is_zero()).then(|| Number(self.0 / other.0))
    }

    /// The remainder, or `None` when dividing by zero.
    pub fn checked_rem(self, other: Self) -> Option<Self> {
        (!other.is_zero()).then(|| self % other)
    }

    /// The sign of `self - other`, clamped to `-1`, `0` or `1`.
    pub fn signum_of_difference(self, other: Self) -> i32 {
        match self.cmp(&other) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }
}

impl Neg for Number {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Number(-self.0)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number(value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number(value as f64)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_int() && self.0.abs() < i64::MAX as f64 {
            write!(f, "{}", self.0 as i64)
        } else {
            let s = format!("{:.6}", self.0);
            match s.trim_end_matches('0').trim_end_matches('.') {
                // Too small for six places, but not zero.
                "0" | "-0" => write!(f, "{}", self.0),
                s => write!(f, "{}", s),
            }
        }
    }
}

impl Add for Number {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Number(self.0 + other.0)
    }
}

impl Sub for Number {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Number(self.0 - other.0)
    }
}

impl Mul for Number {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Number(self.0 * other.0)
    }
}

impl Rem for Number {
    type Output = Self;

    fn rem(self, other: Self) -> Self {
        Number(self.0 % other.0)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Number {}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.0, "1")]
    #[case(-3.0, "-3")]
    #[case(1.5, "1.5")]
    #[case(0.1 + 0.2, "0.3")]
    #[case(2.0 / 3.0, "0.666667")]
    #[case(1e-7, "0.0000001")]
    #[case(-1e-7, "-0.0000001")]
    #[case(1e-19, "0.0000000000000000001")]
    fn test_display_formatting(#[case] input: f64, #[case] expected: &str) {
        assert_eq!(Number::new(input).to_string(), expected);
    }

    #[rstest]
    #[case("12", Some(12.0))]
    #[case(" 2.5 ", Some(2.5))]
    #[case("-4", Some(-4.0))]
    #[case("1e3", Some(1000.0))]
    #[case("", None)]
    #[case("abc", None)]
    #[case("inf", None)]
    #[case("NaN", None)]
    #[case("1,2", None)]
    fn test_parse(#[case] text: &str, #[case] expected: Option<f64>) {
        assert_eq!(Number::parse(text).map(|n| n.value()), expected);
    }

    #[rstest]
    #[case(10.0, 0.0, None)]
    #[case(10.0, 4.0, Some(2.5))]
    fn test_checked_div(#[case] a: f64, #[case] b: f64, #[case] expected: Option<f64>) {
        assert_eq!(
            Number::new(a).checked_div(Number::new(b)).map(|n| n.value()),
            expected
        );
    }

    #[test]
    fn test_checked_div_by_a_tiny_number() {
        let quotient = Number::new(1.0).checked_div(Number::new(1e-19)).unwrap();
        assert!(quotient.value() > 9.9e18);
        assert!(Number::new(1.0).checked_rem(Number::new(1e-19)).is_some());
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(-0.0, true)]
    #[case(1e-19, false)]
    #[case(-1e-300, false)]
    fn test_is_zero(#[case] input: f64, #[case] expected: bool) {
        assert_eq!(Number::new(input).is_zero(), expected);
    }

    #[rstest]
    #[case(1.0, 2.0, -1)]
    #[case(2.0, 2.0, 0)]
    #[case(7.5, 2.0, 1)]
    fn test_signum_of_difference(#[case] a: f64, #[case] b: f64, #[case] expected: i32) {
        assert_eq!(Number::new(a).signum_of_difference(Number::new(b)), expected);
    }
}
