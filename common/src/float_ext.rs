pub trait FloatExt {
    fn approximately_eq(self, other: Self) -> bool;

    /// Compare with an explicit absolute tolerance.
    fn approximately_eq_within(self, other: Self, tolerance: Self) -> bool;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        self.approximately_eq_within(other, crate::EPSILON as f32)
    }

    fn approximately_eq_within(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() < tolerance
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        self.approximately_eq_within(other, crate::EPSILON)
    }

    fn approximately_eq_within(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() < tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_approximately_eq() {
        assert!(1.0_f32.approximately_eq(1.0));
        assert!((0.1_f32 + 0.2_f32).approximately_eq(0.3));
        assert!(!1.0_f32.approximately_eq(1.001));
    }

    #[test]
    fn explicit_tolerance() {
        assert!(1.0_f32.approximately_eq_within(1.001, 0.01));
        assert!(!1.0_f64.approximately_eq_within(1.1, 0.01));
    }

    #[test]
    fn nan_is_never_equal() {
        assert!(!f32::NAN.approximately_eq(f32::NAN));
        assert!(!f64::NAN.approximately_eq(0.0));
    }
}
