//! 随机数来源
//!
//! 核心不持有也不重置种子，调用方注入任意 `rand::Rng`。

use rand::Rng;

/// 随机数来源（漫游方向、毛发生成）
pub trait RandomSource {
    /// [min, max) 区间内的浮点数
    fn float_in_range(&mut self, min: f32, max: f32) -> f32;

    /// [min, max] 闭区间内的整数
    fn int_in_range(&mut self, min: i32, max: i32) -> i32;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn float_in_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.gen_range(min..max)
    }

    fn int_in_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.gen_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ranges_are_respected() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let f = rng.float_in_range(-1.0, 1.0);
            assert!((-1.0..1.0).contains(&f));
            let i = rng.int_in_range(80, 150);
            assert!((80..=150).contains(&i));
        }
    }

    #[test]
    fn test_empty_range_returns_min() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(rng.float_in_range(2.0, 2.0), 2.0);
        assert_eq!(rng.int_in_range(3, 1), 3);
    }
}
