//! 地形查询接口
//!
//! 动画核心只读地形：双线性高度查询 + 范围判断。
//! `HeightField` 是规则网格的参考实现。

/// 地形查询
pub trait TerrainQuery {
    /// (x, y) 处的双线性插值高度，网格外返回 0
    fn height_at(&self, x: f32, y: f32) -> f32;

    /// (x, y) 是否在可查询范围内
    fn is_in_bounds(&self, x: f32, y: f32) -> bool;
}

/// 规则高度网格，格点 (i, j) 位于世界坐标 (i * scale, j * scale)
#[derive(Clone, Debug)]
pub struct HeightField {
    size: usize,
    scale: f32,
    heights: Vec<f32>,
}

impl HeightField {
    /// 由格点函数生成 size x size 网格
    pub fn from_fn(size: usize, scale: f32, mut height: impl FnMut(usize, usize) -> f32) -> Self {
        let mut heights = Vec::with_capacity(size * size);
        for j in 0..size {
            for i in 0..size {
                heights.push(height(i, j));
            }
        }
        Self { size, scale, heights }
    }

    /// 平地
    pub fn flat(size: usize, scale: f32, height: f32) -> Self {
        Self::from_fn(size, scale, |_, _| height)
    }

    /// 几个圆形山丘叠加，`inverted` 时变为盆地
    pub fn hills(size: usize, scale: f32, inverted: bool) -> Self {
        let extent = size as f32;
        let centers = [(0.3, 0.3), (0.7, 0.4), (0.5, 0.8)];
        let radius = 0.3 * extent;

        Self::from_fn(size, scale, |i, j| {
            let total: f32 = centers
                .iter()
                .map(|&(cx, cy)| {
                    let dx = i as f32 - cx * extent;
                    let dy = j as f32 - cy * extent;
                    let falloff = (1.0 - (dx * dx + dy * dy).sqrt() / radius).clamp(0.0, 1.0);
                    falloff * falloff
                })
                .sum();
            let height = total * 0.5 * 27.5;
            if inverted {
                -height
            } else {
                height
            }
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn sample(&self, i: usize, j: usize) -> f32 {
        self.heights[j * self.size + i]
    }
}

impl TerrainQuery for HeightField {
    fn height_at(&self, x: f32, y: f32) -> f32 {
        if !self.is_in_bounds(x, y) {
            return 0.0;
        }

        let gx = x / self.scale;
        let gy = y / self.scale;
        // 贴近上界时 gx 可能被舍入到 size - 1
        let last_cell = self.size - 2;
        let i = (gx.floor() as usize).min(last_cell);
        let j = (gy.floor() as usize).min(last_cell);
        let fx = gx - i as f32;
        let fy = gy - j as f32;

        let h00 = self.sample(i, j);
        let h10 = self.sample(i + 1, j);
        let h01 = self.sample(i, j + 1);
        let h11 = self.sample(i + 1, j + 1);

        let bottom = h00 + (h10 - h00) * fx;
        let top = h01 + (h11 - h01) * fx;
        bottom + (top - bottom) * fy
    }

    fn is_in_bounds(&self, x: f32, y: f32) -> bool {
        if self.size < 2 {
            return false;
        }
        let limit = (self.size - 1) as f32 * self.scale;
        x >= 0.0 && y >= 0.0 && x < limit && y < limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bilinear_interpolation() {
        // 高度 = i + 2j，双线性插值在平面上精确
        let field = HeightField::from_fn(4, 1.0, |i, j| i as f32 + 2.0 * j as f32);
        assert!((field.height_at(1.5, 0.5) - 2.5).abs() < 1e-5);
        assert!((field.height_at(0.25, 2.75) - 5.75).abs() < 1e-5);
    }

    #[test]
    fn test_scale() {
        let field = HeightField::from_fn(4, 2.0, |i, _| i as f32);
        assert!((field.height_at(3.0, 1.0) - 1.5).abs() < 1e-5);
        assert!(field.is_in_bounds(5.9, 5.9));
        assert!(!field.is_in_bounds(6.0, 1.0));
    }

    #[test]
    fn test_out_of_bounds_returns_zero() {
        let field = HeightField::flat(10, 1.0, 3.0);
        assert_eq!(field.height_at(-1.0, 5.0), 0.0);
        assert_eq!(field.height_at(5.0, 9.0), 0.0);
        assert!((field.height_at(5.0, 5.0) - 3.0).abs() < 1e-6);
        assert!(!field.is_in_bounds(9.0, 0.0));
    }

    #[test]
    fn test_query_just_below_upper_edge() {
        for (size, scale) in [(4, 0.0648), (7, 0.3), (13, 1.7), (39, 0.11)] {
            let field = HeightField::flat(size, scale, 1.0);
            let limit = (size - 1) as f32 * scale;
            let x = f32::from_bits(limit.to_bits() - 1);

            assert!(field.is_in_bounds(x, x));
            assert!((field.height_at(x, x) - 1.0).abs() < 1e-5);
            assert!((field.height_at(x, 0.0) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_hills_peak_and_inversion() {
        let hills = HeightField::hills(100, 1.0, false);
        let basin = HeightField::hills(100, 1.0, true);
        assert!(hills.height_at(30.0, 30.0) > 10.0);
        assert!(basin.height_at(30.0, 30.0) < -10.0);
        // 远离山丘中心为 0
        assert_eq!(hills.height_at(95.0, 5.0), 0.0);
    }
}
