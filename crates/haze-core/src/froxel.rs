use crate::{QualityLevel, FROXEL_SLICE_COUNT};

/// Get the next multiple-of-8 value.
pub fn ceil_mul_of_8(value: u32) -> u32 {
    value.div_ceil(8) * 8
}

/// Dimensions of the froxel volume for one view, in cells.
///
/// Width and height derive from the scaled render resolution and the
/// quality-dependent froxel footprint; depth is fixed. All three are
/// multiples of 8 so kernel dispatches divide evenly into groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FroxelGrid {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

/// One contiguous band of depth slices sharing a kernel sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBand {
    /// First slice of the band.
    pub start: u32,
    /// Number of slices in the band.
    pub count: u32,
    /// Per-cell sample count the kernel uses inside this band.
    pub sample_count: u32,
}

impl FroxelGrid {
    /// Compute the grid for a view's scaled resolution at a quality level.
    pub fn for_view(scaled_width: u32, scaled_height: u32, quality: QualityLevel) -> Self {
        let froxel_size = quality.froxel_size_pixels();
        let grid = Self {
            width: ceil_mul_of_8(scaled_width / froxel_size),
            height: ceil_mul_of_8(scaled_height / froxel_size),
            depth: FROXEL_SLICE_COUNT,
        };
        debug_assert!(grid.width >= 8 && grid.width % 8 == 0);
        debug_assert!(grid.height >= 8 && grid.height % 8 == 0);
        debug_assert!(grid.depth >= 8 && grid.depth % 8 == 0);
        grid
    }

    /// Partition the depth axis into four bands with decreasing sample
    /// density. Near-camera cells get more samples because aliasing is
    /// most visible there; the last band absorbs the remainder.
    pub fn slice_bands(&self) -> [SliceBand; 4] {
        let close = ceil_mul_of_8(self.depth / 4);
        let near = close;
        let mid = close;
        let far = self.depth - close - near - mid;
        [
            SliceBand { start: 0, count: close, sample_count: 4 },
            SliceBand { start: close, count: near, sample_count: 3 },
            SliceBand { start: close + near, count: mid, sample_count: 2 },
            SliceBand { start: self.depth - far, count: far, sample_count: 1 },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_mul_of_8_rounds_up() {
        assert_eq!(ceil_mul_of_8(0), 0);
        assert_eq!(ceil_mul_of_8(1), 8);
        assert_eq!(ceil_mul_of_8(8), 8);
        assert_eq!(ceil_mul_of_8(9), 16);
        assert_eq!(ceil_mul_of_8(135), 136);
        assert_eq!(ceil_mul_of_8(240), 240);
    }

    #[test]
    fn grid_for_1080p_in_game() {
        let grid = FroxelGrid::for_view(1920, 1080, QualityLevel::InGame);
        assert_eq!(grid.width, 240);
        assert_eq!(grid.height, 136);
        assert_eq!(grid.depth, 64);
    }

    #[test]
    fn grid_dims_are_positive_multiples_of_8() {
        let qualities = [
            QualityLevel::InGameLow,
            QualityLevel::InGame,
            QualityLevel::Cinematic,
            QualityLevel::CinematicHigh,
        ];
        let resolutions = [
            (64, 64),
            (640, 360),
            (800, 600),
            (1280, 720),
            (1366, 768),
            (1920, 1080),
            (2560, 1440),
            (3440, 1440),
            (3840, 2160),
        ];
        for quality in qualities {
            for (w, h) in resolutions {
                let grid = FroxelGrid::for_view(w, h, quality);
                assert!(grid.width > 0 && grid.width % 8 == 0, "{w}x{h} {quality:?}");
                assert!(grid.height > 0 && grid.height % 8 == 0, "{w}x{h} {quality:?}");
                assert!(grid.depth > 0 && grid.depth % 8 == 0);
            }
        }
    }

    #[test]
    fn slice_bands_cover_depth_with_decreasing_samples() {
        let grid = FroxelGrid::for_view(1920, 1080, QualityLevel::InGame);
        let bands = grid.slice_bands();
        assert_eq!(bands.map(|b| b.count), [16, 16, 16, 16]);
        assert_eq!(bands.map(|b| b.start), [0, 16, 32, 48]);
        assert_eq!(bands.map(|b| b.sample_count), [4, 3, 2, 1]);
        let total: u32 = bands.iter().map(|b| b.count).sum();
        assert_eq!(total, grid.depth);
    }
}
