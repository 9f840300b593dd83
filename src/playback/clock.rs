/// Rate at which the analysis arrays were sampled from the source video.
///
/// Kept as a fraction so NTSC-style rates such as 30000/1001 map playback
/// time to frame indices without rounding drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    numerator: u32,
    denominator: u32,
}

impl FrameRate {
    /// Zero components are clamped to 1.
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator: if numerator == 0 { 1 } else { numerator },
            denominator: if denominator == 0 { 1 } else { denominator },
        }
    }

    pub const fn fps(fps: u32) -> Self {
        Self::new(fps, 1)
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// `floor(position_millis / 1000 * rate)`, in integer arithmetic.
    pub fn frame_index(&self, position_millis: u64) -> usize {
        let frames = (position_millis as u128 * self.numerator as u128)
            / (1000 * self.denominator as u128);
        usize::try_from(frames).unwrap_or(usize::MAX)
    }

    /// First playback position that maps to `index`.
    pub fn frame_start_millis(&self, index: usize) -> u64 {
        let numerator = self.numerator as u128;
        let millis = (index as u128 * 1000 * self.denominator as u128).div_ceil(numerator);
        u64::try_from(millis).unwrap_or(u64::MAX)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::fps(30)
    }
}
