//! Two-sensor detection fusion

/// Per-modality and fused trigger thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionThresholds {
    pub vision: f64,
    pub audio: f64,
    pub fused: f64,
}

impl Default for FusionThresholds {
    fn default() -> Self {
        Self {
            vision: 0.55,
            audio: 0.60,
            fused: 0.60,
        }
    }
}

/// Outcome of fusing one vision and one audio sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionResult {
    pub fused: f64,
    pub triggered: bool,
}

/// Noisy-OR of two independent confidences
pub fn noisy_or(pv: f64, pa: f64) -> f64 {
    1.0 - (1.0 - pv) * (1.0 - pa)
}

impl FusionThresholds {
    /// Either sensor alone clearing its bar, or the fused estimate clearing
    /// its own, counts as a detection
    pub fn fuse(&self, pv: f64, pa: f64) -> FusionResult {
        let fused = noisy_or(pv, pa);
        let triggered = pv >= self.vision || pa >= self.audio || fused >= self.fused;
        FusionResult { fused, triggered }
    }
}

/// Fuse with the default thresholds
pub fn fuse(pv: f64, pa: f64) -> FusionResult {
    FusionThresholds::default().fuse(pv, pa)
}
