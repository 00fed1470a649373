//! Signal-conditioning filters for angle processing.

use core::f32::consts::PI;

use libm::{atan2f, cosf, sinf};

/// First-order exponential smoother
///
/// `output = alpha * input + (1 - alpha) * output`, except for the first
/// sample after construction or [`reset`](Self::reset), which passes through
/// unchanged so the output does not decay up from zero
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LowPassFilter {
    alpha: f32,
    output: f32,
    initialized: bool,
}

impl LowPassFilter {
    /// Create a filter with the given smoothing coefficient
    ///
    /// `alpha` must be in (0, 1); larger values track the input faster at the
    /// cost of less noise rejection. Not validated here
    #[must_use]
    pub const fn new(alpha: f32) -> Self {
        Self {
            alpha,
            output: 0.0,
            initialized: false,
        }
    }

    /// Change the coefficient without touching the accumulated output
    pub const fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    /// Mark the filter uninitialized; the next update snaps to its input
    pub const fn reset(&mut self) {
        self.initialized = false;
    }

    /// Most recent output
    #[must_use]
    pub const fn output(&self) -> f32 {
        self.output
    }

    /// Feed one sample and return the smoothed output
    pub fn update(&mut self, input: f32) -> f32 {
        if self.initialized {
            self.output = self.alpha * input + (1.0 - self.alpha) * self.output;
        } else {
            self.output = input;
            self.initialized = true;
        }
        self.output
    }
}

/// Fixed-window running-sum averager
///
/// Returns the mean of the samples seen so far while the window is still
/// filling, then behaves as a true ring: the oldest sample is dropped from
/// the running sum and overwritten in place. `N` must be non-zero
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MovingAverageFilter<const N: usize> {
    buffer: [f32; N],
    cursor: usize,
    count: usize,
    sum: f32,
}

impl<const N: usize> MovingAverageFilter<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0.0; N],
            cursor: 0,
            count: 0,
            sum: 0.0,
        }
    }

    /// Zero the buffer, cursor, count, and sum
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feed one sample and return the window average
    #[allow(clippy::cast_precision_loss)]
    pub fn update(&mut self, value: f32) -> f32 {
        if self.count < N {
            self.buffer[self.count] = value;
            self.count += 1;
            self.sum += value;
        } else {
            self.sum -= self.buffer[self.cursor];
            self.sum += value;
            self.buffer[self.cursor] = value;
            self.cursor = (self.cursor + 1) % N;
        }
        self.sum / self.count as f32
    }
}

impl<const N: usize> Default for MovingAverageFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap-safe smoother for a circular quantity in degrees
///
/// Exponential smoothing applied directly to an angle misbehaves at the
/// 0°/360° boundary: averaging 359° and 1° that way lands near 180°. This
/// filter smooths the sine and cosine of the angle independently and
/// reconstructs the estimate with the four-quadrant inverse tangent, so the
/// wrap point is no different from any other angle
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CircularAngleFilter {
    sin_filter: LowPassFilter,
    cos_filter: LowPassFilter,
}

impl CircularAngleFilter {
    /// Create a filter applying `alpha` to both angle components
    #[must_use]
    pub const fn new(alpha: f32) -> Self {
        Self {
            sin_filter: LowPassFilter::new(alpha),
            cos_filter: LowPassFilter::new(alpha),
        }
    }

    /// Change the coefficient of both component filters without resetting
    /// their accumulated state
    pub const fn set_alpha(&mut self, alpha: f32) {
        self.sin_filter.set_alpha(alpha);
        self.cos_filter.set_alpha(alpha);
    }

    /// Mark both component filters uninitialized; the next update snaps to
    /// its input
    pub const fn reset(&mut self) {
        self.sin_filter.reset();
        self.cos_filter.reset();
    }

    /// Feed one raw angle in degrees and return the smoothed angle in
    /// `[0, 360)`
    ///
    /// The input is expected in `[0, 360)` already (it derives from a 16-bit
    /// raw reading) and is not clamped
    pub fn update(&mut self, degrees: f32) -> f32 {
        let radians = degrees * (PI / 180.0);
        let sin = self.sin_filter.update(sinf(radians));
        let cos = self.cos_filter.update(cosf(radians));

        let mut filtered = atan2f(sin, cos) * (180.0 / PI);
        if filtered < 0.0 {
            filtered += 360.0;
        }
        if filtered >= 360.0 {
            filtered -= 360.0;
        }
        filtered
    }
}
