//! Rate sensor model for closed-loop tests
//!
//! Adds seeded Gaussian noise to the true body rate, standing in for the
//! gyro the host would sample in flight.

use nalgebra::Vector3;

/// Deterministic xorshift generator
///
/// Seeded and allocation-free; enough randomness for noise injection and
/// randomised test inputs without pulling a RNG crate into the core.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform f64 in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }

    /// Standard Gaussian via Box-Muller
    pub fn next_gaussian(&mut self) -> f64 {
        let u1 = self.next_f64().max(1e-10);
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    /// Gaussian Vector3 with the given standard deviation
    pub fn next_gaussian_vec3(&mut self, std_dev: f64) -> Vector3<f64> {
        Vector3::new(
            self.next_gaussian() * std_dev,
            self.next_gaussian() * std_dev,
            self.next_gaussian() * std_dev,
        )
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(12345)
    }
}

/// Gyroscope measurement model
#[derive(Debug, Clone)]
pub struct GyroSensor {
    noise_std: f64,
    rng: SimpleRng,
}

impl GyroSensor {
    pub fn new(noise_std: f64, seed: u64) -> Self {
        Self {
            noise_std,
            rng: SimpleRng::new(seed),
        }
    }

    /// Noisy body-rate measurement
    pub fn measure(&mut self, true_rate: &Vector3<f64>) -> Vector3<f64> {
        if self.noise_std == 0.0 {
            return *true_rate;
        }
        true_rate + self.rng.next_gaussian_vec3(self.noise_std)
    }
}
