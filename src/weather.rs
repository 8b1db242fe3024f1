//! Deterministic synthetic weather driver.
//!
//! Generates a seeded clear-sky-with-noise year so the binary and the
//! integration tests have a realistic input without a weather-file parser
//! (weather-file handling is an external collaborator). The profile is a
//! half-cosine daylight shape with seasonal amplitude modulation and
//! Gaussian cloud noise.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::sim::clock::Tick;
use crate::sim::types::{HOURS_PER_YEAR, WeatherSample};

/// Gaussian noise via the Box-Muller transform, mean 0.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Seeded synthetic weather generator.
///
/// Produces one [`WeatherSample`] per clock tick. Identical seeds produce
/// identical sequences.
#[derive(Debug, Clone)]
pub struct SyntheticWeather {
    /// Peak clear-sky POA beam irradiance at solar noon (W/m²).
    pub peak_beam_w_m2: f64,
    /// Diffuse fraction of the clear-sky total.
    pub diffuse_fraction: f64,
    /// Sunrise hour (inclusive).
    pub sunrise_hr: usize,
    /// Sunset hour (exclusive).
    pub sunset_hr: usize,
    /// Standard deviation of the multiplicative cloud noise.
    pub noise_std: f64,
    /// Daily mean ambient temperature (°C).
    pub mean_temp_c: f64,
    steps_per_hour: usize,
    rng: StdRng,
}

impl SyntheticWeather {
    /// Creates a generator with the given daylight window and seed.
    ///
    /// # Panics
    ///
    /// Panics if `sunrise_hr >= sunset_hr` or `sunset_hr > 24`.
    pub fn new(
        peak_beam_w_m2: f64,
        sunrise_hr: usize,
        sunset_hr: usize,
        noise_std: f64,
        steps_per_hour: usize,
        seed: u64,
    ) -> Self {
        assert!(sunrise_hr < sunset_hr && sunset_hr <= 24);
        Self {
            peak_beam_w_m2: peak_beam_w_m2.max(0.0),
            diffuse_fraction: 0.18,
            sunrise_hr,
            sunset_hr,
            noise_std: noise_std.max(0.0),
            mean_temp_c: 14.0,
            steps_per_hour,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Half-cosine daylight fraction for an hour-of-day position.
    fn daylight_frac(&self, hour_of_day: f64) -> f64 {
        let rise = self.sunrise_hr as f64;
        let set = self.sunset_hr as f64;
        if hour_of_day < rise || hour_of_day >= set {
            return 0.0;
        }
        let x = (hour_of_day - rise) / (set - rise);
        (std::f64::consts::PI * x).sin()
    }

    /// Seasonal amplitude for an hour-of-year position, lowest at the turn
    /// of the year.
    fn seasonal_frac(hour_of_year: usize) -> f64 {
        let x = hour_of_year as f64 / HOURS_PER_YEAR as f64;
        0.75 + 0.25 * (2.0 * std::f64::consts::PI * (x - 0.5)).cos()
    }

    /// Generates the weather sample for one tick.
    ///
    /// Advances the internal random state; call exactly once per tick to
    /// stay reproducible.
    pub fn sample(&mut self, tick: &Tick) -> WeatherSample {
        let hour_of_year = tick.step_in_year / self.steps_per_hour;
        let hour_of_day =
            (tick.step_in_year % (24 * self.steps_per_hour)) as f64 / self.steps_per_hour as f64;
        let frac = self.daylight_frac(hour_of_day) * Self::seasonal_frac(hour_of_year);

        let cloud = (1.0 + gaussian_noise(&mut self.rng, self.noise_std)).clamp(0.05, 1.15);
        let clear = self.peak_beam_w_m2 * frac;
        let beam = (clear * cloud * (1.0 - self.diffuse_fraction)).max(0.0);
        let diffuse = clear * self.diffuse_fraction * (0.5 + 0.5 * cloud);
        let ground = 0.02 * (beam + diffuse);

        // Ambient tracks the daylight shape with a few degrees of swing.
        let t_ambient_c = self.mean_temp_c + 8.0 * frac
            + gaussian_noise(&mut self.rng, 0.5)
            - 4.0 * (1.0 - Self::seasonal_frac(hour_of_year));
        let wind_m_s = (2.0 + gaussian_noise(&mut self.rng, 0.8)).max(0.0);

        // Zenith sweeps 90° → ~20° → 90° across the daylight window.
        let zenith_deg = 90.0 - 70.0 * self.daylight_frac(hour_of_day);
        let incidence_deg = (zenith_deg - 20.0).abs().min(89.0);

        WeatherSample {
            beam_w_m2: beam,
            diffuse_w_m2: diffuse,
            ground_w_m2: ground,
            poa_w_m2: None,
            poa_from_weather_file: false,
            t_ambient_c,
            wind_m_s,
            zenith_deg,
            incidence_deg,
        }
    }
}
