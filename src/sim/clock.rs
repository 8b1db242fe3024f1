/// A simulation clock that walks (year × timestep) pairs over a lifetime
/// run.
///
/// The `Clock` yields one [`Tick`] per timestep and marks year boundaries so
/// the engine can apply the per-year degradation factor exactly once per
/// simulated year.
///
/// # Examples
///
/// ```
/// use pv_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(8760, 2);
/// let first = clock.tick().unwrap();
/// assert_eq!(first.year, 0);
/// assert!(!first.year_boundary);
/// ```
pub struct Clock {
    /// Current step of the simulation
    current: usize,
    /// Steps in one simulated year
    steps_per_year: usize,
    /// Total steps across all years
    total: usize,
}

/// One clock position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Timestep index within the whole run.
    pub index: usize,
    /// Simulated year, starting at 0.
    pub year: usize,
    /// Timestep index within the current year.
    pub step_in_year: usize,
    /// True on the first step of every year except year zero.
    pub year_boundary: bool,
}

impl Clock {
    /// Creates a new clock.
    ///
    /// # Panics
    ///
    /// Panics if `steps_per_year` is zero.
    pub fn new(steps_per_year: usize, years: usize) -> Self {
        assert!(steps_per_year > 0, "steps_per_year must be > 0");
        Self {
            current: 0,
            steps_per_year,
            total: steps_per_year * years,
        }
    }

    /// Advances the clock by one step.
    ///
    /// Returns `None` once all steps have been yielded.
    pub fn tick(&mut self) -> Option<Tick> {
        if self.current >= self.total {
            return None;
        }
        let index = self.current;
        self.current += 1;
        let year = index / self.steps_per_year;
        let step_in_year = index % self.steps_per_year;
        Some(Tick {
            index,
            year,
            step_in_year,
            year_boundary: step_in_year == 0 && year > 0,
        })
    }
}
