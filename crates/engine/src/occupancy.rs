//! Seat occupancy for a single carriage.
//!
//! Occupancy relaxes toward a target instead of jumping to it: each step
//! looks at one random seat and flips it with a fixed probability when that
//! moves the carriage toward the target. Passengers board faster than they
//! leave, so the fill probability is higher than the empty probability.

use rand::Rng;
use trainsim_types::SeatNumber;

/// Probability that a free seat is taken when the carriage is below target.
pub const FILL_PROBABILITY: f64 = 0.7;

/// Probability that an occupied seat is freed when the carriage is above target.
pub const EMPTY_PROBABILITY: f64 = 0.6;

/// Outcome of one occupancy step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatStep {
    /// The seat that was examined.
    pub seat: SeatNumber,
    /// Whether the seat is occupied after the step.
    pub occupied: bool,
    /// Whether the step changed the seat.
    pub flipped: bool,
}

impl SeatStep {
    /// Whether the seat is free after the step.
    pub fn available(&self) -> bool {
        !self.occupied
    }
}

/// Seat state of one carriage. `true` means occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyModel {
    seats: Vec<bool>,
}

impl OccupancyModel {
    /// Create an empty carriage with the given number of seats.
    pub fn new(seats: usize) -> Self {
        Self {
            seats: vec![false; seats],
        }
    }

    /// Create a carriage from explicit seat flags.
    pub fn from_seats(seats: Vec<bool>) -> Self {
        Self { seats }
    }

    /// Number of seats.
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether the carriage has no seats.
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Seat flags, indexed by zero-based seat position.
    pub fn seats(&self) -> &[bool] {
        &self.seats
    }

    /// Number of occupied seats.
    pub fn occupied_count(&self) -> usize {
        self.seats.iter().filter(|&&occupied| occupied).count()
    }

    /// Fraction of occupied seats, in `[0, 1]`. A carriage without seats is empty.
    pub fn current_occupancy(&self) -> f64 {
        if self.seats.is_empty() {
            return 0.0;
        }
        self.occupied_count() as f64 / self.seats.len() as f64
    }

    /// Whether the given seat is occupied.
    ///
    /// # Panics
    ///
    /// Panics if the seat is outside the carriage.
    pub fn is_occupied(&self, seat: SeatNumber) -> bool {
        self.seats[seat.index()]
    }

    /// Step a uniformly chosen seat toward `target`.
    ///
    /// # Panics
    ///
    /// Panics if the carriage has no seats.
    pub fn step<R: Rng + ?Sized>(&mut self, target: f64, rng: &mut R) -> SeatStep {
        assert!(!self.seats.is_empty(), "cannot step a carriage without seats");
        let seat = SeatNumber::from_index(rng.gen_range(0..self.seats.len()));
        self.step_seat(seat, target, rng)
    }

    /// Step the given seat toward `target`.
    ///
    /// A free seat is taken with [`FILL_PROBABILITY`] while the carriage is
    /// below target; an occupied seat is freed with [`EMPTY_PROBABILITY`] while
    /// it is above. Otherwise the seat is left alone.
    ///
    /// # Panics
    ///
    /// Panics if the seat is outside the carriage.
    pub fn step_seat<R: Rng + ?Sized>(
        &mut self,
        seat: SeatNumber,
        target: f64,
        rng: &mut R,
    ) -> SeatStep {
        let idx = seat.index();
        let occupied = self.seats[idx];
        let current = self.current_occupancy();

        let flip = if current < target && !occupied {
            rng.gen_bool(FILL_PROBABILITY)
        } else if current > target && occupied {
            rng.gen_bool(EMPTY_PROBABILITY)
        } else {
            false
        };

        if flip {
            self.seats[idx] = !occupied;
        }

        SeatStep {
            seat,
            occupied: self.seats[idx],
            flipped: flip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_new_carriage_is_empty() {
        let model = OccupancyModel::new(10);
        assert_eq!(model.len(), 10);
        assert_eq!(model.occupied_count(), 0);
        assert_eq!(model.current_occupancy(), 0.0);
    }

    #[test]
    fn test_occupancy_stays_in_unit_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut model = OccupancyModel::new(13);

        for step in 0..5_000 {
            let target = [0.85, 0.25, 0.99, 0.20][(step / 250) % 4];
            model.step(target, &mut rng);
            let occupancy = model.current_occupancy();
            assert!((0.0..=1.0).contains(&occupancy), "occupancy {}", occupancy);
        }
    }

    #[test]
    fn test_same_seed_same_flips() {
        let run = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut model = OccupancyModel::new(20);
            (0..500)
                .map(|i| model.step(if i < 250 { 0.99 } else { 0.2 }, &mut rng))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    #[test]
    fn test_fills_toward_high_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut model = OccupancyModel::new(10);
        let mut previous = model.current_occupancy();

        // Below target only fills happen, so occupancy never drops on the way up.
        while model.current_occupancy() < 0.99 {
            model.step(0.99, &mut rng);
            let current = model.current_occupancy();
            assert!(current >= previous);
            previous = current;
        }

        // Once there, it hovers within one seat of the target.
        for _ in 0..1_000 {
            model.step(0.99, &mut rng);
            assert!(model.current_occupancy() >= 0.9);
        }
    }

    #[test]
    fn test_mean_occupancy_rises_under_rush_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut model = OccupancyModel::new(50);
        let mut window_means = Vec::new();

        for _ in 0..4 {
            let mut sum = 0.0;
            for _ in 0..25 {
                model.step(0.99, &mut rng);
                sum += model.current_occupancy();
            }
            window_means.push(sum / 25.0);
        }

        for pair in window_means.windows(2) {
            assert!(pair[1] > pair[0], "means not rising: {:?}", window_means);
        }
    }

    #[test]
    fn test_empties_toward_low_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut model = OccupancyModel::from_seats(vec![true; 20]);

        for _ in 0..2_000 {
            model.step(0.20, &mut rng);
        }

        let occupancy = model.current_occupancy();
        assert!(occupancy <= 0.25, "occupancy {}", occupancy);
        assert!(occupancy >= 0.15, "occupancy {}", occupancy);
    }

    #[test]
    fn test_no_flip_at_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut model = OccupancyModel::from_seats(vec![true, false, true, false]);

        for _ in 0..100 {
            let step = model.step(0.5, &mut rng);
            assert!(!step.flipped);
        }
        assert_eq!(model.seats(), &[true, false, true, false]);
    }

    #[test]
    fn test_seat_already_in_desired_state_is_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut model = OccupancyModel::from_seats(vec![true, false, false, false]);

        // Below target, but seat 1 is already occupied.
        for _ in 0..50 {
            let step = model.step_seat(SeatNumber(1), 0.99, &mut rng);
            assert!(step.occupied);
            assert!(!step.flipped);
        }
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_seat_panics() {
        let model = OccupancyModel::new(4);
        model.is_occupied(SeatNumber(5));
    }
}
