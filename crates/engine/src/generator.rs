//! Sensor event generation.
//!
//! A [`Generator`] models a whole train. It is split into one
//! [`CarriageGenerator`] per carriage so each concurrent carriage unit can own
//! its seats and its random source outright: no locks, and a fixed seed
//! reproduces every carriage's stream.

use crate::config::SimConfig;
use crate::day_cycle::DayCycle;
use crate::error::ConfigError;
use crate::occupancy::OccupancyModel;
use crate::scheduler::DelayScheduler;
use bytes::Bytes;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use trainsim_types::{
    CarriageId, CodecError, Event, EventHeader, NoiseEvent, SeatEvent, TemperatureEvent, TrainId,
};

/// Noise sensor positions.
pub const NOISE_LOCATIONS: [&str; 3] = ["front", "middle", "back"];

/// Temperature sensor positions.
pub const SENSOR_LOCATIONS: [&str; 4] = ["ceiling", "floor", "window", "door"];

/// Extra decibels of a full carriage over an empty one.
const NOISE_PER_OCCUPANCY: f64 = 25.0;

/// Extra degrees Celsius of a full carriage over an empty one.
const HEAT_PER_OCCUPANCY: f64 = 4.0;

/// An encoded event ready to hand to a publisher.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub topic: String,
    pub payload: Bytes,
    pub event: Event,
}

impl Envelope {
    /// Address and encode an event.
    pub fn seal(event: Event) -> Result<Self, CodecError> {
        Ok(Self {
            topic: event.topic(),
            payload: event.encode()?,
            event,
        })
    }
}

/// Event source for one carriage.
#[derive(Debug, Clone)]
pub struct CarriageGenerator {
    train: TrainId,
    carriage: CarriageId,
    occupancy: OccupancyModel,
    day_cycle: DayCycle,
    scheduler: DelayScheduler,
    rng: ChaCha8Rng,
}

impl CarriageGenerator {
    /// Create an empty carriage seeded with `seed`.
    pub fn new(
        train: TrainId,
        carriage: CarriageId,
        seats: usize,
        day_cycle: DayCycle,
        scheduler: DelayScheduler,
        seed: u64,
    ) -> Self {
        Self {
            train,
            carriage,
            occupancy: OccupancyModel::new(seats),
            day_cycle,
            scheduler,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Carriage this generator reports for.
    pub fn carriage(&self) -> CarriageId {
        self.carriage
    }

    /// Train this generator reports for.
    pub fn train(&self) -> &TrainId {
        &self.train
    }

    /// Seat state of the carriage.
    pub fn occupancy(&self) -> &OccupancyModel {
        &self.occupancy
    }

    /// Fraction of occupied seats.
    pub fn current_occupancy(&self) -> f64 {
        self.occupancy.current_occupancy()
    }

    /// Day cycle driving this carriage.
    pub fn day_cycle(&self) -> &DayCycle {
        &self.day_cycle
    }

    fn header(&self) -> EventHeader {
        EventHeader::now(self.train.clone(), self.carriage)
    }

    /// Step one random seat toward the current target and report it.
    pub fn seat_event(&mut self) -> SeatEvent {
        let target = self.day_cycle.target_occupancy();
        let step = self.occupancy.step(target, &mut self.rng);
        SeatEvent {
            header: self.header(),
            seat: step.seat,
            available: step.available(),
        }
    }

    /// Noise reading: a 40-50 dB floor plus up to 25 dB from passengers.
    pub fn noise_event(&mut self) -> NoiseEvent {
        let base = self.rng.gen_range(40.0..50.0);
        let decibel_level = base + self.current_occupancy() * NOISE_PER_OCCUPANCY;
        let location = NOISE_LOCATIONS[self.rng.gen_range(0..NOISE_LOCATIONS.len())];
        NoiseEvent {
            header: self.header(),
            decibel_level,
            location: location.to_string(),
        }
    }

    /// Temperature reading: phase base, up to 4 degrees of body heat, +/-1 degree noise.
    pub fn temperature_event(&mut self) -> TemperatureEvent {
        let body_heat = self.current_occupancy() * HEAT_PER_OCCUPANCY;
        let temperature_celsius =
            self.day_cycle.base_temperature() + body_heat + self.rng.gen_range(-1.0..=1.0);
        let humidity = self.rng.gen_range(35.0..65.0);
        let sensor_location = SENSOR_LOCATIONS[self.rng.gen_range(0..SENSOR_LOCATIONS.len())];
        TemperatureEvent {
            header: self.header(),
            temperature_celsius,
            humidity,
            sensor_location: sensor_location.to_string(),
        }
    }

    /// Generate one event of every kind, in publish order.
    pub fn next_events(&mut self) -> [Event; 3] {
        [
            self.seat_event().into(),
            self.noise_event().into(),
            self.temperature_event().into(),
        ]
    }

    /// Generate and encode one event of every kind, in publish order.
    pub fn next_cycle(&mut self) -> Result<Vec<Envelope>, CodecError> {
        self.next_events().into_iter().map(Envelope::seal).collect()
    }

    /// Wait before the next cycle.
    pub fn next_delay(&mut self) -> Duration {
        self.scheduler.next_delay(&mut self.rng)
    }

    /// Wait before the first cycle.
    pub fn startup_offset(&mut self) -> Duration {
        self.scheduler.startup_offset(&mut self.rng)
    }
}

/// Event source for a whole train.
#[derive(Debug, Clone)]
pub struct Generator {
    config: SimConfig,
    seed: u64,
    day_cycle: DayCycle,
    carriages: Vec<CarriageGenerator>,
}

impl Generator {
    /// Create a generator with a day cycle starting now.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_day_cycle(config, DayCycle::new())
    }

    /// Create a generator driven by the given day cycle.
    ///
    /// Carriage `n` draws from its own source seeded with `seed + n`.
    pub fn with_day_cycle(config: SimConfig, day_cycle: DayCycle) -> Result<Self, ConfigError> {
        config.validate()?;

        let seed = config.resolved_seed();
        let scheduler = DelayScheduler::new(config.base_interval, config.jitter);
        let carriages = CarriageId::all(config.carriages)
            .map(|carriage| {
                CarriageGenerator::new(
                    config.train.clone(),
                    carriage,
                    config.seats_per_carriage as usize,
                    day_cycle,
                    scheduler,
                    seed.wrapping_add(carriage.0 as u64),
                )
            })
            .collect();

        Ok(Self {
            config,
            seed,
            day_cycle,
            carriages,
        })
    }

    /// The configuration this generator was built from.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The seed in use (resolved if the configured seed was 0).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The shared day cycle.
    pub fn day_cycle(&self) -> &DayCycle {
        &self.day_cycle
    }

    /// All carriage generators, in carriage order.
    pub fn carriages(&self) -> &[CarriageGenerator] {
        &self.carriages
    }

    /// Generator for one carriage.
    pub fn carriage(&self, carriage: CarriageId) -> Option<&CarriageGenerator> {
        self.carriages.get(carriage.index()).filter(|_| carriage.0 > 0)
    }

    /// Mutable generator for one carriage.
    pub fn carriage_mut(&mut self, carriage: CarriageId) -> Option<&mut CarriageGenerator> {
        if carriage.0 == 0 {
            return None;
        }
        self.carriages.get_mut(carriage.index())
    }

    /// Occupancy of one carriage.
    pub fn current_occupancy(&self, carriage: CarriageId) -> Option<f64> {
        self.carriage(carriage).map(CarriageGenerator::current_occupancy)
    }

    /// Split into per-carriage generators, one per concurrent unit.
    pub fn into_carriages(self) -> Vec<CarriageGenerator> {
        self.carriages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainsim_types::EventKind;

    fn scenario_config() -> SimConfig {
        SimConfig::new("IC-123")
            .with_carriages(1)
            .with_seats_per_carriage(10)
            .with_base_interval(Duration::from_secs(1))
            .with_jitter(Duration::ZERO)
            .with_seed(42)
    }

    #[test]
    fn test_first_cycle_order_and_header() {
        let mut generator = Generator::new(scenario_config()).unwrap();
        let carriage = generator.carriage_mut(CarriageId(1)).unwrap();

        let cycle = carriage.next_cycle().unwrap();
        let kinds: Vec<_> = cycle.iter().map(|e| e.event.kind()).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Seat, EventKind::Noise, EventKind::Temperature]
        );

        for envelope in &cycle {
            let header = envelope.event.header();
            assert_eq!(header.carriage, CarriageId(1));
            assert_eq!(header.train, TrainId::new("IC-123"));
            assert_eq!(envelope.topic, envelope.event.topic());
            assert_eq!(Event::decode(&envelope.payload).unwrap(), envelope.event);
        }
        assert_eq!(cycle[0].topic, "train/IC-123/carriage/1/seat");
        assert_eq!(carriage.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = scenario_config().with_carriages(0);
        assert_eq!(Generator::new(config).unwrap_err(), ConfigError::NoCarriages);
    }

    #[test]
    fn test_seat_array_matches_config() {
        let config = scenario_config()
            .with_carriages(3)
            .with_seats_per_carriage(7);
        let generator = Generator::new(config.clone()).unwrap();

        assert_eq!(generator.carriages().len(), 3);
        let total: usize = generator.carriages().iter().map(|c| c.occupancy().len()).sum();
        assert_eq!(total, config.total_seats());
        assert!(generator.carriage(CarriageId(0)).is_none());
        assert!(generator.carriage(CarriageId(4)).is_none());
        assert_eq!(generator.current_occupancy(CarriageId(3)), Some(0.0));
    }

    #[test]
    fn test_same_seed_reproduces_seat_stream() {
        let seats = |seed| {
            let mut generator =
                Generator::new(scenario_config().with_seed(seed).with_carriages(2)).unwrap();
            let carriage = generator.carriage_mut(CarriageId(2)).unwrap();
            (0..200)
                .map(|_| {
                    let e = carriage.seat_event();
                    (e.seat, e.available)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(seats(42), seats(42));
    }

    #[test]
    fn test_carriages_draw_independent_streams() {
        let mut carriages = Generator::new(scenario_config().with_carriages(2))
            .unwrap()
            .into_carriages();

        let mut first = Vec::new();
        let mut second = Vec::new();
        for _ in 0..50 {
            first.push(carriages[0].seat_event().seat);
            second.push(carriages[1].seat_event().seat);
        }
        assert_ne!(first, second);
    }

    #[test]
    fn test_seat_event_reports_resulting_availability() {
        let mut generator = Generator::new(scenario_config()).unwrap();
        let carriage = generator.carriage_mut(CarriageId(1)).unwrap();

        for _ in 0..100 {
            let event = carriage.seat_event();
            assert!((1..=10).contains(&event.seat.0));
            assert_eq!(event.available, !carriage.occupancy().is_occupied(event.seat));
        }
    }

    #[test]
    fn test_noise_scales_with_occupancy() {
        let mut generator = Generator::new(scenario_config()).unwrap();
        let carriage = generator.carriage_mut(CarriageId(1)).unwrap();

        for _ in 0..200 {
            let occupancy = carriage.current_occupancy();
            let event = carriage.noise_event();
            let floor = 40.0 + occupancy * 25.0;
            assert!(event.decibel_level >= floor && event.decibel_level < floor + 10.0);
            assert!(event.decibel_level < 75.0);
            assert!(NOISE_LOCATIONS.contains(&event.location.as_str()));
            carriage.seat_event();
        }
    }

    #[test]
    fn test_temperature_in_phase_band() {
        // Freshly started cycle: Morning Rush, base 18 degrees.
        let mut generator = Generator::new(scenario_config()).unwrap();
        let carriage = generator.carriage_mut(CarriageId(1)).unwrap();

        for _ in 0..200 {
            let occupancy = carriage.current_occupancy();
            let event = carriage.temperature_event();
            let centre = 18.0 + occupancy * 4.0;
            assert!((event.temperature_celsius - centre).abs() <= 1.0);
            assert!((35.0..65.0).contains(&event.humidity));
            assert!(SENSOR_LOCATIONS.contains(&event.sensor_location.as_str()));
            carriage.seat_event();
        }
    }
}
