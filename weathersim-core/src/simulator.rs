//! Synthetic observation generation.
//!
//! A batch visits every configured city exactly once, in random order. Each
//! city is resolved through the [`CoordinateResolver`], paired with a freshly
//! rolled [`Reading`] and a timestamp from the last hundred days, and written
//! out as soon as it exists.

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime};
use rand::{Rng, seq::SliceRandom};
use std::{io::Write, ops::RangeInclusive};

use crate::{CoordinateResolver, Observation, Reading};

/// Humidity in %. Values above 100 model condensation.
pub const HUMIDITY_RANGE: RangeInclusive<i32> = 70..=130;
/// Pressure in hPa, 1013 +/- 100.
pub const PRESSURE_RANGE: RangeInclusive<i32> = 913..=1213;
/// Temperature in degrees Celsius.
pub const TEMPERATURE_RANGE: RangeInclusive<i32> = -15..=50;
/// Oldest generated timestamp, in seconds before now (100 days).
pub const MAX_AGE_SECS: i64 = 8_640_000;

pub fn random_reading<R: Rng + ?Sized>(rng: &mut R) -> Reading {
    Reading {
        humidity_pct: rng.random_range(HUMIDITY_RANGE),
        pressure_hpa: rng.random_range(PRESSURE_RANGE),
        temperature_c: rng.random_range(TEMPERATURE_RANGE),
    }
}

/// `now` shifted back by a uniformly random number of seconds in `0..=MAX_AGE_SECS`.
pub fn random_timestamp<R: Rng + ?Sized>(now: NaiveDateTime, rng: &mut R) -> NaiveDateTime {
    now - Duration::seconds(rng.random_range(0..=MAX_AGE_SECS))
}

#[derive(Debug)]
pub struct Simulator {
    cities: Vec<String>,
    resolver: Box<dyn CoordinateResolver>,
}

impl Simulator {
    pub fn new(cities: Vec<String>, resolver: Box<dyn CoordinateResolver>) -> Self {
        Self { cities, resolver }
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Resolve `city` and synthesize one observation for it.
    pub async fn observe<R: Rng + ?Sized>(
        &self,
        city: &str,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> Result<Observation> {
        let position = self
            .resolver
            .resolve(city)
            .await
            .with_context(|| format!("Failed to resolve coordinates for '{city}'"))?;

        let reading = random_reading(rng);
        let local_time = random_timestamp(now, rng);

        Ok(Observation::new(city, position, local_time, reading))
    }

    /// Generate one observation per city in random order, writing each line to
    /// `out` as soon as it is produced.
    ///
    /// The first failure aborts the batch. Lines already written are left in
    /// place. Returns the number of lines written.
    pub async fn run_batch<W, R>(&self, out: &mut W, rng: &mut R) -> Result<usize>
    where
        W: Write + ?Sized,
        R: Rng + ?Sized,
    {
        let mut order: Vec<&str> = self.cities.iter().map(String::as_str).collect();
        order.shuffle(rng);

        tracing::info!(cities = order.len(), "starting batch");

        for (written, city) in order.iter().enumerate() {
            let now = Local::now().naive_local();
            let observation = match self.observe(city, now, &mut *rng).await {
                Ok(obs) => obs,
                Err(err) => {
                    tracing::info!(written, "batch aborted");
                    return Err(err);
                }
            };

            writeln!(out, "{observation}").context("Failed to write observation")?;
            out.flush().context("Failed to flush output")?;
        }

        tracing::info!(written = order.len(), "batch finished");
        Ok(order.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Condition, Position, ResolveError};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::{HashMap, HashSet};

    #[derive(Debug, Default)]
    struct StaticResolver {
        positions: HashMap<String, Position>,
        fail_on: Option<String>,
    }

    impl StaticResolver {
        fn with(mut self, city: &str, latitude: f64, longitude: f64, elevation: f64) -> Self {
            self.positions.insert(city.to_string(), Position { latitude, longitude, elevation });
            self
        }

        fn failing_on(mut self, city: &str) -> Self {
            self.fail_on = Some(city.to_string());
            self
        }
    }

    #[async_trait]
    impl CoordinateResolver for StaticResolver {
        async fn resolve(&self, city: &str) -> Result<Position, ResolveError> {
            if self.fail_on.as_deref() == Some(city) {
                return Err(ResolveError::ServiceStatus {
                    service: "static",
                    status: "OVER_QUERY_LIMIT".into(),
                });
            }

            self.positions.get(city).copied().ok_or_else(|| ResolveError::NoResults {
                service: "static",
                query: city.to_string(),
            })
        }
    }

    fn australia() -> StaticResolver {
        StaticResolver::default()
            .with("Sydney", -33.86, 151.21, 39.0)
            .with("Melbourne", -37.83, 144.98, 7.0)
            .with("Adelaide", -34.92, 138.62, 48.0)
            .with("Brisbane", -27.47, 153.03, 28.0)
    }

    fn cities(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 9, 27)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date")
    }

    #[test]
    fn readings_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10_000 {
            let r = random_reading(&mut rng);
            assert!(HUMIDITY_RANGE.contains(&r.humidity_pct));
            assert!(PRESSURE_RANGE.contains(&r.pressure_hpa));
            assert!(TEMPERATURE_RANGE.contains(&r.temperature_c));
        }
    }

    #[test]
    fn timestamps_fall_within_last_hundred_days() {
        let mut rng = StdRng::seed_from_u64(11);
        let now = fixed_now();
        let oldest = now - Duration::days(100);

        for _ in 0..10_000 {
            let ts = random_timestamp(now, &mut rng);
            assert!(ts <= now && ts >= oldest, "{ts} out of range");
        }
    }

    #[tokio::test]
    async fn observe_combines_position_and_reading() {
        let sim = Simulator::new(cities(&["Sydney"]), Box::new(australia()));
        let mut rng = StdRng::seed_from_u64(3);

        let obs = sim.observe("Sydney", fixed_now(), &mut rng).await.unwrap();

        assert_eq!(obs.city, "Sydney");
        assert_eq!(obs.position.to_string(), "-33.86,151.21,39");
        assert_eq!(
            obs.condition,
            Condition::derive(obs.reading.temperature_c, obs.reading.humidity_pct)
        );

        let line = obs.to_string();
        let fields: Vec<&str> = line.split('|').collect();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[0], "Sydney");
        assert_eq!(fields[1], "-33.86,151.21,39");
        assert!(NaiveDateTime::parse_from_str(fields[2], "%Y-%m-%dT%H:%M:%S").is_ok());
    }

    #[tokio::test]
    async fn batch_emits_every_city_once() {
        let names = ["Sydney", "Melbourne", "Adelaide", "Brisbane"];
        let sim = Simulator::new(cities(&names), Box::new(australia()));
        let mut rng = StdRng::seed_from_u64(42);
        let mut out = Vec::new();

        let written = sim.run_batch(&mut out, &mut rng).await.unwrap();
        assert_eq!(written, names.len());

        let text = String::from_utf8(out).unwrap();
        let emitted: Vec<&str> =
            text.lines().map(|l| l.split('|').next().unwrap_or_default()).collect();

        assert_eq!(emitted.len(), names.len());
        let unique: HashSet<&str> = emitted.iter().copied().collect();
        let expected: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique, expected);
        assert!(text.ends_with('\n'));
    }

    #[tokio::test]
    async fn batch_order_is_shuffled() {
        let names = ["Sydney", "Melbourne", "Adelaide", "Brisbane"];
        let sim = Simulator::new(cities(&names), Box::new(australia()));
        let mut rng = StdRng::seed_from_u64(1);

        let mut orders = HashSet::new();
        for _ in 0..20 {
            let mut out = Vec::new();
            sim.run_batch(&mut out, &mut rng).await.unwrap();
            let order: Vec<String> = String::from_utf8(out)
                .unwrap()
                .lines()
                .map(|l| l.split('|').next().unwrap_or_default().to_string())
                .collect();
            orders.insert(order);
        }

        assert!(orders.len() > 1, "20 batches produced a single ordering");
    }

    #[tokio::test]
    async fn failing_city_aborts_batch_but_keeps_written_lines() {
        let names = ["Sydney", "Melbourne", "Adelaide", "Brisbane"];
        let sim = Simulator::new(cities(&names), Box::new(australia().failing_on("Adelaide")));
        let mut rng = StdRng::seed_from_u64(5);
        let mut out = Vec::new();

        let err = sim.run_batch(&mut out, &mut rng).await.unwrap_err();
        assert!(err.to_string().contains("Adelaide"));

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.len() < names.len());
        assert!(lines.iter().all(|l| !l.starts_with("Adelaide|")));
        assert!(lines.iter().all(|l| l.split('|').count() == 7));
    }

    #[tokio::test]
    async fn empty_city_list_is_an_empty_batch() {
        let sim = Simulator::new(Vec::new(), Box::new(australia()));
        let mut rng = StdRng::seed_from_u64(0);
        let mut out = Vec::new();

        assert_eq!(sim.run_batch(&mut out, &mut rng).await.unwrap(), 0);
        assert!(out.is_empty());
    }
}
