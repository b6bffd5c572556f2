use std::time::Instant;

use bon::Builder;

use crate::{
    core::{
        error::PricingError,
        offpeak::OffPeakPeriods,
        point::OutputPoint,
        reading::{MeterReading, PricedReading},
        summary::PeriodSummary,
        tariff::ProviderTariff,
    },
    prelude::*,
};

/// What to do with a negative or non-finite reading.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum InvalidReadingPolicy {
    /// Fail the whole batch.
    #[default]
    Abort,

    /// Skip the reading and count it.
    Skip,
}

#[derive(Builder)]
pub struct Pipeline<'a> {
    tariff: &'a ProviderTariff,
    periods: &'a OffPeakPeriods,

    /// Sink measurement name, used verbatim.
    measurement: &'a str,

    #[builder(default)]
    invalid_readings: InvalidReadingPolicy,
}

#[must_use]
#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// Points in the input order.
    pub points: Vec<OutputPoint>,

    pub summary: PeriodSummary,

    /// Readings dropped from the batch.
    pub n_skipped: usize,
}

impl Pipeline<'_> {
    /// Classify and price the reading.
    pub fn price(&self, reading: &MeterReading) -> Result<PricedReading, PricingError> {
        let is_offpeak = self.periods.is_offpeak(reading.timestamp);
        Ok(PricedReading {
            timestamp: reading.timestamp,
            energy: reading.energy,
            is_offpeak,
            cost: self.tariff.price(reading.energy, is_offpeak)?,
        })
    }

    /// Price the readings, build the points and sum everything up.
    ///
    /// Readings whose point cannot be built are still accounted in the summary.
    #[instrument(skip_all, fields(n_readings = readings.len()))]
    pub fn run(&self, readings: &[MeterReading]) -> Result<PipelineOutput, PricingError> {
        let start_time = Instant::now();
        let has_offpeak_periods = !self.periods.is_empty();
        let mut output =
            PipelineOutput { points: Vec::with_capacity(readings.len()), ..Default::default() };

        for reading in readings {
            let priced = match self.price(reading) {
                Ok(priced) => priced,
                Err(error @ PricingError::InvalidReading { .. }) => {
                    warn!(timestamp = %reading.timestamp, "{error}");
                    match self.invalid_readings {
                        InvalidReadingPolicy::Abort => return Err(error),
                        InvalidReadingPolicy::Skip => {
                            output.n_skipped += 1;
                            continue;
                        }
                    }
                }
                Err(error) => return Err(error),
            };
            output.summary = output.summary.accumulate(&priced, self.tariff.peak_offpeak_enabled)?;

            match OutputPoint::try_build(self.measurement, &priced, has_offpeak_periods) {
                Ok(point) => {
                    debug!(
                        timestamp = %point.timestamp,
                        energy = ?priced.energy,
                        period = %point.period,
                        cost = ?priced.cost,
                        "priced the reading"
                    );
                    output.points.push(point);
                }
                Err(error) => {
                    warn!(timestamp = %priced.timestamp, "{error}, skipping");
                    output.n_skipped += 1;
                }
            }
        }

        info!(
            n_points = output.points.len(),
            n_skipped = output.n_skipped,
            elapsed = ?start_time.elapsed(),
            "priced"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone};
    use itertools::Itertools;

    use super::*;
    use crate::core::{offpeak::OffPeakPeriod, point::TariffPeriod};

    fn midnight() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()
    }

    fn night() -> OffPeakPeriods {
        OffPeakPeriods::from(vec![OffPeakPeriod::new(
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        )])
    }

    fn flat() -> ProviderTariff {
        ProviderTariff::builder().price_per_kwh(0.20.into()).build()
    }

    fn peak_offpeak() -> ProviderTariff {
        ProviderTariff::builder()
            .peak_offpeak_enabled(true)
            .price_per_kwh_peak(0.25.into())
            .price_per_kwh_offpeak(0.15.into())
            .build()
    }

    fn hourly(energies: &[f64]) -> Vec<MeterReading> {
        energies
            .iter()
            .zip(0..)
            .map(|(energy, hour)| {
                MeterReading::new(midnight() + TimeDelta::hours(hour), (*energy).into())
            })
            .collect()
    }

    #[test]
    fn test_empty_input() -> Result {
        let tariff = peak_offpeak();
        let periods = night();
        let output = Pipeline::builder()
            .tariff(&tariff)
            .periods(&periods)
            .measurement("conso")
            .build()
            .run(&[])?;
        assert!(output.points.is_empty());
        assert_eq!(output.summary, PeriodSummary::default());
        assert_eq!(output.n_skipped, 0);
        Ok(())
    }

    #[test]
    fn test_flat_tariff() -> Result {
        let tariff = flat();
        let periods = OffPeakPeriods::default();
        let readings = vec![MeterReading::new(midnight() + TimeDelta::hours(23), 1.5.into())];
        let output = Pipeline::builder()
            .tariff(&tariff)
            .periods(&periods)
            .measurement("conso")
            .build()
            .run(&readings)?;
        assert_eq!(output.points.len(), 1);
        assert_abs_diff_eq!(output.points[0].fields.price, 0.30);
        assert_eq!(output.points[0].period, TariffPeriod::Normal);
        assert_abs_diff_eq!(output.summary.total_price.0, 0.30);
        Ok(())
    }

    #[test]
    fn test_peak_offpeak_tariff() -> Result {
        let tariff = peak_offpeak();
        let periods = night();
        let pipeline =
            Pipeline::builder().tariff(&tariff).periods(&periods).measurement("conso").build();
        let reading = MeterReading::new(midnight() + TimeDelta::hours(23), 2.0.into());

        let priced = pipeline.price(&reading)?;
        assert!(priced.is_offpeak);
        assert_abs_diff_eq!(priced.cost.0, 0.30);

        let output = pipeline.run(&[reading])?;
        assert_eq!(
            output.points[0].tags(),
            [("heures_creuses", "1"), ("heures_pleines", "0"), ("heures_normales", "0")]
        );
        Ok(())
    }

    #[test]
    fn test_whole_day_split() -> Result {
        let tariff = peak_offpeak();
        let periods = OffPeakPeriods::from(vec![OffPeakPeriod::new(
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        )]);
        let output = Pipeline::builder()
            .tariff(&tariff)
            .periods(&periods)
            .measurement("conso")
            .build()
            .run(&hourly(&[1.0; 24]))?;
        assert_eq!(output.points.len(), 24);
        assert_abs_diff_eq!(output.summary.total_energy.0, 24.0);
        assert_abs_diff_eq!(output.summary.total_energy_peak.0, 12.0);
        assert_abs_diff_eq!(output.summary.total_energy_offpeak.0, 12.0);
        assert_abs_diff_eq!(
            output.summary.total_price.0,
            12.0 * 0.25 + 12.0 * 0.15,
            epsilon = 1e-9
        );
        Ok(())
    }

    #[test]
    fn test_no_periods_means_normal_hours() -> Result {
        let tariff = peak_offpeak();
        let periods = OffPeakPeriods::default();
        let output = Pipeline::builder()
            .tariff(&tariff)
            .periods(&periods)
            .measurement("conso")
            .build()
            .run(&hourly(&[0.5; 24]))?;
        assert!(output.points.iter().all(|point| point.period == TariffPeriod::Normal));
        assert_abs_diff_eq!(output.summary.total_energy_peak.0, 12.0);
        assert_abs_diff_eq!(output.summary.total_energy_offpeak.0, 0.0);
        Ok(())
    }

    #[test]
    fn test_order_is_preserved() -> Result {
        let tariff = flat();
        let periods = night();
        let mut readings = hourly(&[1.0, 2.0, 3.0]);
        readings.reverse();
        let output = Pipeline::builder()
            .tariff(&tariff)
            .periods(&periods)
            .measurement("conso")
            .build()
            .run(&readings)?;
        let timestamps = output.points.iter().map(|point| point.timestamp).collect_vec();
        assert_eq!(timestamps, readings.iter().map(|reading| reading.timestamp).collect_vec());
        Ok(())
    }

    #[test]
    fn test_invalid_reading_aborts_by_default() {
        let tariff = flat();
        let periods = night();
        let result = Pipeline::builder()
            .tariff(&tariff)
            .periods(&periods)
            .measurement("conso")
            .build()
            .run(&hourly(&[1.0, -1.0, 1.0]));
        assert!(matches!(result, Err(PricingError::InvalidReading { .. })));
    }

    #[test]
    fn test_invalid_reading_skipped() -> Result {
        let tariff = flat();
        let periods = night();
        let output = Pipeline::builder()
            .tariff(&tariff)
            .periods(&periods)
            .measurement("conso")
            .invalid_readings(InvalidReadingPolicy::Skip)
            .build()
            .run(&hourly(&[1.0, f64::NAN, 1.0]))?;
        assert_eq!(output.points.len(), 2);
        assert_eq!(output.n_skipped, 1);
        assert_abs_diff_eq!(output.summary.total_energy.0, 2.0);
        Ok(())
    }

    #[test]
    fn test_point_construction_error_is_not_fatal() -> Result {
        let tariff = flat();
        let periods = night();
        let output = Pipeline::builder()
            .tariff(&tariff)
            .periods(&periods)
            .measurement("")
            .build()
            .run(&hourly(&[1.0, 1.0]))?;
        assert!(output.points.is_empty());
        assert_eq!(output.n_skipped, 2);
        assert_abs_diff_eq!(output.summary.total_price.0, 0.4);
        Ok(())
    }

    #[test]
    fn test_aggregation_error_is_fatal() {
        let tariff = flat();
        let periods = night();
        let result = Pipeline::builder()
            .tariff(&tariff)
            .periods(&periods)
            .measurement("conso")
            .invalid_readings(InvalidReadingPolicy::Skip)
            .build()
            .run(&hourly(&[f64::MAX, f64::MAX]));
        assert!(matches!(result, Err(PricingError::Aggregation(_))));
    }
}
