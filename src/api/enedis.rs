//! [Enedis Data Connect](https://datahub-enedis.fr/services-api/data-connect/) load curve client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{
    DateTime,
    Days,
    Local,
    MappedLocalTime,
    NaiveDate,
    NaiveDateTime,
    TimeDelta,
    TimeZone,
    Timelike,
};
use itertools::Itertools;
use reqwest::{
    Client,
    Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Deserializer, de};
use serde_with::serde_as;

use crate::{
    api::meter_source::MeterSource,
    core::{interval::Interval, reading::MeterReading},
    prelude::*,
    quantity::{energy::KilowattHours, power::Kilowatts},
};

pub struct Api {
    client: Client,
    base_url: Url,
    usage_point_id: String,
}

impl Api {
    pub const DEFAULT_BASE_URL: &'static str = "https://gw.ext.prod.api.enedis.fr";

    /// The load curve endpoint serves at most this many days per request.
    const MAX_DAYS_PER_REQUEST: u64 = 7;

    pub fn try_new(base_url: &str, access_token: &str, usage_point_id: String) -> Result<Self> {
        let headers = HeaderMap::from_iter([(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}"))
                .context("invalid Enedis access token")?,
        )]);
        let client =
            Client::builder().default_headers(headers).timeout(Duration::from_secs(30)).build()?;
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid Enedis base URL `{base_url}`"))?;
        Ok(Self { client, base_url, usage_point_id })
    }

    #[instrument(skip_all, fields(start = %start, end = %end))]
    async fn get_load_curve(&self, start: NaiveDate, end: NaiveDate) -> Result<LoadCurve> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid Enedis base URL"))?
            .pop_if_empty()
            .extend(["metering_data_clc", "v5", "consumption_load_curve"]);
        let (start, end) = (start.to_string(), end.to_string());
        info!("fetching…");
        let response = self
            .client
            .get(url)
            .query(&[
                ("usage_point_id", self.usage_point_id.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
            ])
            .send()
            .await
            .context("failed to request the load curve")?
            .error_for_status()
            .context("load curve request failed")?
            .json::<LoadCurveResponse>()
            .await
            .context("failed to deserialize the load curve")?;
        info!(n_intervals = response.meter_reading.intervals.len(), "fetched");
        Ok(response.meter_reading)
    }
}

#[async_trait]
impl MeterSource for Api {
    /// Fetch the load curve week by week and aggregate it into hourly readings.
    #[instrument(skip_all, fields(usage_point_id = %self.usage_point_id, interval = ?interval))]
    async fn get_readings(&self, interval: Interval) -> Result<Vec<MeterReading>> {
        let mut readings = Vec::new();
        for (start, end) in request_date_ranges(interval)? {
            readings.extend(self.get_load_curve(start, end).await?.try_into_readings()?);
        }
        Ok(whole_hours_within(interval, readings))
    }
}

/// Split the interval into request date ranges, each end date exclusive.
fn request_date_ranges(interval: Interval) -> Result<Vec<(NaiveDate, NaiveDate)>> {
    // Include the date of the interval end:
    let last_date = interval
        .end
        .date_naive()
        .checked_add_days(Days::new(1))
        .context("interval end is out of range")?;
    let mut start = interval.start.date_naive();
    let mut ranges = Vec::new();
    while start < last_date {
        let end = start
            .checked_add_days(Days::new(Api::MAX_DAYS_PER_REQUEST))
            .context("interval end is out of range")?
            .min(last_date);
        ranges.push((start, end));
        start = end;
    }
    Ok(ranges)
}

/// Aggregate the readings of the complete hours within the interval.
///
/// The interval bounds are rounded down to the hour, so that a partially covered hour
/// never overwrites the complete one.
fn whole_hours_within(interval: Interval, mut readings: Vec<MeterReading>) -> Vec<MeterReading> {
    let interval = Interval::new(start_of_hour(interval.start), start_of_hour(interval.end));
    readings.retain(|reading| interval.contains(reading.timestamp));
    aggregate_hourly(readings)
}

/// Sum up the readings per hour of their start time.
#[must_use]
pub fn aggregate_hourly(readings: Vec<MeterReading>) -> Vec<MeterReading> {
    let chunks = readings
        .into_iter()
        .sorted_by_key(|reading| reading.timestamp)
        .chunk_by(|reading| start_of_hour(reading.timestamp));
    chunks
        .into_iter()
        .map(|(hour, readings)| {
            MeterReading::new(hour, readings.map(|reading| reading.energy).sum::<KilowattHours>())
        })
        .collect()
}

fn start_of_hour(timestamp: DateTime<Local>) -> DateTime<Local> {
    timestamp
        .with_minute(0)
        .and_then(|timestamp| timestamp.with_second(0))
        .and_then(|timestamp| timestamp.with_nanosecond(0))
        .unwrap_or(timestamp)
}

/// Parse the ISO 8601 interval length, such as `PT30M`.
fn parse_interval_length(value: &str) -> Result<TimeDelta> {
    let length = value
        .strip_prefix("PT")
        .with_context(|| format!("unsupported interval length `{value}`"))?;
    let interval_length = if let Some(minutes) = length.strip_suffix('M') {
        TimeDelta::minutes(minutes.parse()?)
    } else if let Some(hours) = length.strip_suffix('H') {
        TimeDelta::hours(hours.parse()?)
    } else {
        bail!("unsupported interval length `{value}`");
    };
    ensure!(interval_length > TimeDelta::zero(), "interval length `{value}` must be positive");
    Ok(interval_length)
}

#[derive(Deserialize)]
struct LoadCurveResponse {
    meter_reading: LoadCurve,
}

#[derive(Deserialize)]
struct LoadCurve {
    reading_type: ReadingType,

    #[serde(rename = "interval_reading")]
    intervals: Vec<IntervalReading>,
}

impl LoadCurve {
    /// Convert the average power readings into energy readings starting at the interval start.
    fn try_into_readings(self) -> Result<Vec<MeterReading>> {
        ensure!(
            self.reading_type.unit == "W",
            "unsupported load curve unit `{}`",
            self.reading_type.unit
        );
        let default_length = self.reading_type.measuring_period.as_deref().unwrap_or("PT30M");
        let mut readings = Vec::with_capacity(self.intervals.len());
        let mut previous_end = None;
        for interval in self.intervals {
            let length = parse_interval_length(
                interval.interval_length.as_deref().unwrap_or(default_length),
            )?;
            let Some(end) =
                resolve_local(interval.date.and_local_timezone(Local), previous_end.as_ref())
            else {
                warn!(date = %interval.date, "non-existent local time, skipped");
                continue;
            };
            previous_end = Some(end);
            let energy = Kilowatts::from_watts(interval.value) * length;
            readings.push(MeterReading::new(end - length, energy));
        }
        Ok(readings)
    }
}

/// Resolve the local interval end within the chronological sequence.
///
/// A repeated local time maps onto the later instant once the sequence has reached the earlier one.
fn resolve_local<Tz: TimeZone>(
    mapped: MappedLocalTime<DateTime<Tz>>,
    previous: Option<&DateTime<Tz>>,
) -> Option<DateTime<Tz>> {
    match mapped {
        MappedLocalTime::Single(end) => Some(end),
        MappedLocalTime::Ambiguous(earliest, latest) => {
            let end = if previous.is_some_and(|previous| *previous >= earliest) {
                latest
            } else {
                earliest
            };
            debug!(end = ?end, "resolved the repeated local time");
            Some(end)
        }
        MappedLocalTime::None => None,
    }
}

#[derive(Deserialize)]
struct ReadingType {
    unit: String,

    #[serde(default)]
    measuring_period: Option<String>,
}

/// Average power over the interval which *ends* at the date.
#[serde_as]
#[derive(Deserialize)]
struct IntervalReading {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    value: f64,

    #[serde(deserialize_with = "deserialize_date_time")]
    date: NaiveDateTime,

    #[serde(default)]
    interval_length: Option<String>,
}

fn deserialize_date_time<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveDateTime, D::Error> {
    let value = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M:%S").map_err(|_| {
        <D::Error as de::Error>::invalid_value(
            de::Unexpected::Str(&value),
            &"a date as YYYY-MM-DD HH:MM:SS",
        )
    })
}
