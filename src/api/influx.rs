//! InfluxDB 1.x HTTP write client.

use std::time::Duration;

use itertools::Itertools;
use reqwest::{Client as HttpClient, Url};

use crate::{config::InfluxConfig, core::point::OutputPoint, prelude::*};

pub struct Client {
    inner: HttpClient,
    write_url: Url,
    user: Option<String>,
    password: Option<String>,
}

impl Client {
    #[instrument(skip_all, fields(url = %config.url, database = %config.database))]
    pub fn new(config: &InfluxConfig) -> Result<Self> {
        let inner = HttpClient::builder().timeout(Duration::from_secs(30)).build()?;
        let mut write_url = Url::parse(&config.url)
            .with_context(|| format!("invalid InfluxDB URL `{}`", config.url))?;
        write_url
            .path_segments_mut()
            .map_err(|()| anyhow!("invalid InfluxDB URL `{}`", config.url))?
            .pop_if_empty()
            .push("write");
        write_url
            .query_pairs_mut()
            .append_pair("db", &config.database)
            .append_pair("precision", "s");
        Ok(Self {
            inner,
            write_url,
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Write the batch in a single request.
    #[instrument(skip_all, fields(n_points = points.len()))]
    pub async fn write(&self, points: &[OutputPoint]) -> Result {
        if points.is_empty() {
            warn!("nothing to write");
            return Ok(());
        }
        info!("pushing points to InfluxDB…");
        let mut request = self.inner.post(self.write_url.clone()).body(to_line_protocol(points));
        if let Some(user) = &self.user {
            request = request.basic_auth(user, self.password.as_ref());
        }
        request
            .send()
            .await
            .context("failed to write the points")?
            .error_for_status()
            .context("InfluxDB rejected the points")?;
        Ok(())
    }
}

/// Serialize the batch to the [line protocol][1] with second precision.
///
/// [1]: https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_reference/
#[must_use]
pub fn to_line_protocol(points: &[OutputPoint]) -> String {
    points.iter().map(to_line).join("\n")
}

fn to_line(point: &OutputPoint) -> String {
    let tags = point
        .tags()
        .into_iter()
        .sorted_unstable_by_key(|(key, _)| *key)
        .map(|(key, value)| format!("{key}={value}"))
        .join(",");
    format!(
        "{},{tags} power={},price={} {}",
        escape(&point.measurement, &['\\', ',', ' ']),
        point.fields.power,
        point.fields.price,
        point.timestamp.timestamp(),
    )
}

fn escape(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for char_ in value.chars() {
        if special.contains(&char_) {
            escaped.push('\\');
        }
        escaped.push(char_);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};

    use super::*;
    use crate::core::{
        point::{Fields, TariffPeriod},
        reading::PricedReading,
    };

    fn point(measurement: &str, is_offpeak: bool) -> OutputPoint {
        let reading = PricedReading {
            timestamp: Local.timestamp_opt(1_736_982_000, 0).unwrap(),
            energy: 1.5.into(),
            is_offpeak,
            cost: 0.3.into(),
        };
        OutputPoint::try_build(measurement, &reading, true).unwrap()
    }

    #[test]
    fn test_line_protocol() {
        assert_eq!(
            to_line_protocol(&[point("consumption", true), point("consumption", false)]),
            "consumption,heures_creuses=1,heures_normales=0,heures_pleines=0 power=1500,price=0.3 1736982000\n\
             consumption,heures_creuses=0,heures_normales=0,heures_pleines=1 power=1500,price=0.3 1736982000",
        );
    }

    #[test]
    fn test_escape_measurement() {
        let line = to_line_protocol(&[point("my consumption,total", true)]);
        assert!(line.starts_with(r"my\ consumption\,total,heures_creuses=1"));
        let line = to_line_protocol(&[point(r"linky\conso", true)]);
        assert!(line.starts_with(r"linky\\conso,heures_creuses=1"));
    }

    #[test]
    fn test_fractional_fields() {
        let point = OutputPoint {
            measurement: "consumption".to_string(),
            period: TariffPeriod::Normal,
            fields: Fields { power: 512.5, price: 0.1025 },
            timestamp: Local.timestamp_opt(1_736_982_000, 0).unwrap(),
        };
        assert!(to_line_protocol(&[point]).ends_with(" power=512.5,price=0.1025 1736982000"));
    }

    #[test]
    fn test_write_url() -> Result {
        let config = InfluxConfig {
            url: "http://influx:8086/proxy/".to_string(),
            database: "linky".to_string(),
            ..InfluxConfig::default()
        };
        let client = Client::new(&config)?;
        assert_eq!(client.write_url.as_str(), "http://influx:8086/proxy/write?db=linky&precision=s");
        Ok(())
    }
}
