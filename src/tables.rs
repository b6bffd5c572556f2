use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    core::{
        offpeak::OffPeakPeriods,
        pipeline::PipelineOutput,
        point::{OutputPoint, TariffPeriod},
        tariff::ProviderTariff,
    },
    quantity::{cost::Cost, energy::KilowattHours},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

pub fn build_tariff_table(tariff: &ProviderTariff, periods: &OffPeakPeriods) -> Table {
    let mut table = new_table();
    table
        .set_header(vec![
            Cell::new("Provider").add_attribute(Attribute::Bold),
            Cell::new("Annual fee"),
            Cell::new("Power"),
            Cell::new("Flat"),
            Cell::new("Peak"),
            Cell::new("Off-peak"),
            Cell::new("Off-peak periods"),
        ])
        .add_row(vec![
            Cell::new(&tariff.name).add_attribute(Attribute::Bold),
            Cell::new(tariff.annual_fee).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} kVA", tariff.max_power)).set_alignment(CellAlignment::Right),
            Cell::new(tariff.price_per_kwh).fg(if tariff.peak_offpeak_enabled {
                Color::DarkGrey
            } else {
                Color::Reset
            }),
            Cell::new(tariff.price_per_kwh_peak).fg(if tariff.peak_offpeak_enabled {
                Color::Red
            } else {
                Color::DarkGrey
            }),
            Cell::new(tariff.price_per_kwh_offpeak).fg(if tariff.peak_offpeak_enabled {
                Color::Green
            } else {
                Color::DarkGrey
            }),
            Cell::new(if periods.is_empty() {
                "none".to_string()
            } else {
                periods.iter().join("\n")
            }),
        ]);
    table
}

pub fn build_points_table(points: &[OutputPoint]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Time", "Energy", "Period", "Price"]);
    for point in points {
        table.add_row(vec![
            Cell::new(point.timestamp.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(point.timestamp.format("%H:%M")),
            Cell::new(KilowattHours::from(point.fields.power * 0.001))
                .set_alignment(CellAlignment::Right),
            Cell::new(point.period).fg(match point.period {
                TariffPeriod::OffPeak => Color::Green,
                TariffPeriod::Peak => Color::Red,
                TariffPeriod::Normal => Color::Reset,
            }),
            Cell::new(Cost::from(point.fields.price)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_summary_table(output: &PipelineOutput, tariff: &ProviderTariff) -> Table {
    let summary = &output.summary;
    let mut table = new_table();
    table
        .set_header(vec![
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new("Peak"),
            Cell::new("Off-peak"),
            Cell::new("Price").add_attribute(Attribute::Bold),
            Cell::new("Flat price"),
            Cell::new("Peak/off-peak price"),
            Cell::new("Points"),
            Cell::new("Skipped"),
        ])
        .add_row(vec![
            Cell::new(summary.total_energy).add_attribute(Attribute::Bold),
            Cell::new(summary.total_energy_peak).fg(Color::Red),
            Cell::new(summary.total_energy_offpeak).fg(Color::Green),
            Cell::new(summary.total_price).add_attribute(Attribute::Bold),
            Cell::new(summary.flat_price(tariff)),
            Cell::new(summary.peak_offpeak_price(tariff)),
            Cell::new(output.points.len()),
            Cell::new(output.n_skipped).fg(if output.n_skipped == 0 {
                Color::Reset
            } else {
                Color::Red
            }),
        ]);
    table
}
