// src/catalog/tables.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A sampling interval that changed at a known instant.
///
/// `transition_datetime_interval_end` is the first interval-end (market time)
/// sampled at `frequency_minutes_after`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableFrequency {
    pub frequency_minutes_before: u32,
    pub frequency_minutes_after: u32,
    pub transition_datetime_interval_end: NaiveDateTime,
}

/// Native resolution of a table, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frequency {
    Fixed(u32),
    Variable(VariableFrequency),
}

impl Frequency {
    /// Interval length for a row whose interval ends at `interval_end`.
    pub fn minutes_at(&self, interval_end: NaiveDateTime) -> u32 {
        match self {
            Frequency::Fixed(minutes) => *minutes,
            Frequency::Variable(v) if interval_end >= v.transition_datetime_interval_end => {
                v.frequency_minutes_after
            }
            Frequency::Variable(v) => v.frequency_minutes_before,
        }
    }
}

/// One MMSDM table as published on the NEMWeb archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Logical name, unique within a catalog (`trading-price`).
    pub name: String,
    /// Remote table identifier (`TRADINGPRICE`, `PREDISPATCHPRICE#ALL#FILE01`).
    pub table: String,
    /// Archive directory segment (`DATA`, `PREDISP_ALL_DATA`).
    pub directory: String,
    #[serde(default)]
    pub datetime_columns: Option<Vec<String>>,
    #[serde(default)]
    pub interval_column: Option<String>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    /// Identifier used before the 2024-08 naming cutover, when it differs.
    #[serde(default)]
    pub legacy_table: Option<String>,
}

impl TableDescriptor {
    fn new(name: &str, table: &str, directory: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            directory: directory.to_string(),
            datetime_columns: None,
            interval_column: None,
            frequency: None,
            legacy_table: None,
        }
    }

    fn datetimes(mut self, columns: &[&str]) -> Self {
        self.datetime_columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    fn interval(mut self, column: &str, frequency: Frequency) -> Self {
        self.interval_column = Some(column.to_string());
        self.frequency = Some(frequency);
        self
    }

    fn legacy(mut self, table: &str) -> Self {
        self.legacy_table = Some(table.to_string());
        self
    }

    /// Datetime columns, empty when the table declares none.
    pub fn datetime_columns(&self) -> &[String] {
        self.datetime_columns.as_deref().unwrap_or_default()
    }
}

/// Interval-end of the first 5-minute trading interval (five minute settlement).
pub fn five_minute_settlement_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 10, 1)
        .and_then(|d| d.and_hms_opt(0, 5, 0))
        .expect("2021-10-01 00:05 is a valid datetime")
}

/// The MMSDM tables this crate knows about out of the box.
pub fn builtin_tables() -> Vec<TableDescriptor> {
    vec![
        TableDescriptor::new("dispatch-price", "DISPATCHPRICE", "DATA")
            .datetimes(&["SETTLEMENTDATE"])
            .interval("SETTLEMENTDATE", Frequency::Fixed(5)),
        TableDescriptor::new("predispatch", "PREDISPATCHPRICE#ALL#FILE01", "PREDISP_ALL_DATA")
            .datetimes(&["LASTCHANGED", "DATETIME"])
            .interval("DATETIME", Frequency::Fixed(30))
            .legacy("PREDISPATCHPRICE"),
        TableDescriptor::new("unit-scada", "DISPATCH_UNIT_SCADA", "DATA")
            .datetimes(&["LASTCHANGED", "SETTLEMENTDATE"])
            .interval("SETTLEMENTDATE", Frequency::Fixed(5)),
        TableDescriptor::new("trading-price", "TRADINGPRICE", "DATA")
            .datetimes(&["SETTLEMENTDATE"])
            .interval(
                "SETTLEMENTDATE",
                Frequency::Variable(VariableFrequency {
                    frequency_minutes_before: 30,
                    frequency_minutes_after: 5,
                    transition_datetime_interval_end: five_minute_settlement_start(),
                }),
            ),
        TableDescriptor::new("demand", "DISPATCHREGIONSUM", "DATA")
            .datetimes(&["LASTCHANGED", "SETTLEMENTDATE"])
            .interval("SETTLEMENTDATE", Frequency::Fixed(5)),
        TableDescriptor::new("interconnectors", "DISPATCHINTERCONNECTORRES", "DATA")
            .datetimes(&["LASTCHANGED", "SETTLEMENTDATE"])
            .interval("SETTLEMENTDATE", Frequency::Fixed(5)),
        TableDescriptor::new("p5min", "P5MIN_REGIONSOLUTION_ALL#ALL#FILE01", "P5MIN_ALL_DATA")
            .datetimes(&["RUN_DATETIME", "INTERVAL_DATETIME", "LASTCHANGED"])
            .interval("INTERVAL_DATETIME", Frequency::Fixed(5))
            .legacy("P5MIN_REGIONSOLUTION_ALL"),
        TableDescriptor::new(
            "predispatch-sensitivities",
            "PREDISPATCHPRICESENSITIVITIE_D",
            "DATA",
        )
        .datetimes(&["LASTCHANGED", "DATETIME"])
        .interval("DATETIME", Frequency::Fixed(30)),
        TableDescriptor::new(
            "predispatch-demand",
            "PREDISPATCHREGIONSUM#ALL#FILE01",
            "PREDISP_ALL_DATA",
        )
        .datetimes(&["LASTCHANGED", "DATETIME"])
        .interval("DATETIME", Frequency::Fixed(30))
        .legacy("PREDISPATCHREGIONSUM"),
    ]
}
