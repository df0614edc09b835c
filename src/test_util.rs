// src/test_util.rs
//! Fixtures shared by the unit tests: an in-memory transport and MMSDM payload builders.

use anyhow::{bail, Result};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    io::{Cursor, Write},
    time::Duration,
};
use url::Url;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::fetch::{Fetched, Transport};

/// Serves archives registered with `publish`; everything else is a 404.
#[derive(Default)]
pub struct MemoryTransport {
    files: RefCell<HashMap<String, Vec<u8>>>,
    fetches: Cell<usize>,
    probes: Cell<usize>,
    probe_error: Cell<bool>,
}

impl MemoryTransport {
    pub fn publish(&self, url: &str, body: Vec<u8>) {
        self.files.borrow_mut().insert(url.to_string(), body);
    }

    /// Make every HEAD probe fail at the connection level.
    pub fn break_probes(&self) {
        self.probe_error.set(true);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }

    pub fn probes(&self) -> usize {
        self.probes.get()
    }

    pub fn requests(&self) -> usize {
        self.fetches() + self.probes()
    }
}

impl Transport for MemoryTransport {
    fn probe(&self, url: &Url, _timeout: Duration) -> Result<bool> {
        self.probes.set(self.probes.get() + 1);
        if self.probe_error.get() {
            bail!("connection reset probing {}", url);
        }
        Ok(self.files.borrow().contains_key(url.as_str()))
    }

    fn fetch(&self, url: &Url, out: &mut dyn Write) -> Result<Fetched> {
        self.fetches.set(self.fetches.get() + 1);
        match self.files.borrow().get(url.as_str()) {
            Some(body) => {
                out.write_all(body)?;
                Ok(Fetched::Complete {
                    bytes: body.len() as u64,
                })
            }
            None => Ok(Fetched::Missing { status: 404 }),
        }
    }
}

/// A single-entry ZIP archive.
pub fn zip_bytes(name: &str, content: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

/// An MMSDM CSV: `C` row, `I` row with `columns`, one `D` row per entry, `C` footer.
pub fn mmsdm_csv(report: (&str, &str), columns: &[&str], rows: &[Vec<&str>]) -> String {
    let (kind, sub) = report;
    let mut out = format!(
        "C,NEMP.WORLD,{kind}{sub},AEMO,PUBLIC,2020/02/03,09:00:01,0000000319487311,,0000000319487307\n"
    );
    out.push_str(&format!("I,{kind},{sub},1,{}\n", columns.join(",")));
    for row in rows {
        let fields: Vec<String> = row
            .iter()
            .map(|v| {
                if v.contains('/') {
                    format!("\"{v}\"")
                } else {
                    v.to_string()
                }
            })
            .collect();
        out.push_str(&format!("D,{kind},{sub},1,{}\n", fields.join(",")));
    }
    out.push_str(&format!("C,\"END OF REPORT\",{}\n", rows.len() + 3));
    out
}

/// A TRADINGPRICE payload with one NSW1 row per settlement date.
pub fn trading_price_csv(settlement_dates: &[&str]) -> String {
    let rows: Vec<Vec<&str>> = settlement_dates
        .iter()
        .map(|d| vec![*d, "1", "NSW1", "1", "50.25", "2020/01/01 00:00:00"])
        .collect();
    mmsdm_csv(
        ("TRADING", "PRICE"),
        &["SETTLEMENTDATE", "RUNNO", "REGIONID", "PERIODID", "RRP", "LASTCHANGED"],
        &rows,
    )
}
