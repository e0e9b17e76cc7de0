//! CSV output for dumped log records
//!
//! One row per record; columns not applicable to a record type are left
//! empty so every row has the full column set. The schema matches what
//! downstream survey tooling expects:
//!
//! ```text
//! unread,type,dist,heading,clino,roll,x,y,z,cal_idx,rev,ACC,MAG,dip
//! ```

use crate::device::record::{LogRecord, RecordData};
use crate::device::RecordSink;
use crate::error::Result;
use std::io::Write;

/// CSV header row
pub const CSV_HEADER: &str = "unread,type,dist,heading,clino,roll,x,y,z,cal_idx,rev,ACC,MAG,dip";

/// Writes dumped records as CSV rows
pub struct CsvReport<W: Write> {
    out: W,
}

impl<W: Write> CsvReport<W> {
    /// Create a report writer and emit the header row
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{}", CSV_HEADER)?;
        Ok(CsvReport { out })
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for CsvReport<W> {
    fn record(&mut self, record: &LogRecord) -> Result<()> {
        let hot = record.hot as u8;
        match record.data {
            RecordData::Empty => {}
            RecordData::Leg {
                distance_m,
                heading_deg,
                clino_deg,
                roll_deg,
            } => writeln!(
                self.out,
                "{},LEG,{},{},{},{}",
                hot, distance_m, heading_deg, clino_deg, roll_deg
            )?,
            RecordData::Acc { x, y, z, cal_group } => writeln!(
                self.out,
                "{},ACC,,,,,{},{},{},{}",
                hot, x, y, z, cal_group
            )?,
            RecordData::Mag { x, y, z, cal_group } => writeln!(
                self.out,
                "{},MAG,,,,,{},{},{},{}",
                hot, x, y, z, cal_group
            )?,
            RecordData::Vec {
                reverse,
                abs_g,
                abs_m,
                dip_deg,
            } => writeln!(
                self.out,
                "{},VEC,,,,,,,,,{},{},{},{}",
                hot, reverse as u8, abs_g, abs_m, dip_deg
            )?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(record: LogRecord) -> String {
        let mut report = CsvReport::new(Vec::new()).unwrap();
        report.record(&record).unwrap();
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn leg_row_fills_measurement_columns() {
        let out = render(LogRecord {
            hot: true,
            data: RecordData::Leg {
                distance_m: 12.345,
                heading_deg: 90.0,
                clino_deg: -5.5,
                roll_deg: 0.0,
            },
        });
        let row = out.lines().nth(1).unwrap();
        assert_eq!(row, "1,LEG,12.345,90,-5.5,0");
    }

    #[test]
    fn acc_row_leaves_shot_columns_empty() {
        let out = render(LogRecord {
            hot: false,
            data: RecordData::Acc {
                x: -100,
                y: 200,
                z: -300,
                cal_group: 2,
            },
        });
        let row = out.lines().nth(1).unwrap();
        assert_eq!(row, "0,ACC,,,,,-100,200,-300,2");
    }

    #[test]
    fn vec_row_uses_trailing_columns() {
        let out = render(LogRecord {
            hot: false,
            data: RecordData::Vec {
                reverse: true,
                abs_g: 1000,
                abs_m: 2000,
                dip_deg: 66.5,
            },
        });
        let row = out.lines().nth(1).unwrap();
        assert_eq!(row, "0,VEC,,,,,,,,,1,1000,2000,66.5");
    }

    #[test]
    fn empty_record_emits_no_row() {
        let out = render(LogRecord {
            hot: false,
            data: RecordData::Empty,
        });
        assert_eq!(out.lines().count(), 1); // header only
    }
}
