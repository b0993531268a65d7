//! Detailed per-unit performance reports.
//!
//! One row is produced per reporting period. Consecutive dry periods
//! collapse to their first and last rows: the first is written when the
//! unit turns dry, and the last is held back and only written once the
//! unit turns wet again or the report is finished.

use std::io::Write;

use jiff::civil::DateTime;
use sluice_core::UnitSystem;
use thiserror::Error;

use crate::LidUnit;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write LID report")]
    Io(#[from] std::io::Error),
}

/// Writes fixed-width performance rows for one LID unit.
#[derive(Debug)]
pub struct LidReporter<W: Write> {
    writer: W,
    units: UnitSystem,
    dry_periods: usize,
    pending: String,
}

impl<W: Write> LidReporter<W> {
    /// Creates a reporter that writes to `writer` in `units`.
    pub fn new(writer: W, units: UnitSystem) -> Self {
        Self {
            writer,
            units,
            dry_periods: 0,
            pending: String::new(),
        }
    }

    /// Writes the report title and column headings.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] if writing fails.
    pub fn write_header(&mut self, unit_name: &str, subcatchment: &str) -> Result<(), ReportError> {
        let (rate, depth) = match self.units {
            UnitSystem::Us => ("in/hr", "in"),
            UnitSystem::Si => ("mm/hr", "mm"),
        };

        writeln!(
            self.writer,
            "LID performance report for {unit_name} in subcatchment {subcatchment}"
        )?;
        writeln!(
            self.writer,
            "{:>20}\t {:>8}\t {:>8}\t {:>8}\t {:>8}\t {:>8}\t {:>8}\t {:>8}\t \
             {:>8}\t {:>8}\t {:>8}\t {:>8}\t {:>8}\t {:>8}",
            "Date Time",
            "Elapsed",
            "Inflow",
            "Evap",
            "Infil",
            "PavePerc",
            "SoilPerc",
            "Exfil",
            "Runoff",
            "Drain",
            "SurfDep",
            "PaveDep",
            "SoilMois",
            "StorDep",
        )?;
        writeln!(
            self.writer,
            "{:>20}\t {:>8}\t {rate:>8}\t {rate:>8}\t {rate:>8}\t {rate:>8}\t {rate:>8}\t \
             {rate:>8}\t {rate:>8}\t {rate:>8}\t {depth:>8}\t {depth:>8}\t {:>8}\t {depth:>8}",
            "", "hours", "fraction",
        )?;
        Ok(())
    }

    /// Reports the unit's most recent step.
    ///
    /// Returns true if the unit was dry over the step.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] if writing fails.
    pub fn record(
        &mut self,
        timestamp: DateTime,
        elapsed_hours: f64,
        unit: &LidUnit,
    ) -> Result<bool, ReportError> {
        let fluxes = unit.fluxes();
        let state = unit.state();
        let is_dry = fluxes.is_dry();

        // The held-back row closes a dry streak.
        if !is_dry && self.dry_periods > 1 {
            self.writer.write_all(self.pending.as_bytes())?;
        }

        let rate = self.units.rainfall();
        let depth = self.units.rain_depth();
        self.pending = format!(
            "{:>20}\t {:8.3}\t {:8.3}\t {:8.4}\t {:8.3}\t {:8.3}\t {:8.3}\t {:8.3}\t \
             {:8.3}\t {:8.3}\t {:8.3}\t {:8.3}\t {:8.3}\t {:8.3}\n",
            timestamp.strftime("%m/%d/%Y %H:%M:%S").to_string(),
            elapsed_hours,
            fluxes.surface_inflow * rate,
            fluxes.total_evap() * rate,
            fluxes.surface_infil * rate,
            fluxes.pave_perc * rate,
            fluxes.soil_perc * rate,
            fluxes.storage_exfil * rate,
            fluxes.surface_outflow * rate,
            fluxes.storage_drain * rate,
            state.surface_depth * depth,
            state.pave_depth * depth,
            state.soil_moisture,
            state.storage_depth * depth,
        );

        if is_dry {
            if self.dry_periods == 0 {
                self.writer.write_all(self.pending.as_bytes())?;
            }
            self.dry_periods += 1;
        } else {
            self.writer.write_all(self.pending.as_bytes())?;
            self.dry_periods = 0;
        }

        Ok(is_dry)
    }

    /// Writes any held-back row, flushes, and returns the writer.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] if writing or flushing fails.
    pub fn finish(mut self) -> Result<W, ReportError> {
        if self.dry_periods > 1 {
            self.writer.write_all(self.pending.as_bytes())?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;
    use sluice_core::RoutingStep;

    use crate::{Forcing, LidDesign, LidKind, LidProcess, StorageLayer};

    fn barrel() -> (LidProcess, LidUnit) {
        let design = LidDesign {
            storage: StorageLayer {
                thickness: 3.0,
                void_frac: 1.0,
                ..StorageLayer::default()
            },
            ..LidDesign::default()
        };
        let process = LidProcess::new("barrel", LidKind::RainBarrel, design).unwrap();
        let unit = LidUnit::new(&process, 10.0, 0.0, 0.0).unwrap();
        (process, unit)
    }

    fn rows(report: &[u8]) -> Vec<String> {
        String::from_utf8(report.to_vec())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn collapses_dry_streaks() {
        let (process, mut unit) = barrel();
        let step = RoutingStep::from_seconds(3600.0).unwrap();
        let start = date(2024, 6, 1).at(0, 0, 0, 0);
        let mut reporter = LidReporter::new(Vec::new(), UnitSystem::Us);

        // wet, dry, dry, dry, wet
        let inflows = [1.0e-6, 0.0, 0.0, 0.0, 1.0e-6];
        let mut dry = Vec::new();
        for (hour, inflow) in inflows.into_iter().enumerate() {
            let forcing = Forcing {
                inflow,
                ..Forcing::default()
            };
            unit.get_outflow(&process, &forcing, step).unwrap();
            let timestamp = start + jiff::Span::new().hours(hour as i64);
            dry.push(reporter.record(timestamp, hour as f64, &unit).unwrap());
        }

        assert_eq!(dry, [false, true, true, true, false]);

        let report = reporter.finish().unwrap();
        let rows = rows(&report);

        // The first and last dry hours are kept; the middle one is dropped.
        assert_eq!(rows.len(), 4);
        assert!(rows[0].contains("06/01/2024 00:00:00"));
        assert!(rows[1].contains("06/01/2024 01:00:00"));
        assert!(rows[2].contains("06/01/2024 03:00:00"));
        assert!(rows[3].contains("06/01/2024 04:00:00"));
    }

    #[test]
    fn finish_flushes_a_trailing_dry_streak() {
        let (process, mut unit) = barrel();
        let step = RoutingStep::from_seconds(3600.0).unwrap();
        let start = date(2024, 6, 1).at(0, 0, 0, 0);
        let mut reporter = LidReporter::new(Vec::new(), UnitSystem::Si);

        for hour in 0..3 {
            unit.get_outflow(&process, &Forcing::default(), step).unwrap();
            let timestamp = start + jiff::Span::new().hours(hour);
            reporter.record(timestamp, hour as f64, &unit).unwrap();
        }

        let rows = rows(&reporter.finish().unwrap());
        assert_eq!(rows.len(), 2);
        assert!(rows[1].contains("06/01/2024 02:00:00"));
    }

    #[test]
    fn header_names_units() {
        let mut reporter = LidReporter::new(Vec::new(), UnitSystem::Si);
        reporter.write_header("cell", "S1").unwrap();

        let text = String::from_utf8(reporter.finish().unwrap()).unwrap();
        assert!(text.starts_with("LID performance report for cell in subcatchment S1"));
        assert!(text.contains("mm/hr"));
    }
}
