//! Output rendering: text table, JSON and CSV.

use std::io::Write;

use churn_models::simulation::CustomerHistory;
use churn_projection::{EnsembleSummary, ProjectionTable};
use churn_valuation::ValueTable;
use clap::ValueEnum;
use serde::Serialize;

use crate::Result;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Anything that can be laid out as a header plus string records.
pub trait Tabular {
    fn header(&self) -> Vec<String>;

    fn records(&self) -> Vec<Vec<String>>;

    /// Extra line printed under text tables only.
    fn footer(&self) -> Option<Vec<String>> {
        None
    }
}

fn with_step(states: &[String]) -> Vec<String> {
    std::iter::once("step".to_string())
        .chain(states.iter().cloned())
        .collect()
}

impl Tabular for ProjectionTable {
    fn header(&self) -> Vec<String> {
        with_step(self.states())
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows()
            .iter()
            .enumerate()
            .map(|(t, row)| {
                std::iter::once(t.to_string())
                    .chain(row.iter().map(u64::to_string))
                    .collect()
            })
            .collect()
    }
}

impl Tabular for ValueTable {
    fn header(&self) -> Vec<String> {
        with_step(self.states())
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows()
            .iter()
            .enumerate()
            .map(|(t, row)| {
                std::iter::once(t.to_string())
                    .chain(row.iter().map(|v| format!("{v:.2}")))
                    .collect()
            })
            .collect()
    }

    fn footer(&self) -> Option<Vec<String>> {
        let mut line = vec!["total".to_string()];
        for state in self.states() {
            let sum: f64 = self.column(state).ok()?.iter().sum();
            line.push(format!("{sum:.2}"));
        }
        line.push(format!("= {:.2}", self.total()));
        Some(line)
    }
}

impl Tabular for EnsembleSummary {
    fn header(&self) -> Vec<String> {
        let mut header = vec!["step".to_string()];
        for state in self.states() {
            header.push(format!("{state}_mean"));
            header.push(format!("{state}_min"));
            header.push(format!("{state}_max"));
        }
        header
    }

    fn records(&self) -> Vec<Vec<String>> {
        (0..self.mean().len())
            .map(|t| {
                let mut record = vec![t.to_string()];
                for j in 0..self.states().len() {
                    record.push(format!("{:.2}", self.mean()[t][j]));
                    record.push(self.min()[t][j].to_string());
                    record.push(self.max()[t][j].to_string());
                }
                record
            })
            .collect()
    }
}

/// Sampled state paths of individual entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectorySet {
    /// Starting state of every path
    pub start: String,
    /// One path per entity, start state excluded
    pub paths: Vec<Vec<String>>,
}

impl Tabular for TrajectorySet {
    fn header(&self) -> Vec<String> {
        let steps = self.paths.first().map_or(0, Vec::len);
        std::iter::once("entity".to_string())
            .chain((0..=steps).map(|t| format!("t{t}")))
            .collect()
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                [i.to_string(), self.start.clone()]
                    .into_iter()
                    .chain(path.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

impl Tabular for CustomerHistory {
    fn header(&self) -> Vec<String> {
        std::iter::once("customer".to_string())
            .chain((0..self.n_steps()).map(|t| format!("t{t}")))
            .collect()
    }

    // Steps before a customer arrived are left blank.
    fn records(&self) -> Vec<Vec<String>> {
        self.rows()
            .iter()
            .enumerate()
            .map(|(id, row)| {
                std::iter::once(id.to_string())
                    .chain(row.iter().map(|s| s.clone().unwrap_or_default()))
                    .collect()
            })
            .collect()
    }
}

/// Writes `value` to `out` in the requested format.
pub fn write<T>(value: &T, format: OutputFormat, out: &mut dyn Write) -> Result<()>
where
    T: Tabular + Serialize,
{
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut *out);
            writer.write_record(value.header())?;
            for record in value.records() {
                writer.write_record(record)?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => write_table(value, out)?,
    }
    Ok(())
}

fn write_table<T: Tabular>(value: &T, out: &mut dyn Write) -> std::io::Result<()> {
    let header = value.header();
    let records = value.records();
    let footer = value.footer();

    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for line in records.iter().chain(footer.iter()) {
        for (i, cell) in line.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let render = |line: &[String]| -> String {
        line.iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:>w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };
    let rule = widths
        .iter()
        .map(|&w| "-".repeat(w))
        .collect::<Vec<_>>()
        .join("  ");

    writeln!(out, "{}", render(&header))?;
    writeln!(out, "{rule}")?;
    for record in &records {
        writeln!(out, "{}", render(record))?;
    }
    if let Some(footer) = footer {
        writeln!(out, "{rule}")?;
        writeln!(out, "{}", render(&footer[..widths.len().min(footer.len())]))?;
        if let Some(grand) = footer.get(widths.len()) {
            writeln!(out, "{grand:>width$}", width = rule.len())?;
        }
    }
    Ok(())
}
