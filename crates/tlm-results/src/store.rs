//! Run storage: `<root>/<run_id>/manifest.json` plus `series.csv`.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::types::{RunManifest, Series, SeriesSet};
use crate::{ResultsError, ResultsResult};

const TIME_COLUMN: &str = "time";

/// CSV with a `time` column followed by one column per series label.
pub fn write_csv<W: Write>(writer: W, set: &SeriesSet) -> ResultsResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    let mut header = vec![TIME_COLUMN.to_string()];
    header.extend(set.series.iter().map(Series::label));
    out.write_record(&header)?;
    for (row, time) in set.times.iter().enumerate() {
        let mut record = vec![time.to_string()];
        record.extend(
            set.series
                .iter()
                .map(|s| s.values.get(row).map(f64::to_string).unwrap_or_default()),
        );
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

fn malformed(message: impl Into<String>) -> ResultsError {
    ResultsError::Malformed {
        message: message.into(),
    }
}

pub fn read_csv<R: Read>(reader: R) -> ResultsResult<SeriesSet> {
    let mut input = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = input.headers()?.clone();

    let time_idx = headers
        .iter()
        .position(|h| h == TIME_COLUMN)
        .ok_or_else(|| malformed("no time column"))?;

    let mut set = SeriesSet::default();
    let mut columns = Vec::new();
    for (i, header) in headers.iter().enumerate() {
        if i == time_idx {
            continue;
        }
        let (component, port, slot) =
            Series::parse_label(header).ok_or_else(|| malformed(format!("bad column label '{header}'")))?;
        columns.push(i);
        set.series.push(Series::new(&component, &port, &slot, Vec::new()));
    }

    for record in input.records() {
        let record = record?;
        let parse = |i: usize| -> ResultsResult<f64> {
            let field = record.get(i).ok_or_else(|| malformed("short row"))?;
            field
                .trim()
                .parse::<f64>()
                .map_err(|_| malformed(format!("'{field}' is not a number")))
        };
        set.times.push(parse(time_idx)?);
        for (series, &i) in set.series.iter_mut().zip(&columns) {
            series.values.push(parse(i)?);
        }
    }
    Ok(set)
}

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Runs of a model file live next to it under `.tlm/runs`.
    pub fn for_model(model_path: &Path) -> ResultsResult<Self> {
        let model_dir = model_path.parent().ok_or_else(|| ResultsError::InvalidPath {
            message: "model path has no parent directory".to_string(),
        })?;
        Self::new(model_dir.join(".tlm").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    pub fn save_run(&self, manifest: &RunManifest, set: &SeriesSet) -> ResultsResult<PathBuf> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join("manifest.json"), manifest_json)?;

        let series_path = run_dir.join("series.csv");
        write_csv(fs::File::create(&series_path)?, set)?;
        Ok(run_dir)
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join("manifest.json");
        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(manifest_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_series(&self, run_id: &str) -> ResultsResult<SeriesSet> {
        let series_path = self.run_dir(run_id).join("series.csv");
        if !series_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        read_csv(fs::File::open(series_path)?)
    }

    /// Manifests of stored runs of `model_name`, oldest first.
    pub fn list_runs(&self, model_name: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        if !self.root_dir.exists() {
            return Ok(runs);
        }
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id)
                    && manifest.model_name == model_name
                {
                    runs.push(manifest);
                }
            }
        }
        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_keeps_labels_and_values() {
        let set = SeriesSet {
            times: vec![0.0, 0.5, 1.0],
            series: vec![
                Series::new("mass", "P2", "Position", vec![0.0, -0.1, -0.2]),
                Series::new("sub/clock", "out", "Value", vec![0.0, 0.5, 1.0]),
            ],
        };
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &set).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("time,mass.P2.Position,sub/clock.out.Value"));
        assert_eq!(read_csv(buffer.as_slice()).unwrap(), set);
    }

    #[test]
    fn csv_without_time_column_is_rejected() {
        let text = "t,mass.P2.x\n0,1\n";
        assert!(matches!(
            read_csv(text.as_bytes()),
            Err(ResultsError::Malformed { .. })
        ));
        let text = "time,mass\n0,1\n";
        assert!(read_csv(text.as_bytes()).is_err());
        let text = "time,mass.P2.x\n0,abc\n";
        assert!(read_csv(text.as_bytes()).is_err());
    }
}
