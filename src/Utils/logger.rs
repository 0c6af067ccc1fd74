use chrono::Local;
use csv::Writer;
use log::info;
use nalgebra::{DMatrix, DVector};
use simplelog::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// `off`, `error`, `warn`, `info` or `debug` (any case).
pub fn parse_loglevel(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        _ => None,
    }
}

/// Terminal logger plus, when `log_dir` is given, a `log_<date>_<time>.txt` file in it.
/// Returns the log file path. A logger installed earlier in the process is kept.
pub fn init_logger(level: LevelFilter, log_dir: Option<&Path>) -> std::io::Result<Option<PathBuf>> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    let mut log_file = None;
    if let Some(dir) = log_dir {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = dir.join(format!("log_{}.txt", date_and_time));
        loggers.push(WriteLogger::new(level, Config::default(), File::create(&path)?));
        log_file = Some(path);
    }
    if CombinedLogger::init(loggers).is_ok() {
        info!("logger initialised at level {}", level);
    }
    Ok(log_file)
}

/// Writes `arg, headers...` followed by one row per mesh point.
pub fn save_matrix_to_csv(
    matrix: &DMatrix<f64>,
    headers: &[String],
    filename: &Path,
    x_mesh: &DVector<f64>,
    arg: &str,
) -> Result<(), csv::Error> {
    let mut writer = Writer::from_path(filename)?;
    let mut headers_with_x = vec![arg.to_string()];
    headers_with_x.extend(headers.iter().cloned());
    writer.write_record(&headers_with_x)?;

    for (i, row) in matrix.row_iter().enumerate() {
        let mut row_data = vec![x_mesh[i].to_string()];
        row_data.extend(row.iter().map(|val| val.to_string()));
        writer.write_record(&row_data)?;
    }
    writer.flush()?;
    info!("saved {} rows to {}", matrix.nrows(), filename.display());
    Ok(())
}

/// Writes an already formatted table.
pub fn save_table_to_csv(filename: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<(), csv::Error> {
    let mut writer = Writer::from_path(filename)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    info!("saved {} rows to {}", rows.len(), filename.display());
    Ok(())
}
