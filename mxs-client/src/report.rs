//! HTML and CSV reports for a finished benchmark

use crate::render::format_scientific;
use chrono::{DateTime, Utc};
use mxs_common::{BenchmarkResult, Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

pub const HTML_FILE_NAME: &str = "report.html";
pub const CSV_FILE_NAME: &str = "report.csv";

/// Values derived from a result for display
#[derive(Debug, Clone, PartialEq)]
pub struct ReportData {
    pub speedup: f64,
    pub seq_time: f64,
    pub conc_time: f64,
    pub matrix_size: usize,
    /// Cell count in millions, e.g. `"4M"`
    pub elements: String,
    pub checksum: String,
    /// Concurrent bar width as a percentage of the sequential bar
    pub conc_bar_percent: f64,
}

impl ReportData {
    pub fn from_result(result: &BenchmarkResult) -> Self {
        let n = result.total_rows;
        let conc_bar_percent = if result.seq_time > 0.0 {
            result.conc_time / result.seq_time * 100.0
        } else {
            0.0
        };

        Self {
            speedup: result.speedup,
            seq_time: result.seq_time,
            conc_time: result.conc_time,
            matrix_size: n,
            elements: format!("{}M", n.saturating_mul(n) / 1_000_000),
            checksum: format_scientific(result.checksum, 2),
            conc_bar_percent,
        }
    }
}

/// Paths of the files written by [`write_reports`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub html: PathBuf,
    pub csv: PathBuf,
}

/// Two-column `METRIC,VALUE` table
pub fn render_csv(result: &BenchmarkResult) -> Result<String> {
    let data = ReportData::from_result(result);
    write_csv_rows(&[
        ("Speedup", format!("{:.2}x", data.speedup)),
        ("Sequential Time", format!("{:.4}s", data.seq_time)),
        ("Concurrent Time", format!("{:.4}s", data.conc_time)),
        ("Matrix Size", data.matrix_size.to_string()),
        ("Total Elements", data.elements),
        ("Checksum", data.checksum),
    ])
}

fn write_csv_rows(rows: &[(&str, String)]) -> Result<String> {
    let csv_error = |e: csv::Error| Error::Internal(format!("failed to encode CSV: {}", e));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["METRIC", "VALUE"]).map_err(csv_error)?;
    for (metric, value) in rows {
        writer
            .write_record([*metric, value.as_str()])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(format!("CSV is not UTF-8: {}", e)))
}

pub fn render_html(result: &BenchmarkResult, generated_at: DateTime<Utc>) -> String {
    let data = ReportData::from_result(result);
    let version = env!("CARGO_PKG_VERSION");
    let timestamp = generated_at.format("%Y-%m-%d %H:%M:%S UTC");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Matrix Multiplication | Report</title>
    <style>
        * {{ box-sizing: border-box; }}
        body {{
            background-color: #f0f0f0;
            color: #000;
            font-family: 'Courier New', monospace;
            min-height: 100vh;
            margin: 0;
            display: flex;
            align-items: center;
            justify-content: center;
        }}
        .card {{
            background: #fff;
            width: 600px;
            max-width: 90%;
            border: 3px solid black;
            box-shadow: 15px 15px 0px rgba(0,0,0,0.15);
            padding: 40px;
            display: flex;
            flex-direction: column;
            gap: 30px;
        }}
        header {{
            border-bottom: 3px solid black;
            padding-bottom: 20px;
            text-align: center;
        }}
        h1 {{ margin: 0; font-size: 24px; text-transform: uppercase; letter-spacing: 2px; }}
        .subtitle {{ color: #666; font-size: 14px; margin-top: 5px; }}
        .hero {{ text-align: center; padding: 10px 0; }}
        .hero-label {{ font-size: 14px; color: #666; text-transform: uppercase; margin-bottom: 5px; }}
        .hero-val {{ font-size: 64px; font-weight: bold; line-height: 1; }}
        .hero-note {{ font-size: 12px; color: #666; margin-top: 10px; }}
        .viz-container {{
            display: flex;
            flex-direction: column;
            gap: 15px;
            padding: 20px;
            background: #fafafa;
            border: 1px dashed black;
        }}
        .bar-group {{ display: flex; align-items: center; gap: 15px; }}
        .bar-label {{ width: 100px; font-size: 12px; font-weight: bold; text-transform: uppercase; text-align: right; }}
        .track {{ flex-grow: 1; height: 24px; background: #eee; }}
        .fill {{ height: 100%; background: black; }}
        .time-text {{ margin-left: 10px; font-size: 14px; font-weight: bold; width: 80px; }}
        .details {{ display: grid; grid-template-columns: 1fr 1fr; gap: 10px; font-size: 14px; }}
        .row {{ display: flex; justify-content: space-between; border-bottom: 1px dotted #ccc; padding-bottom: 5px; }}
        .row span:first-child {{ color: #666; }}
        .row span:last-child {{ font-weight: bold; }}
        .footer-text {{ text-align: center; font-size: 10px; color: #999; }}
    </style>
</head>
<body>
    <div class="card">
        <header>
            <h1>System Report</h1>
            <div class="subtitle">mxs-client v{version} &bull; {timestamp}</div>
        </header>

        <div class="hero">
            <div class="hero-label">Performance Speedup</div>
            <div class="hero-val">{speedup:.2}x</div>
            <div class="hero-note">Concurrent processing was {speedup:.1} times faster</div>
        </div>

        <div class="viz-container">
            <div class="bar-group">
                <div class="bar-label">Sequential</div>
                <div class="track"><div class="fill" style="width: 100%;"></div></div>
                <div class="time-text">{seq_time:.2}s</div>
            </div>
            <div class="bar-group">
                <div class="bar-label">Concurrent</div>
                <div class="track"><div class="fill" style="width: {conc_bar:.2}%;"></div></div>
                <div class="time-text">{conc_time:.2}s</div>
            </div>
        </div>

        <div class="details">
            <div class="row"><span>Matrix Size</span><span>{n} x {n}</span></div>
            <div class="row"><span>Total Elements</span><span>{elements}</span></div>
            <div class="row"><span>Checksum</span><span>{checksum}</span></div>
            <div class="row"><span>Status</span><span>SUCCESS</span></div>
        </div>

        <div class="footer-text"><a href="{csv_file}">Download report (CSV)</a></div>
    </div>
</body>
</html>
"#,
        version = version,
        timestamp = timestamp,
        speedup = data.speedup,
        seq_time = data.seq_time,
        conc_time = data.conc_time,
        conc_bar = data.conc_bar_percent,
        n = data.matrix_size,
        elements = data.elements,
        checksum = data.checksum,
        csv_file = CSV_FILE_NAME,
    )
}

/// Write `report.html` and `report.csv` into `dir`, creating it if needed
pub fn write_reports(dir: &Path, result: &BenchmarkResult) -> Result<ReportPaths> {
    std::fs::create_dir_all(dir)?;

    let paths = ReportPaths {
        html: dir.join(HTML_FILE_NAME),
        csv: dir.join(CSV_FILE_NAME),
    };
    std::fs::write(&paths.html, render_html(result, Utc::now()))?;
    std::fs::write(&paths.csv, render_csv(result)?)?;

    info!("Reports written to {}", dir.display());
    Ok(paths)
}
