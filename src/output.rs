use crate::error::BatchError;
use crate::report::ResultRecord;
use std::{fs::File, io::Write, path::Path};

pub const TSV_HEADER: [&str; 3] = ["#Name", "Prediction ", "RI"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Tsv,
    Json,
}

/// Header line, then one `name<TAB>prediction  <TAB>RI` row per record.
pub fn write_tsv<W: Write>(records: &[ResultRecord], writer: W) -> Result<(), BatchError> {
    let mut tsv = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);
    tsv.write_record(TSV_HEADER)?;
    for record in records {
        let prediction = format!("{}  ", record.prediction);
        tsv.write_record([
            record.name.as_str(),
            prediction.as_str(),
            record.reliability_index.as_str(),
        ])?;
    }
    tsv.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[ResultRecord], mut writer: W) -> Result<(), BatchError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_to_path<P: AsRef<Path>>(
    records: &[ResultRecord],
    path: P,
    format: OutputFormat,
) -> Result<(), BatchError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        BatchError::String(format!(
            "Could not create output file '{}': {e}",
            path.display()
        ))
    })?;
    match format {
        OutputFormat::Tsv => write_tsv(records, file),
        OutputFormat::Json => write_json(records, file),
    }
}
