use crate::domain::model::StationTable;
use crate::utils::error::{Result, SurveyError};

/// Decodes a comma-separated station file with a header row.
///
/// Fields are whitespace-trimmed; every row must have as many fields as the header.
pub fn read_table(data: &[u8]) -> Result<StationTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(SurveyError::CsvError(csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "missing header row",
        ))));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!("Read {} station rows with {} columns", rows.len(), headers.len());
    Ok(StationTable::new(headers, rows))
}

/// Encodes a table in the same format [`read_table`] accepts. No index column is written.
pub fn write_table(table: &StationTable) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }

    writer.into_inner().map_err(|e| SurveyError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gravity::correct_table;
    use crate::domain::model::{columns, CorrectionSettings};

    const RAW: &str = "Site,LatitudeUTM,LongitudeUTM,elevation,ObsGravity,Operator\n\
                       G-01,-33.45,-70.66,520.5,979412.31,\"Rivas, F.\"\n\
                       G-02,-33.47,-70.61,611.0,979398.07,\"Rivas, F.\"\n";

    #[test]
    fn test_read_table_keeps_schema() {
        let table = read_table(RAW.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.headers().len(), 6);
        assert_eq!(table.rows()[0][5], "Rivas, F.");
        assert_eq!(
            table.numeric_column(columns::ELEVATION).unwrap(),
            vec![520.5, 611.0]
        );
    }

    #[test]
    fn test_header_whitespace_is_tolerated() {
        let data = "Site, LatitudeUTM, LongitudeUTM, elevation, ObsGravity\nA, 1, 2, 3, 4\n";
        let table = read_table(data.as_bytes()).unwrap();
        assert_eq!(table.numeric_column(columns::OBSERVED_GRAVITY).unwrap(), vec![4.0]);
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let data = "Site,LatitudeUTM\nA,1,2\n";
        assert!(matches!(read_table(data.as_bytes()), Err(SurveyError::CsvError(_))));
    }

    #[test]
    fn test_corrected_values_survive_round_trip() {
        let table = read_table(RAW.as_bytes()).unwrap();
        let corrected = correct_table(&table, &CorrectionSettings::default()).unwrap();

        let encoded = write_table(&corrected).unwrap();
        let reloaded = read_table(&encoded).unwrap();

        assert_eq!(reloaded, corrected);
        for column in columns::DERIVED {
            assert_eq!(
                reloaded.numeric_column(column).unwrap(),
                corrected.numeric_column(column).unwrap()
            );
        }
    }

    #[test]
    fn test_write_table_has_no_index_column() {
        let table = read_table(RAW.as_bytes()).unwrap();
        let encoded = String::from_utf8(write_table(&table).unwrap()).unwrap();
        assert!(encoded.starts_with("Site,LatitudeUTM,LongitudeUTM,elevation,ObsGravity,Operator\n"));
    }
}
