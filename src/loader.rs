use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::domain::TableError;
use crate::record::{Field, FieldKind, Record, Value};

#[derive(Debug, PartialEq)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// Load service records from a csv, parquet or arrow file.
///
/// The file needs one column per schema field, named like the field. Extra
/// columns are ignored. Interfaces are `;`-separated text, parquet and arrow
/// files may also hold them as a list of strings.
#[instrument]
pub fn load_records(path: PathBuf) -> Result<Vec<Record>, TableError> {
    let file_info = get_file_info(path)?;
    debug!("Loading {:?}", file_info);
    let frame = match file_info.file_type {
        FileType::CSV => load_csv(&file_info.path)?,
        FileType::PARQUET => load_parquet(&file_info.path)?,
        FileType::ARROW => load_arrow(&file_info.path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;

    // Each field is extracted in its own thread.
    let columns = Field::ALL
        .par_iter()
        .map(|&field| load_column(&df, field))
        .collect::<Result<Vec<Vec<Value>>, TableError>>()?;

    let nrows = df.height();
    let mut records = vec![Record::new(); nrows];
    for (field, values) in Field::ALL.into_iter().zip(columns) {
        for (record, value) in records.iter_mut().zip(values) {
            record.set(field, value);
        }
    }

    info!(
        "Loaded {} records from {} bytes in {}ms ...",
        records.len(),
        file_info.file_size,
        start_time.elapsed().as_millis()
    );
    Ok(records)
}

fn load_column(df: &DataFrame, field: Field) -> Result<Vec<Value>, TableError> {
    let column = df
        .column(field.name())
        .map_err(|_| TableError::MissingField(field))?;
    if field.kind() == FieldKind::List && matches!(column.dtype(), DataType::List(_)) {
        return column.list()?.into_iter().map(list_value).collect();
    }

    let column = column.cast(&DataType::String)?;
    let series = column.str()?;

    series
        .into_iter()
        .map(|value| Value::parse(field, value.unwrap_or_default()))
        .collect()
}

// Parquet and arrow files may store interfaces as a native list.
fn list_value(items: Option<Series>) -> Result<Value, TableError> {
    let Some(items) = items else {
        return Ok(Value::List(Vec::new()));
    };
    let items = items.cast(&DataType::String)?;
    Ok(Value::List(
        items
            .str()?
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    ))
}

fn detect_file_type(path: &Path) -> Result<FileType, TableError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(TableError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, TableError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TableError::FileNotFound,
        ErrorKind::PermissionDenied => TableError::PermissionDenied,
        _ => TableError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TableError::LoadingFailed("Not a file!".into()));
    }

    let file_size = metadata.len();
    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size,
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    // Everything is read as text and converted per field afterwards.
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn detects_file_types_by_extension() {
        assert_eq!(detect_file_type(Path::new("a.CSV")).unwrap(), FileType::CSV);
        assert_eq!(detect_file_type(Path::new("a.pq")).unwrap(), FileType::PARQUET);
        assert_eq!(detect_file_type(Path::new("a.feather")).unwrap(), FileType::ARROW);
        assert!(matches!(
            detect_file_type(Path::new("a.xlsx")),
            Err(TableError::UnknownFileType)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            load_records(fixture("does_not_exist.csv")),
            Err(TableError::FileNotFound)
        ));
    }

    #[test]
    fn directories_are_rejected() {
        assert!(matches!(
            load_records(fixture("")),
            Err(TableError::LoadingFailed(_))
        ));
    }

    #[test]
    fn loads_typed_records_from_csv() {
        let records = load_records(fixture("services.csv")).unwrap();
        assert_eq!(records.len(), 7);

        let first = &records[0];
        assert_eq!(first.get(Field::Id), Some(&Value::Number(1.0)));
        assert_eq!(first.service_definition(), Some("temperature"));
        assert_eq!(
            first.get(Field::Interfaces),
            Some(&Value::List(vec!["HTTP-SECURE-JSON".into(), "HTTP-INSECURE-JSON".into()]))
        );
        assert_eq!(first.get(Field::Port), Some(&Value::Number(8443.0)));
        assert_eq!(first.display(Field::Udp), "false");
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("svctable-{}-{name}", std::process::id()))
    }

    fn service_frame(interfaces: Column) -> DataFrame {
        let mut df = polars::df!(
            "id" => [1i64, 2],
            "serviceDefinition" => ["temperature", "humidity"],
            "port" => [8443i64, 8444],
            "serviceURI" => ["/temperature", "/humidity"],
            "udp" => [false, true],
        )
        .unwrap();
        df.with_column(interfaces).unwrap();
        df
    }

    fn listed_interfaces() -> Column {
        Column::new(
            "interfaces".into(),
            [
                Series::new("".into(), ["HTTP-SECURE-JSON", "HTTP-INSECURE-JSON"]),
                Series::new("".into(), ["COAP"]),
            ],
        )
    }

    fn assert_services(records: &[Record]) {
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(Field::Id), Some(&Value::Number(1.0)));
        assert_eq!(records[0].service_definition(), Some("temperature"));
        assert_eq!(
            records[0].get(Field::Interfaces),
            Some(&Value::List(vec!["HTTP-SECURE-JSON".into(), "HTTP-INSECURE-JSON".into()]))
        );
        assert_eq!(records[1].get(Field::Port), Some(&Value::Number(8444.0)));
        assert_eq!(records[1].display(Field::Interfaces), "COAP");
        assert_eq!(records[1].display(Field::Udp), "true");
    }

    #[test]
    fn loads_parquet_with_list_interfaces() {
        let path = temp_file("services.parquet");
        let mut df = service_frame(listed_interfaces());
        ParquetWriter::new(fs::File::create(&path).unwrap())
            .finish(&mut df)
            .unwrap();

        let records = load_records(path.clone());
        let _ = fs::remove_file(&path);
        assert_services(&records.unwrap());
    }

    #[test]
    fn loads_arrow_with_list_interfaces() {
        let path = temp_file("services.arrow");
        let mut df = service_frame(listed_interfaces());
        IpcWriter::new(fs::File::create(&path).unwrap())
            .finish(&mut df)
            .unwrap();

        let records = load_records(path.clone());
        let _ = fs::remove_file(&path);
        assert_services(&records.unwrap());
    }

    #[test]
    fn loads_arrow_with_joined_interfaces() {
        let path = temp_file("services.feather");
        let mut df = service_frame(Column::new(
            "interfaces".into(),
            ["HTTP-SECURE-JSON;HTTP-INSECURE-JSON", "COAP"],
        ));
        IpcWriter::new(fs::File::create(&path).unwrap())
            .finish(&mut df)
            .unwrap();

        let records = load_records(path.clone());
        let _ = fs::remove_file(&path);
        assert_services(&records.unwrap());
    }

    #[test]
    fn missing_schema_column_fails() {
        assert!(matches!(
            load_records(fixture("services_without_port.csv")),
            Err(TableError::MissingField(Field::Port))
        ));
    }
}
