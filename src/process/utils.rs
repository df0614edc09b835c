// src/process/utils.rs
use arrow::datatypes::DataType;

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Float64 when every non-empty value parses as a number, Utf8 otherwise
/// (including all-empty columns).
pub fn infer_arrow_dtype<'a>(values: impl IntoIterator<Item = &'a str>) -> DataType {
    let mut any = false;
    for v in values {
        let v = clean_str(v);
        if v.is_empty() {
            continue;
        }
        if v.parse::<f64>().is_err() {
            return DataType::Utf8;
        }
        any = true;
    }
    if any {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}
