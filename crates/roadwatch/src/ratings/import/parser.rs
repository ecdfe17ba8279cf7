use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectRow {
    #[serde(rename = "Project ID")]
    pub(crate) project_id: u64,
    #[serde(rename = "Road ID")]
    pub(crate) road_code: String,
    #[serde(rename = "Road Name")]
    pub(crate) name: String,
    #[serde(rename = "Construction Date")]
    pub(crate) construction_date: String,
    #[serde(rename = "Warranty Years")]
    pub(crate) warranty_years: u32,
    #[serde(
        rename = "Warranty End Date",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) warranty_end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComplaintRow {
    #[serde(rename = "Complaint ID")]
    pub(crate) complaint_id: u64,
    #[serde(rename = "Project ID")]
    pub(crate) project_id: u64,
    #[serde(
        rename = "Damage Type",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) damage_type: Option<String>,
    #[serde(rename = "Severity", default, deserialize_with = "empty_string_as_none")]
    pub(crate) severity: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    pub(crate) status: Option<String>,
    #[serde(rename = "Created At")]
    pub(crate) created_at: String,
    #[serde(
        rename = "Description",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) description: Option<String>,
}

/// Deserialize every row, pairing it with its 1-based line number (the header is line 1).
pub(crate) fn parse_rows<T, R>(reader: R) -> Result<Vec<(usize, T)>, csv::Error>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<T>().enumerate() {
        rows.push((index + 2, record?));
    }

    Ok(rows)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (taken as midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
