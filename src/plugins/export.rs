//! Resident roster export to interchange formats.
//!
//! Pure read-and-serialize: the roster is read once and written as JSON,
//! CSV, XML, and YAML. Credentials are excluded by construction -- the
//! `Resident` struct never carries one.

use crate::core::error::DomusError;
use crate::core::store::Store;
use crate::plugins::directory::{self, Resident};
use clap::ValueEnum;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
    Xml,
    Yaml,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Json, Self::Csv, Self::Xml, Self::Yaml];

    fn file_name(&self) -> &'static str {
        match self {
            Self::Json => "residents.json",
            Self::Csv => "residents.csv",
            Self::Xml => "residents.xml",
            Self::Yaml => "residents.yaml",
        }
    }
}

/// Export the resident roster in the given formats, returning the paths
/// written.
pub fn export_residents(
    store: &Store,
    out_dir: &Path,
    formats: &[ExportFormat],
) -> Result<Vec<PathBuf>, DomusError> {
    let residents = directory::list_residents(store)?;
    fs::create_dir_all(out_dir).map_err(DomusError::IoError)?;

    let mut written = Vec::new();
    for format in formats {
        let path = out_dir.join(format.file_name());
        match format {
            ExportFormat::Json => {
                fs::write(&path, serde_json::to_string_pretty(&residents)?)
                    .map_err(DomusError::IoError)?;
            }
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_path(&path)?;
                for resident in &residents {
                    wtr.serialize(resident)?;
                }
                wtr.flush().map_err(DomusError::IoError)?;
            }
            ExportFormat::Xml => {
                fs::write(&path, render_xml(&residents)?).map_err(DomusError::IoError)?;
            }
            ExportFormat::Yaml => {
                fs::write(&path, serde_yaml::to_string(&residents)?)
                    .map_err(DomusError::IoError)?;
            }
        }
        written.push(path);
    }
    Ok(written)
}

fn render_xml(residents: &[Resident]) -> Result<String, DomusError> {
    let xml_err = |e: &dyn std::fmt::Display| DomusError::ValidationError(format!("xml: {}", e));

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Start(BytesStart::new("residents")))
        .map_err(|e| xml_err(&e))?;

    for resident in residents {
        let fields = [
            ("id", resident.id.to_string()),
            ("given_name", resident.given_name.clone()),
            ("family_name", resident.family_name.clone()),
            ("ticket", resident.ticket.to_string()),
        ];
        writer
            .write_event(Event::Start(BytesStart::new("resident")))
            .map_err(|e| xml_err(&e))?;
        for (tag, value) in fields {
            writer
                .write_event(Event::Start(BytesStart::new(tag)))
                .map_err(|e| xml_err(&e))?;
            writer
                .write_event(Event::Text(BytesText::new(&value)))
                .map_err(|e| xml_err(&e))?;
            writer
                .write_event(Event::End(BytesEnd::new(tag)))
                .map_err(|e| xml_err(&e))?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("resident")))
            .map_err(|e| xml_err(&e))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("residents")))
        .map_err(|e| xml_err(&e))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| DomusError::ValidationError(format!("xml: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Resident> {
        vec![
            Resident {
                id: 1,
                given_name: "Alice".to_string(),
                family_name: "Ward".to_string(),
                ticket: 123456,
            },
            Resident {
                id: 2,
                given_name: "Ben".to_string(),
                family_name: "O'Hara".to_string(),
                ticket: 222333,
            },
        ]
    }

    #[test]
    fn test_render_xml_nests_fields() {
        let xml = render_xml(&sample()).unwrap();
        assert!(xml.starts_with("<residents>"));
        assert!(xml.contains("<given_name>Alice</given_name>"));
        assert!(xml.contains("<ticket>222333</ticket>"));
        assert!(xml.trim_end().ends_with("</residents>"));
    }

    #[test]
    fn test_render_xml_empty_roster() {
        let xml = render_xml(&[]).unwrap();
        assert!(xml.contains("<residents>"));
        assert!(!xml.contains("<resident>"));
    }
}
