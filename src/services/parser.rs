// src/services/parser.rs

//! Feed parsing service.
//!
//! The feed's XML layout has drifted before, so parsing runs an ordered list
//! of strategies: a typed deserialize against the known element layout first,
//! then a permissive scan that accepts any element whose name contains
//! `INCIDENT`. The first strategy to yield a document wins; the aggregate
//! failure is reported only when all are exhausted.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Incident;

/// Alternate tag spellings for each incident field, uppercased and
/// namespace-stripped. The first present tag wins.
const ID_TAGS: &[&str] = &["INCIDENTNUMBER", "INCIDENTNUM", "ID"];
const TIME_TAGS: &[&str] = &["DATETIME", "DATE", "TIME"];
const CALL_TYPE_TAGS: &[&str] = &["CALLTYPE", "TYPE", "DESCRIPTION"];
const LOCATION_TAGS: &[&str] = &["INCIDENTLOCATION", "LOCATION", "ADDRESS"];
const DISTRICT_TAGS: &[&str] = &["DISTRICT", "ZONE"];
const STATUS_TAGS: &[&str] = &["STATUS"];

/// A single parse attempt: a name for diagnostics plus the parse function.
struct Strategy {
    name: &'static str,
    run: fn(&str) -> std::result::Result<Vec<Incident>, String>,
}

const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "typed",
        run: parse_typed,
    },
    Strategy {
        name: "scan",
        run: parse_scan,
    },
];

/// Parse a feed document into incidents, preserving feed order.
///
/// A well-formed document that currently lists no calls is `Ok` with an
/// empty vec; the caller decides whether that deserves a warning. An error
/// means every strategy rejected the document.
pub fn parse_feed(xml: &str) -> Result<Vec<Incident>> {
    let mut failures = Vec::new();

    for strategy in STRATEGIES {
        match (strategy.run)(xml) {
            Ok(incidents) => {
                if !failures.is_empty() {
                    log::debug!(
                        "Parse strategy '{}' accepted the feed after [{}]",
                        strategy.name,
                        failures.join("; ")
                    );
                }
                return Ok(incidents);
            }
            Err(message) => failures.push(format!("{}: {}", strategy.name, message)),
        }
    }

    Err(AppError::parse(failures.join("; ")))
}

// --- Strategy 1: typed deserialize ---

/// Known field layout of an incident element.
#[derive(Debug, Deserialize)]
struct RawIncident {
    #[serde(rename = "IncidentNumber")]
    incident_number: Option<String>,
    #[serde(rename = "IncidentNum")]
    incident_num: Option<String>,
    #[serde(rename = "DateTime")]
    date_time: Option<String>,
    #[serde(rename = "CallType")]
    call_type: Option<String>,
    #[serde(rename = "IncidentLocation")]
    location: Option<String>,
    #[serde(rename = "District")]
    district: Option<String>,
    #[serde(rename = "Status")]
    status: Option<String>,
}

/// Document root with repeated incident children. Unrecognized extra
/// elements and attributes are ignored.
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "INCIDENT", default)]
    incidents: Vec<RawIncident>,
}

fn parse_typed(xml: &str) -> std::result::Result<Vec<Incident>, String> {
    let document: RawDocument = quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;
    if document.incidents.is_empty() {
        // Hand an unexpected layout to the permissive strategy.
        return Err("no INCIDENT elements under the document root".into());
    }
    let found = document.incidents.len();
    let incidents: Vec<Incident> = document
        .incidents
        .into_iter()
        .filter_map(raw_into_incident)
        .collect();
    if incidents.is_empty() {
        // The scan strategy knows more identifier spellings.
        return Err(format!("{found} INCIDENT elements, none with a recognized identifier"));
    }
    Ok(incidents)
}

fn raw_into_incident(raw: RawIncident) -> Option<Incident> {
    let id = non_empty(raw.incident_number).or_else(|| non_empty(raw.incident_num));
    let Some(id) = id else {
        log::debug!("Skipping incident element with no identifier");
        return None;
    };
    Some(Incident {
        id,
        time: non_empty(raw.date_time),
        call_type: non_empty(raw.call_type),
        location: non_empty(raw.location),
        district: non_empty(raw.district),
        status: non_empty(raw.status),
    })
}

// --- Strategy 2: permissive element scan ---

/// Walk the document and collect the text children of every element whose
/// local name contains `INCIDENT`, mapping recognized child tags onto
/// incident fields.
fn parse_scan(xml: &str) -> std::result::Result<Vec<Incident>, String> {
    let mut reader = Reader::from_str(xml);

    let mut incidents = Vec::new();
    let mut saw_element = false;
    let mut fields: Option<HashMap<String, String>> = None;
    let mut current_tag: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                saw_element = true;
                let name = local_name(start.local_name().as_ref());
                if fields.is_some() {
                    current_tag = Some(name);
                } else if name.contains("INCIDENT") {
                    fields = Some(HashMap::new());
                }
            }
            Ok(Event::Text(text)) => {
                if let (Some(map), Some(tag)) = (fields.as_mut(), current_tag.as_ref()) {
                    let value = text.unescape().map_err(|e| e.to_string())?;
                    append_field(map, tag, value.trim());
                }
            }
            Ok(Event::CData(data)) => {
                if let (Some(map), Some(tag)) = (fields.as_mut(), current_tag.as_ref()) {
                    let data = data.into_inner();
                    let value = String::from_utf8_lossy(&data);
                    append_field(map, tag, value.trim());
                }
            }
            Ok(Event::End(end)) => {
                let name = local_name(end.local_name().as_ref());
                if current_tag.as_deref() == Some(name.as_str()) {
                    current_tag = None;
                } else if name.contains("INCIDENT") {
                    if let Some(map) = fields.take() {
                        if let Some(incident) = fields_into_incident(map) {
                            incidents.push(incident);
                        }
                    }
                }
            }
            Ok(Event::Empty(_)) => saw_element = true,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }

    if !saw_element {
        return Err("document contains no XML elements".into());
    }
    Ok(incidents)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_uppercase()
}

fn append_field(map: &mut HashMap<String, String>, tag: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let entry = map.entry(tag.to_string()).or_default();
    if !entry.is_empty() {
        entry.push(' ');
    }
    entry.push_str(value);
}

fn fields_into_incident(mut fields: HashMap<String, String>) -> Option<Incident> {
    let Some(id) = take_field(&mut fields, ID_TAGS) else {
        log::debug!("Skipping incident element with no identifier");
        return None;
    };
    Some(Incident {
        id,
        time: take_field(&mut fields, TIME_TAGS),
        call_type: take_field(&mut fields, CALL_TYPE_TAGS),
        location: take_field(&mut fields, LOCATION_TAGS),
        district: take_field(&mut fields, DISTRICT_TAGS),
        status: take_field(&mut fields, STATUS_TAGS),
    })
}

fn take_field(fields: &mut HashMap<String, String>, tags: &[&str]) -> Option<String> {
    tags.iter().find_map(|tag| fields.remove(*tag))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
