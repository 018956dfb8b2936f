//! Sensor telemetry payloads.
//!
//! ```xml
//! <Root>
//!   <API>key</API>
//!   <Message Type="Data">
//!     <Body Type="Traffic" IntervalTime="300" DataNumber="17" Utc="7" MilliSeconds="0">
//!       <Zone ZoneId="1" Occupancy="3.2" Confidence="95" Length="4.1" HeadWay="6.5" Density="12">
//!         <Class ClassNr="1" NumVeh="12" Speed="38.5" GapTime="2.1"/>
//!       </Zone>
//!     </Body>
//!   </Message>
//!   <Image>base64</Image>
//! </Root>
//! ```
//!
//! Some gateways forward the document as a JSON string (escaped quotes,
//! wrapped in `"`), others drop the `<Root>` element. Both are accepted.

use crate::error::{Error, Result};
use crate::types::{RawClassReading, RawZoneReading, ZoneMetrics};
use log::debug;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct XmlRoot {
    #[serde(rename = "API", default)]
    api: String,
    #[serde(rename = "Message")]
    message: XmlMessage,
    #[serde(rename = "Image", default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlMessage {
    #[serde(rename = "@Type", default)]
    kind: String,
    #[serde(rename = "Body")]
    body: XmlBody,
}

#[derive(Debug, Deserialize)]
struct XmlBody {
    #[serde(rename = "@Type", default)]
    kind: String,
    #[serde(rename = "@IntervalTime", default)]
    interval_time: i64,
    #[serde(rename = "@DataNumber", default)]
    data_number: i64,
    #[serde(rename = "@Utc", default)]
    utc: String,
    #[serde(rename = "@MilliSeconds", default)]
    milliseconds: i64,
    #[serde(rename = "Zone", default)]
    zones: Vec<XmlZone>,
}

#[derive(Debug, Deserialize)]
struct XmlZone {
    #[serde(rename = "@ZoneId")]
    zone_id: u32,
    #[serde(rename = "@Occupancy", default)]
    occupancy: f64,
    #[serde(rename = "@Confidence", default)]
    confidence: f64,
    #[serde(rename = "@Length", default)]
    length: f64,
    #[serde(rename = "@HeadWay", default)]
    headway: f64,
    #[serde(rename = "@Density", default)]
    density: f64,
    #[serde(rename = "Class", default)]
    classes: Vec<XmlClass>,
}

#[derive(Debug, Deserialize)]
struct XmlClass {
    #[serde(rename = "@ClassNr")]
    class_nr: u32,
    #[serde(rename = "@NumVeh", default)]
    num_veh: u32,
    #[serde(rename = "@Speed", default)]
    speed: f64,
    #[serde(rename = "@GapTime", default)]
    gap_time: f64,
}

/// One parsed telemetry payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPayload {
    pub api_key: String,
    pub message_type: String,
    pub body_type: String,
    /// Declared measurement interval, in seconds, as sent.
    pub interval_seconds: i64,
    /// Raw `Utc` attribute; `None` when absent or blank.
    pub utc: Option<String>,
    pub data_number: i64,
    pub milliseconds: i64,
    pub zones: Vec<RawZoneReading>,
    pub image: Option<String>,
}

/// Undo JSON-string escaping and add the `<Root>` wrapper when missing.
fn clean_document(raw: &str) -> String {
    let unescaped = raw.replace("\\\"", "\"");
    let trimmed = unescaped.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed).trim();

    if trimmed.starts_with("<?xml") || trimmed.starts_with("<Root") {
        trimmed.to_string()
    } else {
        format!("<Root>{trimmed}</Root>")
    }
}

/// Parse a raw telemetry document.
///
/// # Errors
/// `Error::EmptyPayload` for blank input, `Error::Telemetry` when the
/// document is not well-formed or a numeric attribute does not parse.
pub fn parse_payload(raw: &str) -> Result<TelemetryPayload> {
    if raw.trim().is_empty() {
        return Err(Error::EmptyPayload);
    }

    let document = clean_document(raw);
    let root: XmlRoot = quick_xml::de::from_str(&document)?;
    let body = root.message.body;

    let zones: Vec<RawZoneReading> = body
        .zones
        .into_iter()
        .map(|zone| RawZoneReading {
            zone_id: zone.zone_id,
            classes: zone
                .classes
                .into_iter()
                .map(|class| RawClassReading {
                    class_nr: class.class_nr,
                    vehicles: class.num_veh,
                    avg_speed: class.speed,
                    gap_time: class.gap_time,
                })
                .collect(),
            metrics: ZoneMetrics {
                occupancy: zone.occupancy,
                density: zone.density,
                headway: zone.headway,
                confidence: zone.confidence,
                length: zone.length,
            },
        })
        .collect();

    debug!(
        "Parsed telemetry #{} with {} zones, interval {}s",
        body.data_number,
        zones.len(),
        body.interval_time
    );

    let utc = Some(body.utc.trim().to_string()).filter(|u| !u.is_empty());
    let image = root.image.filter(|i| !i.trim().is_empty());

    Ok(TelemetryPayload {
        api_key: root.api.trim().to_string(),
        message_type: root.message.kind,
        body_type: body.kind,
        interval_seconds: body.interval_time,
        utc,
        data_number: body.data_number,
        milliseconds: body.milliseconds,
        zones,
        image,
    })
}
