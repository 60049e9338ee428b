use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use sirius_types::BusPosition;

/// Minimal well-formed document of the feed schema; the last-resort fallback
/// body, and guaranteed to parse to zero records.
pub const EMPTY_DOCUMENT: &str = "<ArrayOfUltimoAvlViewModel></ArrayOfUltimoAvlViewModel>";

const ROOT_TAG: &str = "ArrayOfUltimoAvlViewModel";
const RECORD_TAG: &[u8] = b"UltimoAvlViewModel";

#[derive(Default)]
struct RecordBuilder {
    lat: Option<String>,
    lng: Option<String>,
    plate: Option<String>,
    vehicle_type: Option<String>,
    event: Option<String>,
    event_time: Option<String>,
}

impl RecordBuilder {
    fn set(&mut self, field: &[u8], value: String) {
        match field {
            b"Lat" => self.lat = Some(value),
            b"Lng" => self.lng = Some(value),
            b"Placa" => self.plate = Some(value),
            b"TipoVehiculo" => self.vehicle_type = Some(value),
            b"NombreEvento" => self.event = Some(value),
            b"FhEvento" => self.event_time = Some(value),
            _ => {}
        }
    }

    /// Finish the record; None when the coordinates are not finite numbers
    fn finish(self) -> Option<BusPosition> {
        let lat: f64 = self.lat.as_deref().unwrap_or("").parse().unwrap_or(f64::NAN);
        let lng: f64 = self.lng.as_deref().unwrap_or("").parse().unwrap_or(f64::NAN);
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        Some(BusPosition {
            lat,
            lng,
            plate: self.plate.unwrap_or_default(),
            vehicle_type: self.vehicle_type.unwrap_or_default(),
            event: self.event.unwrap_or_default(),
            event_time: self.event_time.unwrap_or_default(),
        })
    }
}

/// Parse vehicle positions out of the telematics feed document.
///
/// The upstream occasionally prefixes the body with log noise, so parsing
/// starts at the root element if one is present. Records with non-finite
/// coordinates are discarded.
pub fn parse_positions(xml: &str) -> Result<Vec<BusPosition>> {
    let body = match xml.find(&format!("<{ROOT_TAG}")) {
        Some(idx) => &xml[idx..],
        None => xml,
    };

    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut positions = Vec::new();
    let mut record: Option<RecordBuilder> = None;
    let mut field: Option<Vec<u8>> = None;

    loop {
        match reader.read_event().context("Malformed bus feed document")? {
            Event::Start(start) => {
                let local = start.local_name();
                if local.as_ref() == RECORD_TAG {
                    record = Some(RecordBuilder::default());
                    field = None;
                } else if record.is_some() {
                    field = Some(local.as_ref().to_vec());
                }
            }
            Event::Text(text) => {
                if let (Some(builder), Some(name)) = (record.as_mut(), field.as_ref()) {
                    let value = text
                        .unescape()
                        .context("Malformed text in bus feed document")?
                        .into_owned();
                    builder.set(name, value);
                }
            }
            Event::End(end) => {
                if end.local_name().as_ref() == RECORD_TAG {
                    if let Some(position) = record.take().and_then(RecordBuilder::finish) {
                        positions.push(position);
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ArrayOfUltimoAvlViewModel xmlns="http://schemas.datacontract.org/2004/07/Avl">
  <UltimoAvlViewModel>
    <Lat>7.113555</Lat>
    <Lng>-73.1053116</Lng>
    <Placa>RUTA02-ABC123</Placa>
    <TipoVehiculo>Bus</TipoVehiculo>
    <NombreEvento>Posicion</NombreEvento>
    <FhEvento>2026-08-30T10:00:00</FhEvento>
  </UltimoAvlViewModel>
  <UltimoAvlViewModel>
    <Lat>7.120001</Lat>
    <Lng>-73.100000</Lng>
    <Placa>RUTA1-XYZ789</Placa>
    <TipoVehiculo>Buseta</TipoVehiculo>
    <NombreEvento>Posicion</NombreEvento>
    <FhEvento>2026-08-30T10:00:05</FhEvento>
  </UltimoAvlViewModel>
  <UltimoAvlViewModel>
    <Lat>not-a-number</Lat>
    <Lng>-73.1</Lng>
    <Placa>BROKEN</Placa>
  </UltimoAvlViewModel>
</ArrayOfUltimoAvlViewModel>"#;

    #[test]
    fn test_parses_records_and_discards_non_finite() {
        let positions = parse_positions(SAMPLE).expect("Failed to parse sample");
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].plate, "RUTA02-ABC123");
        assert!((positions[0].lat - 7.113555).abs() < 1e-9);
        assert_eq!(positions[1].vehicle_type, "Buseta");
    }

    #[test]
    fn test_empty_fallback_document_parses_to_zero_records() {
        let positions = parse_positions(EMPTY_DOCUMENT).expect("fallback body must parse");
        assert!(positions.is_empty());
    }

    #[test]
    fn test_leading_noise_is_skipped() {
        let noisy = format!("2026-08-30 log line\n{SAMPLE}");
        let positions = parse_positions(&noisy).expect("Failed to parse noisy body");
        assert_eq!(positions.len(), 2);
    }

    #[test]
    fn test_truncated_document_errors() {
        let truncated = &SAMPLE[..200];
        assert!(parse_positions(truncated).is_err());
    }
}
