// Upstream XML parser
//
// Both upstream documents share one shape:
//
//   <places>
//     <place place_id="5">
//       <name>...</name> <cre_id>...</cre_id>             (stations document)
//       <location><x>-99.1</x><y>19.4</y></location>      (stations document)
//       <gas_price type="regular">22.50</gas_price>       (prices document)
//     </place>
//   </places>
//
// `<place>` elements are collected at any depth. Bad elements are skipped and
// reported as warnings; children that repeat keep their first value. Only a
// document that is not well-formed XML fails the parse.

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use super::models::{
    ExternalPriceRecord, ExternalStationRecord, ParseWarning, Parsed, RawDocument,
    UNKNOWN_FUEL_TYPE,
};
use super::ParseError;

/// Everything read from one `<place>` element
#[derive(Debug, Default)]
struct PlaceNode {
    place_id: Option<String>,
    name: Option<String>,
    cre_id: Option<String>,
    x: Option<String>,
    y: Option<String>,
    gas_prices: Vec<GasPriceNode>,
}

#[derive(Debug)]
struct GasPriceNode {
    fuel_type: Option<String>,
    value: String,
}

impl PlaceNode {
    /// Positive integer station id, or a warning describing why there is none
    fn station_id(&self) -> Result<i32, ParseWarning> {
        let raw = self.place_id.as_deref();
        raw.and_then(|v| v.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| ParseWarning::missing_station_id(raw))
    }
}

/// Leaf elements of a `<place>` whose text is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    CreId,
    X,
    Y,
    GasPrice,
}

#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    fuel_type: Option<String>,
    text: String,
}

/// Cursor inside one open `<place>` element
#[derive(Debug)]
struct PlaceCursor {
    node: PlaceNode,
    // Element names below `<place>`, innermost last
    path: Vec<Vec<u8>>,
    capture: Option<Capture>,
}

impl PlaceCursor {
    fn open(start: &BytesStart<'_>) -> quick_xml::Result<Self> {
        let node = PlaceNode {
            place_id: attribute(start, b"place_id")?,
            ..PlaceNode::default()
        };

        Ok(Self {
            node,
            path: Vec::new(),
            capture: None,
        })
    }

    fn field(&self, name: &[u8]) -> Option<Field> {
        match (self.path.as_slice(), name) {
            ([], b"name") => Some(Field::Name),
            ([], b"cre_id") => Some(Field::CreId),
            ([], b"gas_price") => Some(Field::GasPrice),
            ([parent], b"x") if parent.as_slice() == b"location" => Some(Field::X),
            ([parent], b"y") if parent.as_slice() == b"location" => Some(Field::Y),
            _ => None,
        }
    }

    fn begin_capture(&self, start: &BytesStart<'_>) -> quick_xml::Result<Option<Capture>> {
        if self.capture.is_some() {
            return Ok(None);
        }
        let Some(field) = self.field(start.local_name().as_ref()) else {
            return Ok(None);
        };

        let fuel_type = match field {
            Field::GasPrice => attribute(start, b"type")?,
            _ => None,
        };

        Ok(Some(Capture {
            field,
            depth: self.path.len(),
            fuel_type,
            text: String::new(),
        }))
    }

    fn enter(&mut self, start: &BytesStart<'_>) -> quick_xml::Result<()> {
        if let Some(capture) = self.begin_capture(start)? {
            self.capture = Some(capture);
        }
        self.path.push(start.local_name().as_ref().to_vec());
        Ok(())
    }

    fn empty(&mut self, start: &BytesStart<'_>) -> quick_xml::Result<()> {
        if let Some(capture) = self.begin_capture(start)? {
            self.finish(capture);
        }
        Ok(())
    }

    /// Handle an end tag. Returns `true` once the `<place>` itself is closed.
    fn leave(&mut self) -> bool {
        if self.path.pop().is_none() {
            return true;
        }
        if self.capture.as_ref().is_some_and(|c| c.depth == self.path.len()) {
            if let Some(capture) = self.capture.take() {
                self.finish(capture);
            }
        }
        false
    }

    fn push_text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.text.push_str(text);
        }
    }

    fn finish(&mut self, capture: Capture) {
        let slot = match capture.field {
            Field::Name => &mut self.node.name,
            Field::CreId => &mut self.node.cre_id,
            Field::X => &mut self.node.x,
            Field::Y => &mut self.node.y,
            Field::GasPrice => {
                self.node.gas_prices.push(GasPriceNode {
                    fuel_type: capture.fuel_type,
                    value: capture.text,
                });
                return;
            },
        };

        if slot.is_none() {
            *slot = Some(capture.text);
        }
    }
}

fn attribute(start: &BytesStart<'_>, key: &[u8]) -> quick_xml::Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            let value = attr.decode_and_unescape_value(start.decoder())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Text for `&...;` references; unknown entities are kept verbatim
fn resolve_reference(reference: &BytesRef<'_>) -> quick_xml::Result<String> {
    if let Some(ch) = reference.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = reference.decode()?;
    Ok(resolve_predefined_entity(&name).map_or_else(|| format!("&{name};"), str::to_string))
}

#[derive(Debug, Default)]
struct Walk {
    places: Vec<PlaceNode>,
    open_elements: usize,
    saw_element: bool,
}

fn walk_places(text: &str) -> quick_xml::Result<Walk> {
    let mut reader = Reader::from_str(text);
    let mut walk = Walk::default();
    let mut cursor: Option<PlaceCursor> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                walk.saw_element = true;
                walk.open_elements += 1;
                match cursor.as_mut() {
                    Some(place) => place.enter(&start)?,
                    None if start.local_name().as_ref() == b"place" => {
                        cursor = Some(PlaceCursor::open(&start)?);
                    },
                    None => {},
                }
            },
            Event::Empty(start) => {
                walk.saw_element = true;
                match cursor.as_mut() {
                    Some(place) => place.empty(&start)?,
                    None if start.local_name().as_ref() == b"place" => {
                        walk.places.push(PlaceCursor::open(&start)?.node);
                    },
                    None => {},
                }
            },
            Event::End(_) => {
                walk.open_elements = walk.open_elements.saturating_sub(1);
                if cursor.as_mut().is_some_and(PlaceCursor::leave) {
                    if let Some(place) = cursor.take() {
                        walk.places.push(place.node);
                    }
                }
            },
            Event::Text(text) => {
                if let Some(place) = cursor.as_mut() {
                    place.push_text(&text.xml10_content()?);
                }
            },
            Event::CData(data) => {
                if let Some(place) = cursor.as_mut() {
                    place.push_text(&data.decode()?);
                }
            },
            Event::GeneralRef(reference) => {
                if let Some(place) = cursor.as_mut() {
                    place.push_text(&resolve_reference(&reference)?);
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(walk)
}

fn read_places(body: &str) -> Result<Vec<PlaceNode>, ParseError> {
    let text = body.trim_start_matches('\u{feff}').trim();
    if !text.starts_with('<') {
        return Err(ParseError::Malformed("document does not start with markup".to_string()));
    }

    let walk = walk_places(text).map_err(|e| ParseError::Malformed(e.to_string()))?;

    if !walk.saw_element {
        return Err(ParseError::Malformed("document has no root element".to_string()));
    }
    if walk.open_elements > 0 {
        return Err(ParseError::Malformed(format!(
            "document ends with {} unclosed element(s)",
            walk.open_elements
        )));
    }

    Ok(walk.places)
}

/// Parse the prices document into one record per (station, fuel type) element
///
/// Prices are stored in minor units; see [`parse_minor_units`].
pub fn parse_prices(doc: &RawDocument) -> Result<Parsed<ExternalPriceRecord>, ParseError> {
    let places = read_places(&doc.body)?;
    let mut parsed = Parsed::default();

    for place in places {
        let station_id = match place.station_id() {
            Ok(id) => id,
            Err(warning) => {
                warn!(detail = %warning.detail, "Skipping place element");
                parsed.warnings.push(warning);
                continue;
            },
        };

        for node in place.gas_prices {
            let fuel_type = node
                .fuel_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(UNKNOWN_FUEL_TYPE)
                .to_string();

            match parse_minor_units(&node.value) {
                Some(price) => parsed.records.push(ExternalPriceRecord {
                    station_id,
                    fuel_type,
                    price,
                }),
                None => {
                    let warning = ParseWarning::invalid_price(station_id, &fuel_type, &node.value);
                    warn!(station_id, detail = %warning.detail, "Skipping gas_price element");
                    parsed.warnings.push(warning);
                },
            }
        }
    }

    debug!(
        records = parsed.records.len(),
        warnings = parsed.warnings.len(),
        "Parsed prices document"
    );

    Ok(parsed)
}

/// Parse the stations document
///
/// Coordinates that are missing or not numeric default to `0.0`.
pub fn parse_stations(doc: &RawDocument) -> Result<Parsed<ExternalStationRecord>, ParseError> {
    let places = read_places(&doc.body)?;
    let mut parsed = Parsed::default();

    for place in places {
        let place_id = match place.station_id() {
            Ok(id) => id,
            Err(warning) => {
                warn!(detail = %warning.detail, "Skipping place element");
                parsed.warnings.push(warning);
                continue;
            },
        };

        parsed.records.push(ExternalStationRecord {
            place_id,
            name: place.name.as_deref().map(str::trim).unwrap_or_default().to_string(),
            cre_id: place.cre_id.as_deref().map(str::trim).unwrap_or_default().to_string(),
            x: coordinate(place.x.as_deref()),
            y: coordinate(place.y.as_deref()),
        });
    }

    debug!(
        records = parsed.records.len(),
        warnings = parsed.warnings.len(),
        "Parsed stations document"
    );

    Ok(parsed)
}

fn coordinate(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Convert a decimal price text into integer minor units (cents)
///
/// Accepts ASCII digits with at most one `.` and optional surrounding
/// whitespace. Signs, exponents and digit grouping are rejected. Digits past
/// the second decimal place are rounded half away from zero.
pub fn parse_minor_units(raw: &str) -> Option<i64> {
    let text = raw.trim();
    let (whole, frac) = text.split_once('.').unwrap_or((text, ""));

    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut cents: i64 = 0;
    for digit in whole.bytes() {
        cents = cents.checked_mul(10)?.checked_add(i64::from(digit - b'0'))?;
    }

    let mut frac_digits = frac.bytes();
    for _ in 0..2 {
        let digit = frac_digits.next().map_or(0, |b| b - b'0');
        cents = cents.checked_mul(10)?.checked_add(i64::from(digit))?;
    }

    if frac_digits.next().is_some_and(|b| b >= b'5') {
        cents = cents.checked_add(1)?;
    }

    Some(cents)
}
