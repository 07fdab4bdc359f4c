//! KML document model and its XML serialization.
//!
//! The writer emits one `<Document>` with inline styles per placemark, so the
//! output depends only on the document contents: an unchanged feed yields a
//! byte-identical file and therefore no git change.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt;
use std::io::Write;

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KmlDocument {
    pub placemarks: Vec<Placemark>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub name: String,
    pub description: String,
    pub style: Style,
    pub geometry: PlacemarkGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacemarkGeometry {
    Polygon { outer_boundary: Vec<Coordinate> },
    LineString { coordinates: Vec<Coordinate> },
    Point { coordinate: Coordinate },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: Option<f64>,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude: None,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.longitude,
            self.latitude,
            self.altitude.unwrap_or(0.0)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub icon: Option<IconStyle>,
    /// `Some(0.0)` hides the label next to an icon.
    pub label_scale: Option<f64>,
    pub line: Option<LineStyle>,
    pub poly: Option<PolyStyle>,
}

impl Style {
    pub fn is_empty(&self) -> bool {
        self.icon.is_none()
            && self.label_scale.is_none()
            && self.line.is_none()
            && self.poly.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IconStyle {
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineStyle {
    pub color: Option<KmlColor>,
    pub width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolyStyle {
    pub color: KmlColor,
}

/// A KML color, written as `aabbggrr` hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmlColor {
    pub alpha: u8,
    pub blue: u8,
    pub green: u8,
    pub red: u8,
}

impl KmlColor {
    /// Parses an HTML `#rrggbb` color (the `#` is optional) as an opaque color.
    pub fn from_html_hex(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            alpha: 0xff,
            red: channel(0)?,
            green: channel(2)?,
            blue: channel(4)?,
        })
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        Self { alpha, ..self }
    }
}

impl fmt::Display for KmlColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}",
            self.alpha, self.blue, self.green, self.red
        )
    }
}

impl KmlDocument {
    pub fn len(&self) -> usize {
        self.placemarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placemarks.is_empty()
    }

    /// Serializes the whole document, XML declaration included.
    pub fn to_xml(&self) -> Result<Vec<u8>, quick_xml::Error> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub fn write_to<W: Write>(&self, inner: W) -> Result<(), quick_xml::Error> {
        let mut writer = Writer::new_with_indent(inner, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut kml = BytesStart::new("kml");
        kml.push_attribute(("xmlns", KML_NAMESPACE));
        writer.write_event(Event::Start(kml))?;
        writer.write_event(Event::Start(BytesStart::new("Document")))?;
        for placemark in &self.placemarks {
            write_placemark(&mut writer, placemark)?;
        }
        writer.write_event(Event::End(BytesEnd::new("Document")))?;
        writer.write_event(Event::End(BytesEnd::new("kml")))
    }
}

fn write_placemark<W: Write>(
    writer: &mut Writer<W>,
    placemark: &Placemark,
) -> Result<(), quick_xml::Error> {
    start(writer, "Placemark")?;
    text_element(writer, "name", &placemark.name)?;
    text_element(writer, "description", &placemark.description)?;
    if !placemark.style.is_empty() {
        write_style(writer, &placemark.style)?;
    }
    match &placemark.geometry {
        PlacemarkGeometry::Polygon { outer_boundary } => {
            start(writer, "Polygon")?;
            start(writer, "outerBoundaryIs")?;
            start(writer, "LinearRing")?;
            text_element(writer, "coordinates", &join_coordinates(outer_boundary))?;
            end(writer, "LinearRing")?;
            end(writer, "outerBoundaryIs")?;
            end(writer, "Polygon")?;
        }
        PlacemarkGeometry::LineString { coordinates } => {
            start(writer, "LineString")?;
            text_element(writer, "coordinates", &join_coordinates(coordinates))?;
            end(writer, "LineString")?;
        }
        PlacemarkGeometry::Point { coordinate } => {
            start(writer, "Point")?;
            text_element(writer, "coordinates", &coordinate.to_string())?;
            end(writer, "Point")?;
        }
    }
    end(writer, "Placemark")
}

fn write_style<W: Write>(writer: &mut Writer<W>, style: &Style) -> Result<(), quick_xml::Error> {
    start(writer, "Style")?;
    if let Some(icon) = &style.icon {
        start(writer, "IconStyle")?;
        start(writer, "Icon")?;
        text_element(writer, "href", &icon.href)?;
        end(writer, "Icon")?;
        end(writer, "IconStyle")?;
    }
    if let Some(scale) = style.label_scale {
        start(writer, "LabelStyle")?;
        text_element(writer, "scale", &scale.to_string())?;
        end(writer, "LabelStyle")?;
    }
    if let Some(line) = &style.line {
        start(writer, "LineStyle")?;
        if let Some(color) = line.color {
            text_element(writer, "color", &color.to_string())?;
        }
        if let Some(width) = line.width {
            text_element(writer, "width", &width.to_string())?;
        }
        end(writer, "LineStyle")?;
    }
    if let Some(poly) = &style.poly {
        start(writer, "PolyStyle")?;
        text_element(writer, "color", &poly.color.to_string())?;
        end(writer, "PolyStyle")?;
    }
    end(writer, "Style")
}

fn join_coordinates(coordinates: &[Coordinate]) -> String {
    coordinates
        .iter()
        .map(Coordinate::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), quick_xml::Error> {
    start(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_hex_becomes_abgr() {
        let color = KmlColor::from_html_hex("#a52714").unwrap();
        assert_eq!(color.to_string(), "ff1427a5");
        assert_eq!(color.with_alpha(50).to_string(), "321427a5");
        assert_eq!(KmlColor::from_html_hex("0000FF").unwrap().to_string(), "ffff0000");
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["", "#", "#12345", "#1234567", "#gg0000", "red"] {
            assert!(KmlColor::from_html_hex(bad).is_none(), "{bad} should be rejected");
        }
    }

    #[test]
    fn writes_escaped_placemarks() {
        let doc = KmlDocument {
            placemarks: vec![Placemark {
                name: "Kherson & <bridge>".into(),
                description: String::new(),
                style: Style::default(),
                geometry: PlacemarkGeometry::Point {
                    coordinate: Coordinate::new(32.6, 46.6),
                },
            }],
        };
        let xml = String::from_utf8(doc.to_xml().unwrap()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<kml xmlns=\"http://www.opengis.net/kml/2.2\">"));
        assert!(xml.contains("<name>Kherson &amp; &lt;bridge&gt;</name>"));
        assert!(xml.contains("<coordinates>32.6,46.6,0</coordinates>"));
        assert!(!xml.contains("<Style>"));
    }

    #[test]
    fn output_is_deterministic() {
        let doc = KmlDocument {
            placemarks: vec![Placemark {
                name: "Front".into(),
                description: "line".into(),
                style: Style {
                    line: Some(LineStyle {
                        color: KmlColor::from_html_hex("#ff0000"),
                        width: Some(3.0),
                    }),
                    ..Style::default()
                },
                geometry: PlacemarkGeometry::LineString {
                    coordinates: vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.5, 1.0)],
                },
            }],
        };
        let first = doc.to_xml().unwrap();
        assert_eq!(first, doc.to_xml().unwrap());
        let xml = String::from_utf8(first).unwrap();
        assert!(xml.contains("<color>ff0000ff</color>"));
        assert!(xml.contains("<width>3</width>"));
        assert!(xml.contains("<coordinates>0,0,0 1.5,1,0</coordinates>"));
    }
}
