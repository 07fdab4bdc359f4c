//! GeoJSON feature collection → KML document.
//!
//! One placemark per feature; a `GeometryCollection` yields one placemark per
//! `Polygon` member and ignores everything else. Unknown geometry types are
//! logged and skipped. Malformed input (bad colors, a truncated icon marker,
//! a polygon without rings) fails the whole conversion.

use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::geojson::{Feature, FeatureCollection, FeatureProperties, Geometry, Position};
use crate::kml::{
    Coordinate, IconStyle, KmlColor, KmlDocument, LineStyle, Placemark, PlacemarkGeometry,
    PolyStyle, Style,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const ICON_MARKER: &str = "{icon=";

pub struct Converter {
    config: ConvertConfig,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, collection: &FeatureCollection) -> Result<KmlDocument, ConvertError> {
        info!(
            features = collection.features.len(),
            "Converting feature collection to KML"
        );
        let mut document = KmlDocument::default();
        for feature in &collection.features {
            self.convert_feature(feature, &mut document)?;
        }
        info!(placemarks = document.len(), "Conversion completed");
        Ok(document)
    }

    fn convert_feature(
        &self,
        feature: &Feature,
        document: &mut KmlDocument,
    ) -> Result<(), ConvertError> {
        let props = &feature.properties;
        match &feature.geometry {
            Geometry::Polygon(rings) => {
                document.placemarks.push(polygon_placemark(props, rings)?);
            }
            Geometry::GeometryCollection(geometries) => {
                for geometry in geometries {
                    match geometry {
                        Geometry::Polygon(rings) => {
                            document.placemarks.push(polygon_placemark(props, rings)?);
                        }
                        other => debug!(
                            kind = other.type_name(),
                            "Ignoring non-polygon member of GeometryCollection"
                        ),
                    }
                }
            }
            Geometry::LineString(positions) => {
                document.placemarks.push(Placemark {
                    name: name_of(props),
                    description: description_of(props).to_string(),
                    style: Style::default(),
                    geometry: PlacemarkGeometry::LineString {
                        coordinates: to_coordinates(positions)?,
                    },
                });
            }
            Geometry::Point(position) => {
                document.placemarks.push(self.point_placemark(props, position)?);
            }
            Geometry::Unknown(kind) => {
                warn!(kind = %kind, name = %name_of(props), "Unknown geometry type, skipping feature");
            }
        }
        Ok(())
    }

    fn point_placemark(
        &self,
        props: &FeatureProperties,
        position: &Position,
    ) -> Result<Placemark, ConvertError> {
        let mut style = Style::default();
        if let Some(icon) = icon_name(description_of(props))? {
            style.icon = Some(IconStyle {
                href: format!("{}{}.png", self.config.icon_base_url, icon),
            });
            style.label_scale = Some(0.0);
        }
        Ok(Placemark {
            name: name_of(props),
            // The marker syntax is meaningless to map viewers.
            description: String::new(),
            style,
            geometry: PlacemarkGeometry::Point {
                coordinate: to_coordinate(position)?,
            },
        })
    }
}

fn polygon_placemark(
    props: &FeatureProperties,
    rings: &[Vec<Position>],
) -> Result<Placemark, ConvertError> {
    let outer = rings.first().ok_or_else(|| ConvertError::MissingOuterRing {
        name: name_of(props),
    })?;
    Ok(Placemark {
        name: name_of(props),
        description: description_of(props).to_string(),
        style: polygon_style(props)?,
        geometry: PlacemarkGeometry::Polygon {
            outer_boundary: to_coordinates(outer)?,
        },
    })
}

fn polygon_style(props: &FeatureProperties) -> Result<Style, ConvertError> {
    let stroke = props
        .stroke
        .as_deref()
        .map(|value| parse_color("stroke", value))
        .transpose()?;
    let line = (stroke.is_some() || props.stroke_width.is_some()).then(|| LineStyle {
        color: stroke,
        width: props.stroke_width,
    });

    let poly = props
        .fill
        .as_deref()
        .map(|value| -> Result<PolyStyle, ConvertError> {
            let color = parse_color("fill", value)?;
            let color = match props.fill_opacity {
                Some(opacity) => color.with_alpha(opacity_to_alpha(opacity)),
                None => color,
            };
            Ok(PolyStyle { color })
        })
        .transpose()?;

    Ok(Style {
        line,
        poly,
        ..Style::default()
    })
}

fn parse_color(property: &'static str, value: &str) -> Result<KmlColor, ConvertError> {
    KmlColor::from_html_hex(value).ok_or_else(|| ConvertError::InvalidColor {
        property,
        value: value.to_string(),
    })
}

/// Maps a 0–1 opacity fraction to the 0–100 integer used as KML alpha.
/// Truncates, and clamps out-of-range input.
pub fn opacity_to_alpha(opacity: f64) -> u8 {
    if opacity.is_nan() {
        return 0;
    }
    (opacity * 100.0).trunc().clamp(0.0, 100.0) as u8
}

fn icon_pattern() -> Result<&'static Regex, ConvertError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{icon=([^,}]*)[,}]"))
        .as_ref()
        .map_err(|e| ConvertError::IconPattern(e.clone()))
}

/// Extracts `<name>` from `{icon=<name>}` or `{icon=<name>,...}`.
///
/// `Ok(None)` when the description has no marker; an error when the marker is
/// present but nothing terminates the name.
pub fn icon_name(description: &str) -> Result<Option<&str>, ConvertError> {
    let Some(start) = description.find(ICON_MARKER) else {
        return Ok(None);
    };
    match icon_pattern()?.captures(&description[start..]) {
        Some(captures) => Ok(captures.get(1).map(|m| m.as_str())),
        None => Err(ConvertError::MalformedIconMarker {
            description: description.to_string(),
        }),
    }
}

fn name_of(props: &FeatureProperties) -> String {
    props.name.clone().unwrap_or_default()
}

fn description_of(props: &FeatureProperties) -> &str {
    props.description.as_deref().unwrap_or_default()
}

fn to_coordinate(position: &Position) -> Result<Coordinate, ConvertError> {
    match position.as_slice() {
        [longitude, latitude] => Ok(Coordinate::new(*longitude, *latitude)),
        [longitude, latitude, altitude, ..] => Ok(Coordinate {
            longitude: *longitude,
            latitude: *latitude,
            altitude: Some(*altitude),
        }),
        _ => Err(ConvertError::InvalidPosition {
            position: position.clone(),
        }),
    }
}

fn to_coordinates(positions: &[Position]) -> Result<Vec<Coordinate>, ConvertError> {
    positions.iter().map(to_coordinate).collect()
}
