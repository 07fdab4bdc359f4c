//! Minimal GeoJSON model for the front-line feed.
//!
//! Only the geometry kinds the converter understands are decoded into typed
//! variants; any other `"type"` is kept as [`Geometry::Unknown`] so the
//! converter can log and skip it instead of rejecting the whole feed.

use serde::Deserialize;
use serde_json::Value;

/// `[longitude, latitude]` or `[longitude, latitude, altitude]`.
pub type Position = Vec<f64>;

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl std::str::FromStr for FeatureCollection {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: FeatureProperties,
}

/// Style and label properties used by the feed (simplestyle names).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeatureProperties {
    pub name: Option<String>,
    pub description: Option<String>,
    pub stroke: Option<String>,
    #[serde(rename = "stroke-width")]
    pub stroke_width: Option<f64>,
    pub fill: Option<String>,
    #[serde(rename = "fill-opacity")]
    pub fill_opacity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    Polygon(Vec<Vec<Position>>),
    GeometryCollection(Vec<Geometry>),
    /// Any other geometry type, by its `"type"` name.
    Unknown(String),
}

impl Geometry {
    pub fn type_name(&self) -> &str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::GeometryCollection(_) => "GeometryCollection",
            Geometry::Unknown(kind) => kind,
        }
    }
}

impl TryFrom<Value> for Geometry {
    type Error = String;

    fn try_from(mut value: Value) -> Result<Self, Self::Error> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "geometry has no string \"type\" member".to_string())?
            .to_string();

        let geometry = match kind.as_str() {
            "Point" => Geometry::Point(decode(&kind, take(&mut value, &kind, "coordinates")?)?),
            "LineString" => {
                Geometry::LineString(decode(&kind, take(&mut value, &kind, "coordinates")?)?)
            }
            "Polygon" => Geometry::Polygon(decode(&kind, take(&mut value, &kind, "coordinates")?)?),
            "GeometryCollection" => Geometry::GeometryCollection(decode(
                &kind,
                take(&mut value, &kind, "geometries")?,
            )?),
            _ => Geometry::Unknown(kind.clone()),
        };
        Ok(geometry)
    }
}

fn take(value: &mut Value, kind: &str, member: &str) -> Result<Value, String> {
    value
        .get_mut(member)
        .map(Value::take)
        .ok_or_else(|| format!("{kind} geometry has no \"{member}\" member"))
}

fn decode<T: serde::de::DeserializeOwned>(kind: &str, value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid {kind} geometry: {e}"))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
