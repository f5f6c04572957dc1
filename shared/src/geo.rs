use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback view before organisation features load (roughly the middle of England).
pub const DEFAULT_CENTER: (f64, f64) = (52.905, -1.79);
pub const DEFAULT_ZOOM: u8 = 6;
pub const MAP_STYLE_ID: &str = "mapbox.streets";

/// Style applied to the organisation layer once it has loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    pub fill_color: &'static str,
    pub fill_opacity: f64,
    pub weight: f64,
    pub color: &'static str,
    pub radius: f64,
}

pub const FEATURE_STYLE: FeatureStyle = FeatureStyle {
    fill_color: "#ff00ff",
    fill_opacity: 0.2,
    weight: 0.5,
    color: "#333",
    radius: 10.0,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Value,
}

/// Only the coordinates matter here; nesting depth varies by geometry type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

/// Geographic bounds; GeoJSON positions are `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    fn around(lng: f64, lat: f64) -> Self {
        Self {
            south: lat,
            west: lng,
            north: lat,
            east: lng,
        }
    }

    fn extend(&mut self, lng: f64, lat: f64) {
        self.south = self.south.min(lat);
        self.north = self.north.max(lat);
        self.west = self.west.min(lng);
        self.east = self.east.max(lng);
    }

    /// `[[south, west], [north, east]]`, the shape Leaflet's `fitBounds` takes.
    pub fn as_lat_lng_pairs(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }
}

impl FeatureCollection {
    /// Bounds over every position of every feature; `None` when there are none.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut bounds: Option<BoundingBox> = None;
        for geometry in self.features.iter().filter_map(|f| f.geometry.as_ref()) {
            visit_positions(&geometry.coordinates, &mut |lng, lat| match bounds.as_mut() {
                Some(b) => b.extend(lng, lat),
                None => bounds = Some(BoundingBox::around(lng, lat)),
            });
        }
        bounds
    }
}

fn visit_positions(coordinates: &Value, visit: &mut impl FnMut(f64, f64)) {
    let Value::Array(items) = coordinates else {
        return;
    };
    if let [Value::Number(lng), Value::Number(lat), ..] = items.as_slice() {
        if let (Some(lng), Some(lat)) = (lng.as_f64(), lat.as_f64())
            && lng.is_finite()
            && lat.is_finite()
        {
            visit(lng, lat);
        }
        return;
    }
    for item in items {
        visit_positions(item, visit);
    }
}

/// What to do once the organisation features have loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapOutcome {
    Fit { bounds: BoundingBox, max_zoom: u8 },
    Clear,
}

pub fn map_outcome(features: &FeatureCollection, max_zoom: u8) -> MapOutcome {
    match features.bounds() {
        Some(bounds) => MapOutcome::Fit { bounds, max_zoom },
        None => MapOutcome::Clear,
    }
}

/// Where the tile access token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessToken<'a> {
    /// `mapAccessToken` in the page options; installed before the map is built.
    Options(&'a str),
    /// The page already set `L.mapbox.accessToken` itself.
    Page,
    /// Neither: tiles will not load.
    Missing,
}

pub fn access_token<'a>(from_options: Option<&'a str>, page_has_token: bool) -> AccessToken<'a> {
    match from_options.map(str::trim) {
        Some(token) if !token.is_empty() => AccessToken::Options(token),
        _ if page_has_token => AccessToken::Page,
        _ => AccessToken::Missing,
    }
}
