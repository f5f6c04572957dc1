use js_sys::Reflect;
use measures_shared::Options;
use measures_shared::geo::{
    AccessToken, DEFAULT_CENTER, DEFAULT_ZOOM, FEATURE_STYLE, FeatureCollection, MAP_STYLE_ID, MapOutcome, access_token,
    map_outcome,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{dom, fetch};

pub const MAP_PANEL_ID: &str = "map-measure";
pub const MAP_CONTAINER_ID: &str = "map-container";

#[wasm_bindgen]
extern "C" {
    type LeafletMap;
    type Handler;
    type FeatureLayer;

    #[wasm_bindgen(js_namespace = ["L", "mapbox"], js_name = map, catch)]
    fn mapbox_map(element_id: &str, style_id: &str, options: &JsValue) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &LeafletMap, center: &JsValue, zoom: u8) -> LeafletMap;

    #[wasm_bindgen(method, getter, js_name = scrollWheelZoom)]
    fn scroll_wheel_zoom(this: &LeafletMap) -> Handler;

    #[wasm_bindgen(method)]
    fn disable(this: &Handler);

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &LeafletMap, bounds: &JsValue, options: &JsValue);

    #[wasm_bindgen(js_namespace = ["L", "mapbox"], js_name = featureLayer)]
    fn feature_layer() -> FeatureLayer;

    #[wasm_bindgen(method, js_name = setGeoJSON)]
    fn set_geo_json(this: &FeatureLayer, data: &JsValue) -> FeatureLayer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &FeatureLayer, map: &LeafletMap) -> FeatureLayer;

    #[wasm_bindgen(method, js_name = setStyle)]
    fn set_style(this: &FeatureLayer, style: &JsValue);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapInit {
    zoom_control: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FitOptions {
    max_zoom: u8,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn mapbox_namespace() -> Option<JsValue> {
    let window = web_sys::window()?;
    let mapbox = Reflect::get(window.as_ref(), &JsValue::from_str("L"))
        .and_then(|leaflet| Reflect::get(&leaflet, &JsValue::from_str("mapbox")))
        .ok()?;
    mapbox.is_object().then_some(mapbox)
}

fn page_has_access_token() -> bool {
    mapbox_namespace()
        .and_then(|mapbox| Reflect::get(&mapbox, &JsValue::from_str("accessToken")).ok())
        .and_then(|token| token.as_string())
        .is_some_and(|token| !token.is_empty())
}

fn install_access_token(from_options: Option<&str>) {
    match access_token(from_options, page_has_access_token()) {
        AccessToken::Options(token) => {
            if let Some(mapbox) = mapbox_namespace() {
                Reflect::set(&mapbox, &JsValue::from_str("accessToken"), &JsValue::from_str(token)).ok();
            }
        }
        AccessToken::Page => {}
        AccessToken::Missing => {
            web_sys::console::warn_1(&"map: no mapbox access token; tiles will not load".into());
        }
    }
}

/// Create the map when the page has a map panel, then load and fit the org features.
pub fn setup(options: &Options) {
    if dom::by_id(MAP_PANEL_ID).is_none() {
        return;
    }
    install_access_token(options.map_access_token.as_deref());
    let map = match create_map() {
        Ok(map) => map,
        Err(err) => {
            web_sys::console::warn_1(&format!("map init failed: {err:?}").into());
            return;
        }
    };
    let max_zoom = options.org_type.map_max_zoom();
    let url = options.org_location_url.clone();

    wasm_bindgen_futures::spawn_local(async move {
        let features = match url {
            Some(url) => fetch::load_features(&url).await.unwrap_or_else(|e| {
                web_sys::console::warn_1(&format!("map features: {e}").into());
                FeatureCollection::default()
            }),
            None => FeatureCollection::default(),
        };
        if let Err(err) = show_features(&map, &features, max_zoom) {
            web_sys::console::warn_1(&format!("map features: {err:?}").into());
        }
    });
}

fn create_map() -> Result<LeafletMap, JsValue> {
    let init = to_js(&MapInit { zoom_control: false })?;
    let map = mapbox_map(MAP_PANEL_ID, MAP_STYLE_ID, &init)?;
    let center = to_js(&[DEFAULT_CENTER.0, DEFAULT_CENTER.1])?;
    map.set_view(&center, DEFAULT_ZOOM);
    map.scroll_wheel_zoom().disable();
    Ok(map)
}

fn show_features(map: &LeafletMap, features: &FeatureCollection, max_zoom: u8) -> Result<(), JsValue> {
    match map_outcome(features, max_zoom) {
        MapOutcome::Fit { bounds, max_zoom } => {
            let layer = feature_layer().set_geo_json(&to_js(features)?).add_to(map);
            map.fit_bounds(&to_js(&bounds.as_lat_lng_pairs())?, &to_js(&FitOptions { max_zoom })?);
            layer.set_style(&to_js(&FEATURE_STYLE)?);
        }
        MapOutcome::Clear => {
            if let Some(container) = dom::by_id(MAP_CONTAINER_ID) {
                container.set_inner_html("");
            }
        }
    }
    Ok(())
}
