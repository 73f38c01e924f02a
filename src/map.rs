//! Map-rendering support for the report feed: one pin per located
//! report, plus the tile/viewport configuration the map shell needs.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde::{Deserialize, Serialize};

use crate::model::{LatLon, Report, ReportId};

/// Initial viewport over the whole archipelago.
pub const DEFAULT_CENTER: LatLon = LatLon::new(-2.548_926, 118.014_863);
pub const DEFAULT_ZOOM: f64 = 5.0;

/// Starting location for the submission form's picker.
pub const DEFAULT_SUBMIT_LOCATION: LatLon = LatLon::new(-6.175_389, 106.827_139);
pub const SUBMIT_ZOOM: f64 = 15.0;

pub const TILE_URL_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPin {
    pub id: ReportId,
    pub lat: f64,
    pub lon: f64,
    pub title: String,
    pub description: String,
    /// Deep link the pin's popup navigates to.
    pub route: String,
}

#[must_use]
pub fn detail_route(id: &ReportId) -> String {
    format!("#/reports/{id}")
}

/// Unlocated reports are skipped, never an error.
#[must_use]
pub fn pins_for_reports(reports: &[Report]) -> Vec<MapPin> {
    reports
        .iter()
        .filter_map(|report| {
            let location = report.located()?;
            Some(MapPin {
                id: report.id.clone(),
                lat: location.lat,
                lon: location.lon,
                title: report.title.clone(),
                description: report.description.clone(),
                route: detail_route(&report.id),
            })
        })
        .collect()
}

/// GeoJSON view of the pins for shells that feed their map layer a
/// `FeatureCollection` directly. Coordinates are `[lon, lat]` per the
/// GeoJSON spec.
#[must_use]
pub fn feature_collection(pins: &[MapPin]) -> FeatureCollection {
    let features = pins
        .iter()
        .map(|pin| {
            let mut properties = JsonObject::new();
            properties.insert("id".into(), pin.id.as_str().into());
            properties.insert("title".into(), pin.title.clone().into());
            properties.insert("description".into(), pin.description.clone().into());
            properties.insert("route".into(), pin.route.clone().into());

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::Point(vec![pin.lon, pin.lat]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, lat: Option<f64>, lon: Option<f64>) -> Report {
        Report {
            id: ReportId::new(id),
            title: format!("report {id}"),
            description: format!("report {id}"),
            evidence_images: vec![],
            latitude: lat,
            longitude: lon,
            created_at: String::new(),
            reporter_name: "Unknown".into(),
        }
    }

    #[test]
    fn unlocated_reports_produce_no_pin() {
        let reports = vec![
            report("a", Some(-6.2), Some(106.8)),
            report("b", None, Some(106.8)),
            report("c", Some(-6.2), None),
            report("d", None, None),
        ];

        let pins = pins_for_reports(&reports);
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].id.as_str(), "a");
    }

    #[test]
    fn zero_coordinates_still_get_a_pin() {
        let pins = pins_for_reports(&[report("origin", Some(0.0), Some(0.0))]);
        assert_eq!(pins.len(), 1);
    }

    #[test]
    fn pins_deep_link_to_the_detail_route() {
        let pins = pins_for_reports(&[report("story-7", Some(1.0), Some(2.0))]);
        assert_eq!(pins[0].route, "#/reports/story-7");
    }

    #[test]
    fn feature_collection_uses_lon_lat_order() {
        let pins = pins_for_reports(&[report("a", Some(-6.2), Some(106.8))]);
        let collection = feature_collection(&pins);
        assert_eq!(collection.features.len(), 1);

        let geometry = collection.features[0].geometry.as_ref().unwrap();
        let GeoValue::Point(ref coords) = geometry.value else {
            panic!("expected a point");
        };
        assert!((coords[0] - 106.8).abs() < f64::EPSILON);
        assert!((coords[1] - -6.2).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_report_list_is_an_empty_collection() {
        let collection = feature_collection(&pins_for_reports(&[]));
        assert!(collection.features.is_empty());
    }
}
