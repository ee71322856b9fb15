//! Encoding of requests into Earth Engine expression graphs.
//!
//! The REST API evaluates an `Expression`: a map of value nodes plus the id
//! of the node holding the result. Every request built here is a single
//! nested node stored under id `"0"`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::engine::{OutlineStyle, ReduceRequest};
use crate::geometry::Geometry;
use crate::index::{IndexKind, MODIS_VEGETATION_COLLECTION};
use crate::period::{DateInterval, DATE_FORMAT};
use crate::raster::Raster;

/// FAO Global Administrative Unit Layers, country level.
pub const GAUL_COUNTRIES_TABLE: &str = "FAO/GAUL/2015/level0";

/// Country name attribute of the GAUL table.
pub const GAUL_COUNTRY_NAME_FIELD: &str = "ADM0_NAME";

/// Property carrying each scene's acquisition start time.
const TIME_START_PROPERTY: &str = "system:time_start";

/// Identifiers of the remote datasets a request refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasets {
    pub image_collection: String,
    pub boundary_table: String,
    pub boundary_name_field: String,
}

impl Default for Datasets {
    fn default() -> Self {
        Datasets {
            image_collection: MODIS_VEGETATION_COLLECTION.to_string(),
            boundary_table: GAUL_COUNTRIES_TABLE.to_string(),
            boundary_name_field: GAUL_COUNTRY_NAME_FIELD.to_string(),
        }
    }
}

fn constant(value: Value) -> Value {
    json!({ "constantValue": value })
}

fn invoke(function_name: &str, arguments: Vec<(&str, Value)>) -> Value {
    let arguments: Map<String, Value> = arguments
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    json!({
        "functionInvocationValue": {
            "functionName": function_name,
            "arguments": arguments,
        }
    })
}

/// Wrap a value node as a complete expression.
pub fn expression(node: Value) -> Value {
    json!({
        "result": "0",
        "values": { "0": node },
    })
}

impl Datasets {
    fn date_range(&self, interval: &DateInterval) -> Value {
        let date = |d: &chrono::NaiveDate| {
            invoke(
                "Date",
                vec![("value", constant(json!(d.format(DATE_FORMAT).to_string())))],
            )
        };
        invoke(
            "DateRange",
            vec![("start", date(&interval.start)), ("end", date(&interval.end))],
        )
    }

    /// All scenes of the archive whose start time falls in `interval`.
    pub fn scenes(&self, interval: &DateInterval) -> Value {
        let collection = invoke(
            "ImageCollection.load",
            vec![("id", constant(json!(self.image_collection)))],
        );
        let filter = invoke(
            "Filter.dateRangeContains",
            vec![
                ("leftValue", self.date_range(interval)),
                ("rightField", constant(json!(TIME_START_PROPERTY))),
            ],
        );
        invoke(
            "Collection.filter",
            vec![("collection", collection), ("filter", filter)],
        )
    }

    pub fn scene_count(&self, interval: &DateInterval) -> Value {
        invoke("Collection.size", vec![("collection", self.scenes(interval))])
    }

    /// Mean composite of one index band over `interval`.
    pub fn composite(&self, kind: IndexKind, interval: &DateInterval) -> Value {
        let mean = invoke(
            "ImageCollection.mean",
            vec![("collection", self.scenes(interval))],
        );
        invoke(
            "Image.select",
            vec![
                ("input", mean),
                ("bandSelectors", constant(json!([kind.band_name()]))),
            ],
        )
    }

    pub fn raster(&self, raster: &Raster) -> Value {
        match raster {
            Raster::Composite { kind, period } => self.composite(*kind, &period.interval()),
            Raster::Clipped { source, boundary } => invoke(
                "Image.clip",
                vec![("input", self.raster(source)), ("geometry", geometry(boundary))],
            ),
            Raster::Difference {
                minuend,
                subtrahend,
            } => invoke(
                "Image.subtract",
                vec![
                    ("image1", self.raster(minuend)),
                    ("image2", self.raster(subtrahend)),
                ],
            ),
        }
    }

    /// Dictionary of band means over the request boundary.
    pub fn reduce_mean(&self, raster: &Raster, request: &ReduceRequest) -> Value {
        invoke(
            "Image.reduceRegion",
            vec![
                ("image", self.raster(raster)),
                ("reducer", invoke("Reducer.mean", vec![])),
                ("geometry", geometry(&request.boundary)),
                ("scale", constant(json!(request.scale))),
                ("maxPixels", constant(json!(request.max_pixels))),
            ],
        )
    }

    /// First boundary feature whose name attribute equals `name`.
    pub fn boundary_feature(&self, name: &str) -> Value {
        let table = invoke(
            "Collection.loadTable",
            vec![("tableId", constant(json!(self.boundary_table)))],
        );
        let filter = invoke(
            "Filter.equals",
            vec![
                ("leftField", constant(json!(self.boundary_name_field))),
                ("rightValue", constant(json!(name))),
            ],
        );
        let filtered = invoke(
            "Collection.filter",
            vec![("collection", table), ("filter", filter)],
        );
        invoke("Collection.first", vec![("collection", filtered)])
    }
}

/// A styled image of `boundary`'s outline.
pub fn outline(boundary: &Geometry, style: &OutlineStyle) -> Value {
    let feature = invoke("Feature", vec![("geometry", geometry(boundary))]);
    let collection = invoke(
        "Collection",
        vec![("features", json!({ "arrayValue": { "values": [feature] } }))],
    );
    invoke(
        "FeatureCollection.style",
        vec![
            ("collection", collection),
            ("color", constant(json!(style.color))),
            ("width", constant(json!(style.width))),
            ("fillColor", constant(json!(style.fill_color))),
        ],
    )
}

pub fn geometry(geometry: &Geometry) -> Value {
    match geometry {
        Geometry::BBox {
            west,
            south,
            east,
            north,
        } => invoke(
            "GeometryConstructors.BBox",
            vec![
                ("west", constant(json!(west))),
                ("south", constant(json!(south))),
                ("east", constant(json!(east))),
                ("north", constant(json!(north))),
            ],
        ),
        Geometry::Polygon { coordinates } => invoke(
            "GeometryConstructors.Polygon",
            vec![
                ("coordinates", constant(json!(coordinates))),
                ("evenOdd", constant(json!(true))),
            ],
        ),
        Geometry::MultiPolygon { coordinates } => invoke(
            "GeometryConstructors.MultiPolygon",
            vec![
                ("coordinates", constant(json!(coordinates))),
                ("evenOdd", constant(json!(true))),
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{expression, outline, Datasets};
    use crate::engine::{OutlineStyle, ReduceRequest};
    use crate::geometry::Geometry;
    use crate::index::IndexKind;
    use crate::period::Period;
    use crate::raster::{anomaly, Raster};
    use serde_json::{json, Value};

    fn function_name(node: &Value) -> &str {
        node["functionInvocationValue"]["functionName"]
            .as_str()
            .unwrap()
    }

    fn argument<'a>(node: &'a Value, name: &str) -> &'a Value {
        &node["functionInvocationValue"]["arguments"][name]
    }

    #[test]
    fn test_scene_count_filters_half_open_month() {
        let datasets = Datasets::default();
        let interval = Period::new(2024, 5).unwrap().interval();
        let node = datasets.scene_count(&interval);
        assert_eq!(function_name(&node), "Collection.size");

        let filtered = argument(&node, "collection");
        assert_eq!(function_name(filtered), "Collection.filter");
        let load = argument(filtered, "collection");
        assert_eq!(argument(load, "id")["constantValue"], json!("MODIS/061/MOD13Q1"));

        let range = argument(argument(filtered, "filter"), "leftValue");
        let start = argument(argument(range, "start"), "value");
        let end = argument(argument(range, "end"), "value");
        assert_eq!(start["constantValue"], json!("2024-05-01"));
        assert_eq!(end["constantValue"], json!("2024-06-01"));
    }

    #[test]
    fn test_anomaly_encodes_subtract_of_clipped_composites() {
        let datasets = Datasets::default();
        let boundary = Geometry::world();
        let current = Raster::Composite {
            kind: IndexKind::Ndvi,
            period: Period::new(2024, 5).unwrap(),
        }
        .clip(&boundary);
        let reference = Raster::Composite {
            kind: IndexKind::Ndvi,
            period: Period::new(2021, 5).unwrap(),
        }
        .clip(&boundary);

        let node = datasets.raster(&anomaly(&current, &reference));
        assert_eq!(function_name(&node), "Image.subtract");
        let image1 = argument(&node, "image1");
        assert_eq!(function_name(image1), "Image.clip");
        let select = argument(image1, "input");
        assert_eq!(function_name(select), "Image.select");
        assert_eq!(argument(select, "bandSelectors")["constantValue"], json!(["NDVI"]));
        assert_eq!(
            function_name(argument(image1, "geometry")),
            "GeometryConstructors.BBox"
        );
    }

    #[test]
    fn test_reduce_mean_carries_scale_and_pixel_budget() {
        let datasets = Datasets::default();
        let raster = Raster::Composite {
            kind: IndexKind::Evi,
            period: Period::new(2020, 1).unwrap(),
        };
        let request = ReduceRequest::new(Geometry::world(), 250);
        let node = datasets.reduce_mean(&raster, &request);
        assert_eq!(function_name(&node), "Image.reduceRegion");
        assert_eq!(argument(&node, "scale")["constantValue"], json!(250));
        assert_eq!(argument(&node, "maxPixels")["constantValue"], json!(1e9));
        assert_eq!(function_name(argument(&node, "reducer")), "Reducer.mean");
    }

    #[test]
    fn test_boundary_lookup_uses_exact_name_filter() {
        let node = Datasets::default().boundary_feature("Pakistan");
        assert_eq!(function_name(&node), "Collection.first");
        let filter = argument(argument(&node, "collection"), "filter");
        assert_eq!(function_name(filter), "Filter.equals");
        assert_eq!(argument(filter, "leftField")["constantValue"], json!("ADM0_NAME"));
        assert_eq!(argument(filter, "rightValue")["constantValue"], json!("Pakistan"));
    }

    #[test]
    fn test_outline_styles_a_single_feature() {
        let node = outline(&Geometry::world(), &OutlineStyle::default());
        assert_eq!(function_name(&node), "FeatureCollection.style");
        assert_eq!(argument(&node, "color")["constantValue"], json!("AAAAAA"));
        assert_eq!(argument(&node, "fillColor")["constantValue"], json!("00000000"));
        let features = &argument(argument(&node, "collection"), "features")["arrayValue"]["values"];
        assert_eq!(features.as_array().unwrap().len(), 1);
        assert_eq!(
            function_name(argument(&features[0], "geometry")),
            "GeometryConstructors.BBox"
        );
    }

    #[test]
    fn test_expression_wrapper() {
        let wrapped = expression(json!({"constantValue": 1}));
        assert_eq!(wrapped["result"], json!("0"));
        assert_eq!(wrapped["values"]["0"]["constantValue"], json!(1));
    }
}
