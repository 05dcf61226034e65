// src/convert/spatial.rs

//! Bounding box <-> GeoJSON polygon.

use serde_json::{Number, Value, json};

/// Turn `"minX,minY,maxX,maxY"` into a closed GeoJSON polygon string.
///
/// Coordinates keep the number form they were published in, so
/// `"10,20,30,40"` yields integer coordinates.
pub fn bbox_to_polygon(bbox: &str) -> Result<String, String> {
    let parts: Vec<&str> = bbox.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected 4 coordinates, found {}", parts.len()));
    }

    let mut coords = Vec::with_capacity(4);
    for part in parts {
        let number: Number = part
            .parse()
            .map_err(|_| format!("{part:?} is not a number"))?;
        coords.push(number);
    }

    let [min_x, min_y, max_x, max_y] = [&coords[0], &coords[1], &coords[2], &coords[3]];
    let ring = json!([
        [min_x, min_y],
        [min_x, max_y],
        [max_x, max_y],
        [max_x, min_y],
        [min_x, min_y],
    ]);
    let polygon = json!({"type": "Polygon", "coordinates": [ring]});
    Ok(polygon.to_string())
}

/// Recover the bbox string from a polygon written by [`bbox_to_polygon`].
pub fn polygon_to_bbox(geojson: &str) -> Option<String> {
    let value: Value = serde_json::from_str(geojson).ok()?;
    if value.get("type")?.as_str()? != "Polygon" {
        return None;
    }
    let ring = value.get("coordinates")?.get(0)?.as_array()?;
    if ring.len() < 4 {
        return None;
    }

    let point = |idx: usize| -> Option<(&Number, &Number)> {
        let pair = ring.get(idx)?.as_array()?;
        match (pair.first()?, pair.get(1)?) {
            (Value::Number(x), Value::Number(y)) => Some((x, y)),
            _ => None,
        }
    };
    let (min_x, min_y) = point(0)?;
    let (max_x, max_y) = point(2)?;
    Some(format!("{min_x},{min_y},{max_x},{max_y}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bbox_becomes_closed_ring() {
        let polygon = bbox_to_polygon("10,20,30,40").unwrap();
        let value: Value = serde_json::from_str(&polygon).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "Polygon",
                "coordinates": [[[10, 20], [10, 40], [30, 40], [30, 20], [10, 20]]]
            })
        );
    }

    #[test]
    fn bbox_with_decimals_and_spaces() {
        let polygon = bbox_to_polygon("-71.19, 42.22, -70.98, 42.40").unwrap();
        assert_eq!(polygon_to_bbox(&polygon).as_deref(), Some("-71.19,42.22,-70.98,42.4"));
    }

    #[test]
    fn wrong_cardinality_is_rejected() {
        assert!(bbox_to_polygon("10,20,30").is_err());
        assert!(bbox_to_polygon("10,20,30,40,50").is_err());
        assert!(bbox_to_polygon("").is_err());
    }

    #[test]
    fn non_numeric_component_is_rejected() {
        let err = bbox_to_polygon("10,north,30,40").unwrap_err();
        assert!(err.contains("north"));
    }

    #[test]
    fn polygon_round_trips_to_bbox() {
        let polygon = bbox_to_polygon("10,20,30,40").unwrap();
        assert_eq!(polygon_to_bbox(&polygon).as_deref(), Some("10,20,30,40"));
    }

    #[test]
    fn non_polygon_geometry_is_ignored() {
        assert_eq!(polygon_to_bbox(r#"{"type":"Point","coordinates":[1,2]}"#), None);
        assert_eq!(polygon_to_bbox("not json"), None);
    }
}
