//! Geographic math for the geopoint index.
//!
//! Provides:
//! - Haversine and equirectangular distance calculation
//! - Bounding boxes for search-space pruning
//! - Ray-casting point-in-polygon testing
//! - Distance unit conversion

use crate::data::GeoPoint;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Approximate meters per degree of latitude.
const M_PER_DEG: f64 = 111_320.0;

/// Haversine (great-circle) distance between two points in meters.
///
/// Spherical Earth approximation; accuracy is ~0.3% for practical
/// distances.
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_r = a.lat.to_radians();
    let lat2_r = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (dlon / 2.0).sin().powi(2);

    EARTH_RADIUS_M * 2.0 * h.sqrt().asin()
}

/// Equirectangular distance between two points in meters.
///
/// Cheaper than haversine; good enough at small radii where the
/// projection distortion stays negligible.
pub fn equirectangular_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let mid_lat = ((a.lat + b.lat) / 2.0).to_radians();
    let x = (b.lon - a.lon).to_radians() * mid_lat.cos();
    let y = (b.lat - a.lat).to_radians();
    EARTH_RADIUS_M * (x * x + y * y).sqrt()
}

/// Convert a distance in the given unit to meters.
///
/// Returns `None` for unknown units.
pub fn to_meters(value: f64, unit: &str) -> Option<f64> {
    let factor = match unit {
        "cm" => 0.01,
        "m" => 1.0,
        "km" => 1_000.0,
        "ft" => 0.3048,
        "yd" => 0.9144,
        "mi" => 1_609.344,
        _ => return None,
    };
    Some(value * factor)
}

/// Axis-aligned bounding box in degrees, used to prune tree traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// The box covering the whole coordinate space.
    pub fn everything() -> Self {
        Self {
            min_lat: -90.0,
            max_lat: 90.0,
            min_lon: -180.0,
            max_lon: 180.0,
        }
    }

    /// Box around `center` large enough to contain the disc of
    /// `radius_m` meters. Latitude is clamped; longitude spans widen
    /// with latitude and degrade to the full range near the poles.
    pub fn around(center: GeoPoint, radius_m: f64) -> Self {
        let lat_delta = radius_m / M_PER_DEG;
        let cos_lat = center.lat.to_radians().cos().abs().max(0.001);
        let lon_delta = radius_m / (M_PER_DEG * cos_lat);

        Self {
            min_lat: (center.lat - lat_delta).max(-90.0),
            max_lat: (center.lat + lat_delta).min(90.0),
            min_lon: (center.lon - lon_delta).max(-180.0),
            max_lon: (center.lon + lon_delta).min(180.0),
        }
    }

    /// Smallest box containing all `points`. `None` when empty.
    pub fn of_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };
        for p in &points[1..] {
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.max_lat = bbox.max_lat.max(p.lat);
            bbox.min_lon = bbox.min_lon.min(p.lon);
            bbox.max_lon = bbox.max_lon.max(p.lon);
        }
        Some(bbox)
    }

    /// Whether the point lies inside this box (inclusive).
    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lat >= self.min_lat && p.lat <= self.max_lat && p.lon >= self.min_lon && p.lon <= self.max_lon
    }

    /// Whether two boxes overlap (inclusive).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
            && self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
    }
}

/// Signed shoelace area of a polygon, in squared degrees.
///
/// Zero means the vertices are collinear (degenerate polygon).
pub fn polygon_area(vertices: &[GeoPoint]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        acc += a.lon * b.lat - b.lon * a.lat;
    }
    acc / 2.0
}

/// Ray-casting point-in-polygon test.
///
/// The polygon is implicitly closed (last vertex connects back to the
/// first). Fewer than 3 vertices never contain anything.
pub fn point_in_polygon(p: GeoPoint, vertices: &[GeoPoint]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let vi = vertices[i];
        let vj = vertices[j];
        let crosses = (vi.lat > p.lat) != (vj.lat > p.lat);
        if crosses {
            let intersect_lon = (vj.lon - vi.lon) * (p.lat - vi.lat) / (vj.lat - vi.lat) + vi.lon;
            if p.lon < intersect_lon {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
