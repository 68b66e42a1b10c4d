//! Canonical geometry and longitude normalization.
//!
//! Spatial coverage arrives in several incompatible encodings. Readers split the
//! source text into numeric tokens and hand them to [`normalize_point`] or
//! [`normalize_bbox`], which build the canonical [`Geometry`] and wrap every
//! longitude into `[-180, 180]`.
//!
//! # Examples
//!
//! ```
//! use mdingest::geometry::{normalize_bbox, normalize_point, BoxOrder};
//!
//! let point = normalize_point(&["200.0", "45.5"]).unwrap();
//! assert_eq!(point.lon(), -160.0);
//!
//! // DCTERMS:Box tokens are declared in south, east, north, west order
//! let bbox = normalize_bbox(&["37.2888", "-32.27982", "37.30134", "-32.275618"],
//!     BoxOrder::SouthEastNorthWest).unwrap();
//! assert_eq!(bbox.south(), 37.2888);
//! ```

use std::fmt;

use serde_json::{json, Value};

use crate::error::ExtractionFailure;

const FIELD: &str = "geometry";

/// Wrap a longitude into `[-180, 180]`.
///
/// Computes `((lon + 180) mod 360) - 180` with a Euclidean remainder, which
/// also repairs providers that encode longitude in `[0, 360)`. Values already
/// inside the range are returned untouched so normalization is idempotent.
#[must_use]
pub fn normalize_lon(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// A point in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    lon: f64,
    lat: f64,
}

impl Point {
    /// Longitude in `[-180, 180]`.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }

    /// Latitude in `[-90, 90]`.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }
}

/// A latitude/longitude bounding box.
///
/// `west` and `east` are normalized independently, so `west > east` is legal
/// and denotes a box crossing the anti-meridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl BoundingBox {
    /// Western limit.
    #[must_use]
    pub const fn west(&self) -> f64 {
        self.west
    }

    /// Southern limit.
    #[must_use]
    pub const fn south(&self) -> f64 {
        self.south
    }

    /// Eastern limit.
    #[must_use]
    pub const fn east(&self) -> f64 {
        self.east
    }

    /// Northern limit.
    #[must_use]
    pub const fn north(&self) -> f64 {
        self.north
    }

    /// True when the box spans the anti-meridian.
    #[must_use]
    pub fn wraps(&self) -> bool {
        self.west > self.east
    }

    /// Render the four limits as tokens in `order`.
    ///
    /// Feeding the result back into [`normalize_bbox`] with the same order
    /// yields an identical box.
    #[must_use]
    pub fn tokens(&self, order: BoxOrder) -> [String; 4] {
        let values = match order {
            BoxOrder::SouthEastNorthWest => [self.south, self.east, self.north, self.west],
            BoxOrder::WestSouthEastNorth => [self.west, self.south, self.east, self.north],
            BoxOrder::NorthSouthEastWest => [self.north, self.south, self.east, self.west],
            BoxOrder::SouthWestNorthEast => [self.south, self.west, self.north, self.east],
        };
        values.map(|v| v.to_string())
    }
}

/// Canonical geometry of a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// A single location.
    Point(Point),
    /// A rectangular extent.
    Box(BoundingBox),
}

impl Geometry {
    /// GeoJSON representation. Boxes become a closed polygon ring.
    #[must_use]
    pub fn to_geojson(&self) -> Value {
        match self {
            Geometry::Point(p) => json!({
                "type": "Point",
                "coordinates": [p.lon, p.lat],
            }),
            Geometry::Box(b) => json!({
                "type": "Polygon",
                "coordinates": [[
                    [b.west, b.south],
                    [b.east, b.south],
                    [b.east, b.north],
                    [b.west, b.north],
                    [b.west, b.south],
                ]],
            }),
        }
    }

    /// Well-known text representation.
    #[must_use]
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Point(p) => write!(f, "POINT ({} {})", p.lon, p.lat),
            Geometry::Box(b) => write!(
                f,
                "POLYGON (({w} {s}, {e} {s}, {e} {n}, {w} {n}, {w} {s}))",
                w = b.west,
                s = b.south,
                e = b.east,
                n = b.north
            ),
        }
    }
}

/// Field order in which an encoding lists the four limits of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxOrder {
    /// `south east north west`, used by bare `DCTERMS:Box` values.
    SouthEastNorthWest,
    /// `west south east north`, the GeoJSON / OGC bbox convention.
    WestSouthEastNorth,
    /// `north south east west`, the order of labelled free-text coverage.
    NorthSouthEastWest,
    /// `south west north east`, the text form of DataCite 3 `geoLocationBox`.
    SouthWestNorthEast,
}

fn parse_coordinate(token: &str) -> Result<f64, ExtractionFailure> {
    let token = token.trim();
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ExtractionFailure::new(
            FIELD,
            format!("not a coordinate: '{token}'"),
        )),
    }
}

fn check_lat(lat: f64) -> Result<f64, ExtractionFailure> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(lat)
    } else {
        Err(ExtractionFailure::new(
            FIELD,
            format!("latitude {lat} outside [-90, 90]"),
        ))
    }
}

/// Build a point from exactly two tokens in `(lon, lat)` order.
///
/// # Errors
///
/// Returns an [`ExtractionFailure`] when the token count is not two, a token
/// is not a finite number, or the latitude is out of range.
pub fn normalize_point<S: AsRef<str>>(values: &[S]) -> Result<Point, ExtractionFailure> {
    let [lon, lat] = values else {
        return Err(ExtractionFailure::new(
            FIELD,
            format!("point needs 2 coordinates, got {}", values.len()),
        ));
    };
    let lon = normalize_lon(parse_coordinate(lon.as_ref())?);
    let lat = check_lat(parse_coordinate(lat.as_ref())?)?;
    Ok(Point { lon, lat })
}

/// Build a bounding box from exactly four tokens in the given `order`.
///
/// East and west are wrapped independently. South and north are taken as the
/// lower and upper latitude, so swapped latitude limits produce the same box.
///
/// # Errors
///
/// Returns an [`ExtractionFailure`] when the token count is not four, a token
/// is not a finite number, or a latitude is out of range.
pub fn normalize_bbox<S: AsRef<str>>(
    values: &[S],
    order: BoxOrder,
) -> Result<BoundingBox, ExtractionFailure> {
    if values.len() != 4 {
        return Err(ExtractionFailure::new(
            FIELD,
            format!("box needs 4 coordinates, got {}", values.len()),
        ));
    }
    let mut nums = [0.0_f64; 4];
    for (slot, token) in nums.iter_mut().zip(values) {
        *slot = parse_coordinate(token.as_ref())?;
    }

    let (west, south, east, north) = match order {
        BoxOrder::SouthEastNorthWest => (nums[3], nums[0], nums[1], nums[2]),
        BoxOrder::WestSouthEastNorth => (nums[0], nums[1], nums[2], nums[3]),
        BoxOrder::NorthSouthEastWest => (nums[3], nums[1], nums[2], nums[0]),
        BoxOrder::SouthWestNorthEast => (nums[1], nums[0], nums[3], nums[2]),
    };
    let south = check_lat(south)?;
    let north = check_lat(north)?;

    Ok(BoundingBox {
        west: normalize_lon(west),
        south: south.min(north),
        east: normalize_lon(east),
        north: south.max(north),
    })
}
