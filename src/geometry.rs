//! ## Geometry Kernel
//!
//! The index itself only ever sees envelopes; exact shape work happens behind
//! the [`SpatialGeometry`] trait. Any type exposing bounds, a distance, the
//! two intersection measures and the named predicates can be indexed and
//! joined.
//!
//! The built-in [`Geom`] kernel covers points, line strings and polygons
//! (exterior rings) with planar segment arithmetic: cross-product segment
//! intersection, winding-number containment, parametric clipping against a
//! convex ring and polygon clipping with the shoelace area. Predicates are
//! evaluated for these simple configurations; exotic DE-9IM cases are out of
//! its scope and belong to a full-blown geometry library.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use crate::envelope::EnvelopeVect;
use crate::query::Predicate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A planar coordinate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Coord { x, y }
    }

    pub fn dot(self, other: Coord) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(self, other: Coord) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn distance(self, other: Coord) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Coord { x, y }
    }
}

impl Add for Coord {
    type Output = Coord;
    fn add(self, other: Coord) -> Coord {
        Coord::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Coord {
    type Output = Coord;
    fn sub(self, other: Coord) -> Coord {
        Coord::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Coord {
    type Output = Coord;
    fn mul(self, factor: f64) -> Coord {
        Coord::new(self.x * factor, self.y * factor)
    }
}

/// Tag identifying the kind of a geometry.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeomType {
    Point,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

impl fmt::Display for GeomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeomType::Point => "Point",
            GeomType::LineString => "LineString",
            GeomType::MultiLineString => "MultiLineString",
            GeomType::Polygon => "Polygon",
            GeomType::MultiPolygon => "MultiPolygon",
        };
        f.write_str(name)
    }
}

/// The interface the index and the joins consume. Implement it to plug in a
/// full geometry library; [`Geom`] below is the built-in implementation.
pub trait SpatialGeometry {
    /// `(minx, miny, maxx, maxy)` of the shape, used once to build the index.
    fn bounds(&self) -> (f64, f64, f64, f64);

    fn geom_type(&self) -> GeomType;

    /// Exact Euclidean distance between the shapes, zero if they intersect.
    fn distance(&self, other: &Self) -> f64;

    /// Length of the intersection of the two shapes.
    fn intersection_length(&self, other: &Self) -> f64;

    /// Area of the intersection of the two shapes.
    fn intersection_area(&self, other: &Self) -> f64;

    /// Exact evaluation of `predicate` between the shapes.
    fn relate(&self, other: &Self, predicate: Predicate) -> bool;
}

/// Builds the 2D envelope batch of a geometry collection.
pub fn envelopes_of<G: SpatialGeometry>(geoms: &[G]) -> EnvelopeVect {
    EnvelopeVect::from_bounds(geoms.iter().map(|g| g.bounds()))
}

/// Like [`envelopes_of`] but every envelope is expanded by `buffer` per side,
/// guarding degenerate envelopes against the strict intersection test.
pub fn envelopes_of_buffered<G: SpatialGeometry>(geoms: &[G], buffer: f64) -> EnvelopeVect {
    envelopes_of(geoms).with_buffer(buffer)
}

/// Simple planar geometry: a point, line strings, or polygons given by their
/// exterior rings. Multi parts are assumed disjoint.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Geom {
    Point(Coord),
    LineString(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    Polygon(Vec<Coord>),
    MultiPolygon(Vec<Vec<Coord>>),
}

impl Geom {
    pub fn point(x: f64, y: f64) -> Geom {
        Geom::Point(Coord::new(x, y))
    }

    pub fn line(coords: &[(f64, f64)]) -> Geom {
        Geom::LineString(coords.iter().map(|&c| c.into()).collect())
    }

    pub fn multi_line(parts: &[Vec<(f64, f64)>]) -> Geom {
        Geom::MultiLineString(
            parts
                .iter()
                .map(|part| part.iter().map(|&c| c.into()).collect())
                .collect(),
        )
    }

    /// Builds a polygon from its exterior ring; a duplicated closing
    /// coordinate is dropped.
    pub fn polygon(ring: &[(f64, f64)]) -> Geom {
        Geom::Polygon(open_ring(ring))
    }

    pub fn multi_polygon(rings: &[Vec<(f64, f64)>]) -> Geom {
        Geom::MultiPolygon(rings.iter().map(|ring| open_ring(ring)).collect())
    }

    fn is_polygonal(&self) -> bool {
        matches!(self, Geom::Polygon(_) | Geom::MultiPolygon(_))
    }

    fn all_coords(&self) -> Vec<Coord> {
        match self {
            Geom::Point(p) => vec![*p],
            Geom::LineString(coords) | Geom::Polygon(coords) => coords.clone(),
            Geom::MultiLineString(parts) | Geom::MultiPolygon(parts) => {
                parts.iter().flatten().copied().collect()
            }
        }
    }

    /// Line segments of the shape; polygon rings contribute their closing
    /// edge as well.
    fn segments(&self) -> Vec<(Coord, Coord)> {
        let mut out = Vec::new();
        match self {
            Geom::Point(_) => {}
            Geom::LineString(coords) => push_path_segments(coords, &mut out),
            Geom::MultiLineString(parts) => {
                for part in parts {
                    push_path_segments(part, &mut out);
                }
            }
            Geom::Polygon(ring) => push_ring_segments(ring, &mut out),
            Geom::MultiPolygon(rings) => {
                for ring in rings {
                    push_ring_segments(ring, &mut out);
                }
            }
        }
        out
    }

    /// Coordinates that are not part of any segment (the point case and
    /// degenerate single-coordinate paths).
    fn lone_points(&self) -> Vec<Coord> {
        match self {
            Geom::Point(p) => vec![*p],
            Geom::LineString(coords) if coords.len() == 1 => vec![coords[0]],
            Geom::MultiLineString(parts) => parts
                .iter()
                .filter(|part| part.len() == 1)
                .map(|part| part[0])
                .collect(),
            _ => Vec::new(),
        }
    }

    fn rings(&self) -> Vec<&[Coord]> {
        match self {
            Geom::Polygon(ring) => vec![ring.as_slice()],
            Geom::MultiPolygon(rings) => rings.iter().map(Vec::as_slice).collect(),
            _ => Vec::new(),
        }
    }

    /// Vertices plus segment midpoints; the sampling used by the containment
    /// and crossing tests.
    fn sample_points(&self) -> Vec<Coord> {
        let mut samples = self.all_coords();
        for (start, end) in self.segments() {
            samples.push((start + end) * 0.5);
        }
        samples
    }

    /// True iff `p` lies on the shape (boundary included).
    fn covers_point(&self, p: Coord) -> bool {
        match self {
            Geom::Point(q) => *q == p,
            Geom::LineString(_) | Geom::MultiLineString(_) => self
                .segments()
                .iter()
                .any(|&(start, end)| point_on_segment(p, start, end))
                || self.lone_points().contains(&p),
            Geom::Polygon(_) | Geom::MultiPolygon(_) => self
                .rings()
                .iter()
                .any(|ring| point_in_ring(p, ring) || point_on_ring(p, ring)),
        }
    }

    /// True iff `p` lies in the interior of a polygonal shape.
    fn strictly_inside(&self, p: Coord) -> bool {
        self.rings()
            .iter()
            .any(|ring| point_in_ring(p, ring) && !point_on_ring(p, ring))
    }
}

impl SpatialGeometry for Geom {
    fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut minx = f64::INFINITY;
        let mut miny = f64::INFINITY;
        let mut maxx = f64::NEG_INFINITY;
        let mut maxy = f64::NEG_INFINITY;
        for c in self.all_coords() {
            minx = minx.min(c.x);
            miny = miny.min(c.y);
            maxx = maxx.max(c.x);
            maxy = maxy.max(c.y);
        }
        (minx, miny, maxx, maxy)
    }

    fn geom_type(&self) -> GeomType {
        match self {
            Geom::Point(_) => GeomType::Point,
            Geom::LineString(_) => GeomType::LineString,
            Geom::MultiLineString(_) => GeomType::MultiLineString,
            Geom::Polygon(_) => GeomType::Polygon,
            Geom::MultiPolygon(_) => GeomType::MultiPolygon,
        }
    }

    fn distance(&self, other: &Self) -> f64 {
        if geoms_intersect(self, other) {
            return 0.0;
        }
        let mut best = f64::INFINITY;
        let self_segs = self.segments();
        let other_segs = other.segments();
        for &(a1, a2) in &self_segs {
            for &(b1, b2) in &other_segs {
                best = best.min(segment_distance(a1, a2, b1, b2));
            }
        }
        for p in self.lone_points() {
            for &(b1, b2) in &other_segs {
                best = best.min(point_segment_distance(p, b1, b2));
            }
            for q in other.lone_points() {
                best = best.min(p.distance(q));
            }
        }
        for q in other.lone_points() {
            for &(a1, a2) in &self_segs {
                best = best.min(point_segment_distance(q, a1, a2));
            }
        }
        best
    }

    fn intersection_length(&self, other: &Self) -> f64 {
        let mut total = 0.0;
        if other.is_polygonal() {
            for (a1, a2) in self.segments() {
                for ring in other.rings() {
                    if let Some((start, end)) = clip_segment_to_ring(a1, a2, ring) {
                        total += start.distance(end);
                    }
                }
            }
        } else if self.is_polygonal() {
            return other.intersection_length(self);
        } else {
            for (a1, a2) in self.segments() {
                for (b1, b2) in other.segments() {
                    if let Some((start, end)) = intersect_segments(a1, a2, b1, b2) {
                        total += start.distance(end);
                    }
                }
            }
        }
        total
    }

    fn intersection_area(&self, other: &Self) -> f64 {
        let mut total = 0.0;
        for subject in self.rings() {
            for clip in other.rings() {
                let clipped = clip_ring(subject, clip);
                if clipped.len() >= 3 {
                    total += ring_area_signed(&clipped).abs();
                }
            }
        }
        total
    }

    fn relate(&self, other: &Self, predicate: Predicate) -> bool {
        match predicate {
            Predicate::Intersects => geoms_intersect(self, other),
            Predicate::Contains => contains(self, other),
            Predicate::Within => contains(other, self),
            Predicate::Crosses => crosses(self, other),
            Predicate::Overlaps => overlaps(self, other),
            Predicate::Touches => {
                geoms_intersect(self, other) && !interiors_intersect(self, other)
            }
        }
    }
}

fn open_ring(ring: &[(f64, f64)]) -> Vec<Coord> {
    let mut coords: Vec<Coord> = ring.iter().map(|&c| c.into()).collect();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
}

fn push_path_segments(coords: &[Coord], out: &mut Vec<(Coord, Coord)>) {
    for pair in coords.windows(2) {
        out.push((pair[0], pair[1]));
    }
}

fn push_ring_segments(ring: &[Coord], out: &mut Vec<(Coord, Coord)>) {
    for i in 0..ring.len() {
        out.push((ring[i], ring[(i + 1) % ring.len()]));
    }
}

fn geoms_intersect(a: &Geom, b: &Geom) -> bool {
    let a_segs = a.segments();
    let b_segs = b.segments();
    for &(a1, a2) in &a_segs {
        for &(b1, b2) in &b_segs {
            if intersect_segments(a1, a2, b1, b2).is_some() {
                return true;
            }
        }
    }
    // Segment tests miss full containment; representative points catch it.
    a.all_coords().iter().any(|&p| b.covers_point(p))
        || b.all_coords().iter().any(|&p| a.covers_point(p))
}

fn contains(a: &Geom, b: &Geom) -> bool {
    let samples = b.sample_points();
    if samples.is_empty() {
        return false;
    }
    if a.is_polygonal() {
        samples.iter().all(|&p| a.covers_point(p))
            && samples.iter().any(|&p| a.strictly_inside(p))
    } else {
        samples.iter().all(|&p| a.covers_point(p))
    }
}

fn crosses(a: &Geom, b: &Geom) -> bool {
    match (a.is_polygonal(), b.is_polygonal()) {
        (false, false) => proper_crossing(a, b) && a.intersection_length(b) == 0.0,
        (false, true) => {
            let samples = a.sample_points();
            samples.iter().any(|&p| b.strictly_inside(p))
                && samples.iter().any(|&p| !b.covers_point(p))
        }
        (true, false) => crosses(b, a),
        (true, true) => false,
    }
}

fn overlaps(a: &Geom, b: &Geom) -> bool {
    let shared = if a.is_polygonal() && b.is_polygonal() {
        a.intersection_area(b)
    } else if !a.is_polygonal() && !b.is_polygonal() {
        a.intersection_length(b)
    } else {
        return false;
    };
    shared > 0.0 && !contains(a, b) && !contains(b, a)
}

fn interiors_intersect(a: &Geom, b: &Geom) -> bool {
    if a.is_polygonal() && b.is_polygonal() {
        return a.intersection_area(b) > 0.0;
    }
    if a.is_polygonal() {
        return b.sample_points().iter().any(|&p| a.strictly_inside(p));
    }
    if b.is_polygonal() {
        return a.sample_points().iter().any(|&p| b.strictly_inside(p));
    }
    proper_crossing(a, b) || a.intersection_length(b) > 0.0
}

/// A single-point segment intersection interior to both segments.
fn proper_crossing(a: &Geom, b: &Geom) -> bool {
    for &(a1, a2) in &a.segments() {
        for &(b1, b2) in &b.segments() {
            if let Some((start, end)) = intersect_segments(a1, a2, b1, b2) {
                if start == end
                    && start != a1
                    && start != a2
                    && start != b1
                    && start != b2
                {
                    return true;
                }
            }
        }
    }
    false
}

fn point_on_segment(p: Coord, a: Coord, b: Coord) -> bool {
    if a == b {
        return p == a;
    }
    let d = b - a;
    if d.cross(p - a) != 0.0 {
        return false;
    }
    let t = (p - a).dot(d) / d.dot(d);
    (0.0..=1.0).contains(&t)
}

fn point_segment_distance(p: Coord, a: Coord, b: Coord) -> f64 {
    let d = b - a;
    let len2 = d.dot(d);
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(d) / len2).clamp(0.0, 1.0);
    p.distance(a + d * t)
}

fn segment_distance(a1: Coord, a2: Coord, b1: Coord, b2: Coord) -> f64 {
    if intersect_segments(a1, a2, b1, b2).is_some() {
        return 0.0;
    }
    point_segment_distance(a1, b1, b2)
        .min(point_segment_distance(a2, b1, b2))
        .min(point_segment_distance(b1, a1, a2))
        .min(point_segment_distance(b2, a1, a2))
}

/// Intersection of two segments: a shared point `(p, p)`, the overlap of two
/// collinear segments, or nothing.
fn intersect_segments(a1: Coord, a2: Coord, b1: Coord, b2: Coord) -> Option<(Coord, Coord)> {
    if a1 == a2 {
        return if point_on_segment(a1, b1, b2) {
            Some((a1, a1))
        } else {
            None
        };
    }
    if b1 == b2 {
        return if point_on_segment(b1, a1, a2) {
            Some((b1, b1))
        } else {
            None
        };
    }

    let da = a2 - a1;
    let db = b2 - b1;
    let offset = b1 - a1;
    let denom = da.cross(db);
    let offset_x_da = offset.cross(da);

    if denom == 0.0 {
        // Parallel; disjoint unless the offset is collinear too.
        if offset_x_da != 0.0 {
            return None;
        }
        let len2 = da.dot(da);
        let t0 = offset.dot(da) / len2;
        let t1 = t0 + da.dot(db) / len2;
        let (tmin, tmax) = (t0.min(t1), t0.max(t1));
        if tmin > 1.0 || tmax < 0.0 {
            return None;
        }
        let start = a1 + da * tmin.max(0.0);
        let end = a1 + da * tmax.min(1.0);
        Some((start, end))
    } else {
        let ta = offset.cross(db) / denom;
        let tb = offset_x_da / denom;
        if (0.0..=1.0).contains(&ta) && (0.0..=1.0).contains(&tb) {
            let p = a1 + da * ta;
            Some((p, p))
        } else {
            None
        }
    }
}

fn winding_number(point: Coord, start: Coord, end: Coord) -> i32 {
    let lx = (end.x - start.x) * (point.y - start.y);
    let rx = (end.y - start.y) * (point.x - start.x);

    if start.y <= point.y {
        // Upward crossing
        if end.y > point.y && lx > rx {
            return 1;
        }
    } else {
        // Downward crossing
        if end.y <= point.y && lx < rx {
            return -1;
        }
    }
    0
}

fn point_in_ring(p: Coord, ring: &[Coord]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut wn = 0;
    for i in 0..ring.len() {
        wn += winding_number(p, ring[i], ring[(i + 1) % ring.len()]);
    }
    wn != 0
}

fn point_on_ring(p: Coord, ring: &[Coord]) -> bool {
    (0..ring.len()).any(|i| point_on_segment(p, ring[i], ring[(i + 1) % ring.len()]))
}

fn ring_area_signed(ring: &[Coord]) -> f64 {
    let mut acc = 0.0;
    for i in 0..ring.len() {
        acc += ring[i].cross(ring[(i + 1) % ring.len()]);
    }
    0.5 * acc
}

fn oriented_ccw(ring: &[Coord]) -> Vec<Coord> {
    if ring_area_signed(ring) < 0.0 {
        ring.iter().rev().copied().collect()
    } else {
        ring.to_vec()
    }
}

/// Intersection of the infinite lines through the two segments. Callers only
/// invoke it for segments known to straddle the clip edge.
fn line_intersection(p1: Coord, p2: Coord, q1: Coord, q2: Coord) -> Coord {
    let d1 = p2 - p1;
    let d2 = q2 - q1;
    let denom = d1.cross(d2);
    if denom == 0.0 {
        return p2;
    }
    let t = (q1 - p1).cross(d2) / denom;
    p1 + d1 * t
}

/// Sutherland-Hodgman clipping of `subject` against the convex ring `clip`.
fn clip_ring(subject: &[Coord], clip: &[Coord]) -> Vec<Coord> {
    if subject.len() < 3 || clip.len() < 3 {
        return Vec::new();
    }
    let clip = oriented_ccw(clip);
    let mut output = subject.to_vec();
    for i in 0..clip.len() {
        let c1 = clip[i];
        let c2 = clip[(i + 1) % clip.len()];
        let edge = c2 - c1;
        let input = std::mem::take(&mut output);
        if input.is_empty() {
            break;
        }
        for j in 0..input.len() {
            let current = input[j];
            let previous = input[(j + input.len() - 1) % input.len()];
            let current_in = edge.cross(current - c1) >= 0.0;
            let previous_in = edge.cross(previous - c1) >= 0.0;
            if current_in {
                if !previous_in {
                    output.push(line_intersection(previous, current, c1, c2));
                }
                output.push(current);
            } else if previous_in {
                output.push(line_intersection(previous, current, c1, c2));
            }
        }
    }
    output
}

/// Cyrus-Beck clipping of the segment `a..b` against the convex ring,
/// returning the enclosed sub-segment if any.
fn clip_segment_to_ring(a: Coord, b: Coord, ring: &[Coord]) -> Option<(Coord, Coord)> {
    if ring.len() < 3 {
        return None;
    }
    let ring = oriented_ccw(ring);
    if a == b {
        return if point_in_ring(a, &ring) || point_on_ring(a, &ring) {
            Some((a, a))
        } else {
            None
        };
    }
    let d = b - a;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for i in 0..ring.len() {
        let e1 = ring[i];
        let e2 = ring[(i + 1) % ring.len()];
        let edge = e2 - e1;
        let normal = Coord::new(-edge.y, edge.x);
        let den = normal.dot(d);
        let num = normal.dot(e1 - a);
        if den == 0.0 {
            // Parallel to the edge and outside its half-plane.
            if num > 0.0 {
                return None;
            }
        } else {
            let t = num / den;
            if den > 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
    }
    Some((a + d * t0, a + d * t1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_segment_distance() {
        let a = Coord::new(0.0, 0.0);
        let b = Coord::new(2.0, 0.0);
        assert_eq!(point_segment_distance(Coord::new(1.0, 1.0), a, b), 1.0);
        assert_eq!(point_segment_distance(Coord::new(4.0, 0.0), a, b), 2.0);
        assert_eq!(point_segment_distance(Coord::new(1.0, 0.0), a, b), 0.0);
    }

    #[test]
    fn test_intersect_segments_crossing() {
        let hit = intersect_segments(
            Coord::new(0.0, 0.0),
            Coord::new(2.0, 2.0),
            Coord::new(0.0, 2.0),
            Coord::new(2.0, 0.0),
        )
        .unwrap();
        assert_eq!(hit, (Coord::new(1.0, 1.0), Coord::new(1.0, 1.0)));
    }

    #[test]
    fn test_intersect_segments_collinear_overlap() {
        let (start, end) = intersect_segments(
            Coord::new(0.0, 0.0),
            Coord::new(3.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(5.0, 0.0),
        )
        .unwrap();
        assert_eq!(start, Coord::new(1.0, 0.0));
        assert_eq!(end, Coord::new(3.0, 0.0));
    }

    #[test]
    fn test_intersect_segments_parallel_disjoint() {
        assert!(intersect_segments(
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(0.0, 1.0),
            Coord::new(1.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn test_point_in_ring() {
        let ring = [
            Coord::new(0.0, 0.0),
            Coord::new(4.0, 0.0),
            Coord::new(4.0, 4.0),
            Coord::new(0.0, 4.0),
        ];
        assert!(point_in_ring(Coord::new(2.0, 2.0), &ring));
        assert!(!point_in_ring(Coord::new(5.0, 2.0), &ring));
    }

    #[test]
    fn test_clip_ring_area() {
        let unit = [
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
            Coord::new(0.0, 1.0),
        ];
        let shifted = [
            Coord::new(0.5, 0.5),
            Coord::new(1.5, 0.5),
            Coord::new(1.5, 1.5),
            Coord::new(0.5, 1.5),
        ];
        let clipped = clip_ring(&unit, &shifted);
        assert!((ring_area_signed(&clipped).abs() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_clip_segment_to_ring() {
        let ring = [
            Coord::new(0.0, 0.0),
            Coord::new(2.0, 0.0),
            Coord::new(2.0, 2.0),
            Coord::new(0.0, 2.0),
        ];
        let (start, end) =
            clip_segment_to_ring(Coord::new(-1.0, 1.0), Coord::new(3.0, 1.0), &ring).unwrap();
        assert_eq!(start, Coord::new(0.0, 1.0));
        assert_eq!(end, Coord::new(2.0, 1.0));
        assert!(
            clip_segment_to_ring(Coord::new(-1.0, 3.0), Coord::new(3.0, 3.0), &ring).is_none()
        );
    }

    #[test]
    fn test_geom_distance_lines() {
        let a = Geom::line(&[(0.0, 0.0), (1.0, 1.0)]);
        let b = Geom::line(&[(0.0, 2.0), (1.0, 2.0)]);
        assert!((a.distance(&b) - 1.0).abs() < 1e-12);
        let crossing = Geom::line(&[(0.0, 1.0), (1.0, 0.0)]);
        assert_eq!(a.distance(&crossing), 0.0);
    }

    #[test]
    fn test_geom_distance_polygon_containment() {
        let outer = Geom::polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let inner = Geom::polygon(&[(4.0, 4.0), (5.0, 4.0), (5.0, 5.0), (4.0, 5.0)]);
        assert_eq!(outer.distance(&inner), 0.0);
        assert_eq!(inner.distance(&outer), 0.0);
    }

    #[test]
    fn test_geom_intersection_area() {
        let a = Geom::polygon(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        let b = Geom::polygon(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        assert!((a.intersection_area(&b) - 1.0).abs() < 1e-12);
        assert!((b.intersection_area(&a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_geom_intersection_length_line_in_polygon() {
        let square = Geom::polygon(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        let line = Geom::line(&[(-1.0, 1.0), (3.0, 1.0)]);
        assert!((line.intersection_length(&square) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_relate_contains_within() {
        let outer = Geom::polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let inner = Geom::point(5.0, 5.0);
        assert!(outer.relate(&inner, Predicate::Contains));
        assert!(inner.relate(&outer, Predicate::Within));
        assert!(!inner.relate(&outer, Predicate::Contains));
    }

    #[test]
    fn test_relate_touches_and_crosses() {
        let a = Geom::line(&[(0.0, 0.0), (2.0, 0.0)]);
        let touching = Geom::line(&[(2.0, 0.0), (3.0, 1.0)]);
        assert!(a.relate(&touching, Predicate::Touches));
        assert!(!a.relate(&touching, Predicate::Crosses));

        let crossing = Geom::line(&[(1.0, -1.0), (1.0, 1.0)]);
        assert!(a.relate(&crossing, Predicate::Crosses));
        assert!(!a.relate(&crossing, Predicate::Touches));
    }

    #[test]
    fn test_multi_part_geometries() {
        let lines = Geom::multi_line(&[
            vec![(0.0, 0.0), (1.0, 0.0)],
            vec![(10.0, 0.0), (11.0, 0.0)],
        ]);
        let point = Geom::point(5.0, 0.0);
        assert_eq!(lines.geom_type(), GeomType::MultiLineString);
        assert!((point.distance(&lines) - 4.0).abs() < 1e-12);

        let squares = Geom::multi_polygon(&[
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
            vec![(10.0, 0.0), (11.0, 0.0), (11.0, 1.0), (10.0, 1.0)],
        ]);
        let band = Geom::polygon(&[(-1.0, 0.25), (12.0, 0.25), (12.0, 0.75), (-1.0, 0.75)]);
        assert_eq!(squares.geom_type(), GeomType::MultiPolygon);
        assert!((squares.intersection_area(&band) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_relate_overlaps() {
        let a = Geom::polygon(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        let b = Geom::polygon(&[(1.0, 0.0), (3.0, 0.0), (3.0, 2.0), (1.0, 2.0)]);
        assert!(a.relate(&b, Predicate::Overlaps));
        let disjoint = Geom::polygon(&[(5.0, 5.0), (6.0, 5.0), (6.0, 6.0), (5.0, 6.0)]);
        assert!(!a.relate(&disjoint, Predicate::Overlaps));
    }
}
