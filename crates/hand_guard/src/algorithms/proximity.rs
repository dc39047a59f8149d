use std::collections::VecDeque;

use geo::{
    algorithm::line_intersection::{line_intersection, LineIntersection},
    Closest, ClosestPoint, Intersects,
};
use geo_types::{Coord, Line, LineString, Point, Polygon};
use tracing::trace;
use crate::{
    error::{GuardError, Result},
    types::{HazardZone, Hull, Proximity},
};

fn closest_on(ring: &LineString<f32>, p: Point<f32>) -> Option<Point<f32>> {
    match ring.closest_point(&p) {
        Closest::Intersection(q) | Closest::SinglePoint(q) => Some(q),
        Closest::Indeterminate => None,
    }
}

fn closest_in(polygon: &Polygon<f32>, p: Point<f32>) -> Option<Point<f32>> {
    match polygon.closest_point(&p) {
        Closest::Intersection(q) | Closest::SinglePoint(q) => Some(q),
        Closest::Indeterminate => None,
    }
}

fn point(&[x, y]: &[f32; 2]) -> Point<f32> {
    Point::from(Coord { x, y })
}

fn distance(a: Point<f32>, b: Point<f32>) -> f32 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

fn hull_intersects(hull: &Hull, zone: &Polygon<f32>) -> bool {
    match hull.points.as_slice() {
        [] => false,
        [p] => zone.intersects(&point(p)),
        [a, b] => zone.intersects(&Line::new(point(a), point(b))),
        _ => zone.intersects(&hull.to_geo_polygon()),
    }
}

fn hull_edges(hull: &Hull) -> Vec<Line<f32>> {
    match hull.points.as_slice() {
        [] | [_] => Vec::new(),
        [a, b] => vec![Line::new(point(a), point(b))],
        _ => hull.to_geo_polygon().exterior().lines().collect(),
    }
}

fn hull_contains(hull: &Hull, p: Point<f32>) -> bool {
    match hull.points.as_slice() {
        [] => false,
        [q] => point(q) == p,
        [a, b] => Line::new(point(a), point(b)).intersects(&p),
        _ => hull.to_geo_polygon().intersects(&p),
    }
}

/// A point lying on both the hull and the zone, if they touch
fn shared_point(hull: &Hull, zone: &Polygon<f32>) -> Option<Point<f32>> {
    if let Some(vertex) = hull.points.iter().map(point).find(|v| zone.intersects(v)) {
        return Some(vertex);
    }
    if let Some(vertex) = zone.exterior().points().find(|v| hull_contains(hull, *v)) {
        return Some(vertex);
    }
    // Only crossing edges remain
    for hull_edge in hull_edges(hull) {
        for zone_edge in zone.exterior().lines() {
            match line_intersection(hull_edge, zone_edge) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    return Some(intersection.into());
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    return Some(intersection.start.into());
                }
                None => {}
            }
        }
    }
    None
}

/// Closest pair between a hull and a zone.
///
/// On any overlap the distance is 0 and both points are the same shared
/// point. Returns `None` only for an empty hull.
pub fn measure_proximity(hull: &Hull, zone: &Polygon<f32>) -> Option<Proximity> {
    let first = hull.points.first().map(point)?;

    if hull_intersects(hull, zone) {
        let shared = shared_point(hull, zone)
            .or_else(|| closest_in(zone, first))
            .unwrap_or(first);
        return Some(Proximity {
            distance: 0.0,
            hand_point: [shared.x(), shared.y()],
            zone_point: [shared.x(), shared.y()],
        });
    }

    // Hull vertices against the zone boundary
    let mut best: Option<(f32, Point<f32>, Point<f32>)> = None;
    for vertex in hull.points.iter().map(point) {
        if let Some(on_zone) = closest_on(zone.exterior(), vertex) {
            let d = distance(vertex, on_zone);
            if best.is_none_or(|(current, _, _)| d < current) {
                best = Some((d, vertex, on_zone));
            }
        }
    }

    // Zone vertices against the hull boundary catch the edge-to-vertex case
    if hull.len() >= 2 {
        let hull_boundary = if hull.is_degenerate() {
            LineString::from(vec![hull.points[0], hull.points[1]])
        } else {
            hull.to_geo_polygon().exterior().clone()
        };
        for vertex in zone.exterior().points() {
            if let Some(on_hull) = closest_on(&hull_boundary, vertex) {
                let d = distance(vertex, on_hull);
                if best.is_none_or(|(current, _, _)| d < current) {
                    best = Some((d, on_hull, vertex));
                }
            }
        }
    }

    best.map(|(d, hand, zone_point)| Proximity {
        distance: d,
        hand_point: [hand.x(), hand.y()],
        zone_point: [zone_point.x(), zone_point.y()],
    })
}

/// Measures hull-to-zone distance and optionally smooths it over recent frames.
///
/// A window of `n` averages the last `n` raw distances and lags a real
/// change by at most `n - 1` frames. Contact is never smoothed: a raw
/// distance of 0 is reported as 0 immediately.
#[derive(Debug, Clone)]
pub struct ProximityEvaluator {
    zone: HazardZone,
    zone_polygon: Polygon<f32>,
    smoothing_window: usize,
    history: VecDeque<f32>,
}

impl ProximityEvaluator {
    pub fn new(zone: HazardZone, smoothing_window: usize) -> Result<Self> {
        zone.validate()?;
        if smoothing_window == 0 {
            return Err(GuardError::invalid_config("smoothing window must be at least 1"));
        }
        Ok(Self {
            zone_polygon: zone.to_geo_polygon(),
            zone,
            smoothing_window,
            history: VecDeque::with_capacity(smoothing_window),
        })
    }

    pub fn zone(&self) -> &HazardZone {
        &self.zone
    }

    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    /// Frames of output lag introduced by smoothing
    pub fn lag_frames(&self) -> usize {
        self.smoothing_window - 1
    }

    /// Forget buffered distances, e.g. after the hand was lost
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn evaluate(&mut self, hull: &Hull) -> Option<Proximity> {
        let raw = measure_proximity(hull, &self.zone_polygon)?;

        self.history.push_back(raw.distance);
        if self.history.len() > self.smoothing_window {
            self.history.pop_front();
        }

        if raw.is_contact() || self.smoothing_window == 1 {
            return Some(raw);
        }

        let smoothed = self.history.iter().sum::<f32>() / self.history.len() as f32;
        trace!(raw = raw.distance, smoothed, "smoothed distance");
        Some(Proximity {
            distance: smoothed,
            ..raw
        })
    }
}
