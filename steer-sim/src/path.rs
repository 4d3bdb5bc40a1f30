use crate::error::{SteerError, SteerResult};
use crate::math::{Vec3, EPSILON};

/// Result of projecting a point onto the path tube.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathProjection {
    /// Nearest point on the centerline.
    pub point: Vec3,
    /// Distance from the query point to the tube surface; negative inside.
    pub outside: f32,
    /// Unit direction of travel along the segment holding `point`.
    pub tangent: Vec3,
    /// Arc length from the start of the path to `point`.
    pub path_distance: f32,
}

/// Open polyline with a uniform radius. Immutable once built.
#[derive(Clone, Debug)]
pub struct PolylinePath {
    points: Vec<Vec3>,
    radius: f32,
    lengths: Vec<f32>,
    normals: Vec<Vec3>,
    total_length: f32,
}

impl PolylinePath {
    pub fn new(points: Vec<Vec3>, radius: f32) -> SteerResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SteerError::InvalidPath {
                reason: format!("radius must be positive, got {radius}"),
            });
        }
        if points.len() < 2 {
            return Err(SteerError::InvalidPath {
                reason: format!("need at least two waypoints, got {}", points.len()),
            });
        }
        if let Some(bad) = points.iter().position(|p| !p.is_finite()) {
            return Err(SteerError::InvalidPath {
                reason: format!("waypoint {bad} is not finite"),
            });
        }

        let mut lengths = Vec::with_capacity(points.len() - 1);
        let mut normals = Vec::with_capacity(points.len() - 1);
        for (i, pair) in points.windows(2).enumerate() {
            let offset = pair[1] - pair[0];
            let length = offset.length();
            if length <= EPSILON {
                return Err(SteerError::InvalidPath {
                    reason: format!("waypoints {i} and {} coincide", i + 1),
                });
            }
            lengths.push(length);
            normals.push(offset / length);
        }
        let total_length = lengths.iter().sum();

        Ok(Self {
            points,
            radius,
            lengths,
            normals,
            total_length,
        })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn first_point(&self) -> Vec3 {
        self.points[0]
    }

    pub fn last_point(&self) -> Vec3 {
        self.points[self.points.len() - 1]
    }

    pub fn segment_count(&self) -> usize {
        self.lengths.len()
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Point on the centerline at arc length `path_distance`, clamped to the
    /// path's ends.
    pub fn map_path_distance_to_point(&self, path_distance: f32) -> Vec3 {
        if path_distance.is_nan() || path_distance <= 0.0 {
            return self.first_point();
        }
        if path_distance >= self.total_length {
            return self.last_point();
        }

        let mut remaining = path_distance;
        for (i, &length) in self.lengths.iter().enumerate() {
            if remaining <= length {
                return self.points[i] + self.normals[i] * remaining;
            }
            remaining -= length;
        }
        self.last_point()
    }

    /// Arc length at the projection of `point` onto the centerline.
    pub fn map_point_to_path_distance(&self, point: Vec3) -> f32 {
        self.closest_point_on_path(point).path_distance
    }

    pub fn closest_point_on_path(&self, point: Vec3) -> PathProjection {
        let mut best_distance = f32::MAX;
        let mut best = PathProjection {
            point: self.first_point(),
            outside: 0.0,
            tangent: self.normals[0],
            path_distance: 0.0,
        };

        let mut segment_start_distance = 0.0;
        for i in 0..self.segment_count() {
            let (on_segment, projection) = self.point_to_segment(i, point);
            let distance = point.distance(on_segment);
            if distance < best_distance {
                best_distance = distance;
                best = PathProjection {
                    point: on_segment,
                    outside: distance - self.radius,
                    tangent: self.normals[i],
                    path_distance: segment_start_distance + projection,
                };
            }
            segment_start_distance += self.lengths[i];
        }
        best
    }

    pub fn is_inside(&self, point: Vec3) -> bool {
        self.closest_point_on_path(point).outside < 0.0
    }

    fn point_to_segment(&self, segment: usize, point: Vec3) -> (Vec3, f32) {
        let start = self.points[segment];
        let normal = self.normals[segment];
        let length = self.lengths[segment];
        let projection = normal.dot(point - start).clamp(0.0, length);
        (start + normal * projection, projection)
    }
}
