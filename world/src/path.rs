//! Waypoint route walked by every enemy.

use shape_defence_core::Point;
use thiserror::Error;

/// Reasons a waypoint sequence may be rejected as a path.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// A path needs a start and an end.
    #[error("a path needs at least two waypoints, got {count}")]
    TooFewWaypoints {
        /// Number of waypoints supplied.
        count: usize,
    },
    /// Two consecutive waypoints share a position, leaving a zero-length segment.
    #[error("waypoint {index} coincides with the waypoint that follows it")]
    CoincidingWaypoints {
        /// Index of the first waypoint of the degenerate segment.
        index: usize,
    },
}

/// Ordered, immutable sequence of waypoints.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    waypoints: Vec<Point>,
}

impl Path {
    /// Validates and wraps the provided waypoints.
    pub fn new(waypoints: Vec<Point>) -> Result<Self, PathError> {
        if waypoints.len() < 2 {
            return Err(PathError::TooFewWaypoints {
                count: waypoints.len(),
            });
        }

        if let Some(index) = waypoints
            .windows(2)
            .position(|pair| pair[0] == pair[1])
        {
            return Err(PathError::CoincidingWaypoints { index });
        }

        Ok(Self { waypoints })
    }

    /// Returns the waypoint at `index`, or `None` past the end of the path.
    #[must_use]
    pub fn waypoint(&self, index: usize) -> Option<Point> {
        self.waypoints.get(index).copied()
    }

    /// Number of segments connecting consecutive waypoints.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// First waypoint, where enemies enter.
    #[must_use]
    pub fn start(&self) -> Point {
        self.waypoints[0]
    }

    /// All waypoints in walking order.
    #[must_use]
    pub fn waypoints(&self) -> &[Point] {
        &self.waypoints
    }
}

impl Default for Path {
    /// The route of the stock Shape Defence board.
    fn default() -> Self {
        Self {
            waypoints: vec![
                Point::new(0.0, 300.0),
                Point::new(200.0, 300.0),
                Point::new(400.0, 200.0),
                Point::new(600.0, 300.0),
                Point::new(800.0, 300.0),
            ],
        }
    }
}
