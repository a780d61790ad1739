use crate::pose::Point2D;

/// Tick-ordered positions of one tracked joint.
///
/// Append-only within a session; only `reset` shrinks it.
#[derive(Debug, Default, Clone)]
pub struct TrajectoryBuffer {
    points: Vec<Point2D>,
}

impl TrajectoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn last(&self) -> Option<&Point2D> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn reset(&mut self) {
        self.points.clear();
    }
}
