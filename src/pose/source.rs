use super::keypoint::Pose;

/// Per-frame body landmark detection.
///
/// `None` means no body was found. Implementations swallow their own
/// failures (logging them) and report them as `None`.
pub trait LandmarkSource<F> {
    fn detect(&mut self, frame: &F) -> Option<Pose>;
}

impl<F, S: LandmarkSource<F> + ?Sized> LandmarkSource<F> for Box<S> {
    fn detect(&mut self, frame: &F) -> Option<Pose> {
        (**self).detect(frame)
    }
}
