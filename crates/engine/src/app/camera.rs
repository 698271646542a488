use thiserror::Error;
use tracing::{info, warn};

use super::actor::ActorId;
use super::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("cannot lock camera on {target}: no relative offset configured")]
    OffsetNotConfigured { target: ActorId },
}

/// `position` is the top-left corner of the visible area. While a target is locked,
/// `update` pins it to the target's position plus the relative offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    viewport_size: Vec2,
    position: Vec2,
    target: Option<ActorId>,
    relative_offset: Option<Vec2>,
}

impl Camera {
    pub fn new(viewport_size: Vec2, position: Vec2) -> Self {
        Self {
            viewport_size,
            position,
            target: None,
            relative_offset: None,
        }
    }

    pub fn with_relative_offset(mut self, offset: Vec2) -> Self {
        self.relative_offset = Some(offset);
        self
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn relative_offset(&self) -> Option<Vec2> {
        self.relative_offset
    }

    pub fn target(&self) -> Option<ActorId> {
        self.target
    }

    pub fn is_locked(&self) -> bool {
        self.target.is_some()
    }

    pub fn lock_target(&mut self, target: ActorId) -> Result<(), CameraError> {
        if self.relative_offset.is_none() {
            return Err(CameraError::OffsetNotConfigured { target });
        }
        self.target = Some(target);
        info!(target = %target, "camera_locked");
        Ok(())
    }

    pub fn unlock_target(&mut self) {
        if let Some(target) = self.target.take() {
            info!(target = %target, "camera_unlocked");
        }
    }

    /// A target that no longer resolves unlocks the camera.
    pub fn update<F>(&mut self, target_position: F)
    where
        F: FnOnce(ActorId) -> Option<Vec2>,
    {
        let (Some(target), Some(offset)) = (self.target, self.relative_offset) else {
            return;
        };
        match target_position(target) {
            Some(position) => self.position = position + offset,
            None => {
                warn!(target = %target, "camera_target_missing");
                self.unlock_target();
            }
        }
    }

    pub fn viewport_rect(&self) -> Rect {
        Rect::from_position_size(self.position, self.viewport_size)
    }

    pub fn is_rect_visible(&self, rect: &Rect) -> bool {
        rect.overlaps(&self.viewport_rect())
    }

    pub fn world_to_screen(&self, world_position: Vec2) -> Vec2 {
        world_position - self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: ActorId = ActorId(1);

    fn viewport() -> Vec2 {
        Vec2::new(640.0, 480.0)
    }

    #[test]
    fn locking_without_offset_is_rejected() {
        let mut camera = Camera::new(viewport(), Vec2::ZERO);
        let err = camera.lock_target(TARGET).expect_err("no offset");

        assert_eq!(err, CameraError::OffsetNotConfigured { target: TARGET });
        assert!(!camera.is_locked());
    }

    #[test]
    fn locked_camera_tracks_target_plus_offset() {
        let mut camera =
            Camera::new(viewport(), Vec2::ZERO).with_relative_offset(Vec2::new(0.0, -200.0));
        camera.lock_target(TARGET).expect("lock");

        camera.update(|id| (id == TARGET).then_some(Vec2::new(100.0, -50.0)));
        assert_eq!(camera.position(), Vec2::new(100.0, -250.0));

        camera.update(|_| Some(Vec2::new(110.0, -40.0)));
        assert_eq!(camera.position(), Vec2::new(110.0, -240.0));
    }

    #[test]
    fn locked_camera_overrides_external_position() {
        let mut camera =
            Camera::new(viewport(), Vec2::ZERO).with_relative_offset(Vec2::new(5.0, 5.0));
        camera.lock_target(TARGET).expect("lock");
        camera.set_position(Vec2::new(999.0, 999.0));

        camera.update(|_| Some(Vec2::new(1.0, 1.0)));

        assert_eq!(camera.position(), Vec2::new(6.0, 6.0));
    }

    #[test]
    fn unlock_freezes_last_position() {
        let mut camera =
            Camera::new(viewport(), Vec2::ZERO).with_relative_offset(Vec2::new(0.0, -200.0));
        camera.lock_target(TARGET).expect("lock");
        camera.update(|_| Some(Vec2::new(100.0, -50.0)));

        camera.unlock_target();
        camera.update(|_| Some(Vec2::new(500.0, 500.0)));

        assert!(!camera.is_locked());
        assert_eq!(camera.position(), Vec2::new(100.0, -250.0));
    }

    #[test]
    fn unlocked_update_is_noop_and_position_is_settable() {
        let mut camera = Camera::new(viewport(), Vec2::new(3.0, 4.0));
        camera.update(|_| panic!("unlocked camera must not resolve a target"));
        assert_eq!(camera.position(), Vec2::new(3.0, 4.0));

        camera.set_position(Vec2::new(-7.0, 2.0));
        camera.update(|_| None);
        assert_eq!(camera.position(), Vec2::new(-7.0, 2.0));
    }

    #[test]
    fn missing_target_unlocks_and_keeps_position() {
        let mut camera =
            Camera::new(viewport(), Vec2::ZERO).with_relative_offset(Vec2::new(1.0, 1.0));
        camera.lock_target(TARGET).expect("lock");
        camera.update(|_| Some(Vec2::new(10.0, 10.0)));

        camera.update(|_| None);

        assert!(!camera.is_locked());
        assert_eq!(camera.position(), Vec2::new(11.0, 11.0));
    }

    #[test]
    fn visibility_uses_world_space_viewport() {
        let camera = Camera::new(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0));

        assert!(camera.is_rect_visible(&Rect::new(40.0, 40.0, 20.0, 20.0)));
        assert!(camera.is_rect_visible(&Rect::new(140.0, 140.0, 20.0, 20.0)));
        assert!(!camera.is_rect_visible(&Rect::new(0.0, 0.0, 50.0, 50.0)));
        assert!(!camera.is_rect_visible(&Rect::new(150.0, 60.0, 10.0, 10.0)));
    }

    #[test]
    fn world_to_screen_subtracts_camera_position() {
        let camera = Camera::new(viewport(), Vec2::new(100.0, -250.0));
        assert_eq!(
            camera.world_to_screen(Vec2::new(100.0, -50.0)),
            Vec2::new(0.0, 200.0)
        );
    }
}
