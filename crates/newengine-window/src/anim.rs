use log::trace;
use std::time::Instant;

use crate::stage::Stage;

/// When the next frame is wanted. `Immediate` sorts before any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameDeadline {
    Immediate,
    At(Instant),
}

/// What the engine has to do after [`Animation::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationStep {
    /// Arm the redraw timer for this instant (replacing any armed one).
    pub schedule: Option<Instant>,
    /// Report the new animating state to the driver.
    pub animating_changed: Option<bool>,
}

/// Nearest requested frame deadline and the driver's animating flag.
#[derive(Debug, Default)]
pub struct Animation {
    animating: bool,
    next: Option<FrameDeadline>,
}

impl Animation {
    /// Keep the earliest of the pending and the new deadline.
    #[inline]
    pub fn set_next_frame(&mut self, at: FrameDeadline) {
        match self.next {
            Some(cur) if cur <= at => {}
            _ => self.next = Some(at),
        }
    }

    /// The pending deadline was honored by a frame.
    #[inline]
    pub fn clear(&mut self) {
        self.next = None;
    }

    #[inline]
    pub fn next_frame(&self) -> Option<FrameDeadline> {
        self.next
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn update(&mut self, stage: Stage, now: Instant) -> AnimationStep {
        let mut step = AnimationStep::default();
        let mut animate = false;
        if stage.is_visible() {
            match self.next {
                Some(FrameDeadline::Immediate) => animate = true,
                Some(FrameDeadline::At(t)) if t <= now => animate = true,
                Some(FrameDeadline::At(t)) => step.schedule = Some(t),
                None => {}
            }
        }
        if animate != self.animating {
            self.animating = animate;
            step.animating_changed = Some(animate);
            trace!(target: "window.anim", "animating={}", animate);
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn earliest_deadline_wins() {
        let now = Instant::now();
        let later = now + Duration::from_millis(50);
        let mut a = Animation::default();
        a.set_next_frame(FrameDeadline::At(later));
        a.set_next_frame(FrameDeadline::At(now));
        a.set_next_frame(FrameDeadline::At(later));
        assert_eq!(a.next_frame(), Some(FrameDeadline::At(now)));
        a.set_next_frame(FrameDeadline::Immediate);
        a.set_next_frame(FrameDeadline::At(now));
        assert_eq!(a.next_frame(), Some(FrameDeadline::Immediate));
    }

    #[test]
    fn due_deadline_animates_once() {
        let now = Instant::now();
        let mut a = Animation::default();
        a.set_next_frame(FrameDeadline::Immediate);
        let s = a.update(Stage::Running, now);
        assert_eq!(s.animating_changed, Some(true));
        assert_eq!(s.schedule, None);
        // Still due: no second edge.
        assert_eq!(a.update(Stage::Running, now).animating_changed, None);

        a.clear();
        assert_eq!(a.update(Stage::Running, now).animating_changed, Some(false));
    }

    #[test]
    fn future_deadline_arms_timer() {
        let now = Instant::now();
        let t = now + Duration::from_secs(1);
        let mut a = Animation::default();
        a.set_next_frame(FrameDeadline::At(t));
        let s = a.update(Stage::Inactive, now);
        assert_eq!(s.schedule, Some(t));
        assert_eq!(s.animating_changed, None);
        assert!(!a.is_animating());
    }

    #[test]
    fn paused_window_never_animates() {
        let mut a = Animation::default();
        a.set_next_frame(FrameDeadline::Immediate);
        assert_eq!(a.update(Stage::Paused, Instant::now()), AnimationStep::default());
    }
}
