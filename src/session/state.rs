//! Session state machine
//!
//! One puzzle session per widget instance. Phases:
//! `Idle → Loading → Ready → Dragging → {Verified, Failed} → (auto) Loading`.
//! Invalid gesture input is a silent no-op; outcomes surface only as
//! [`SessionEvent`]s for the host.
//!
//! Each reset bumps a generation counter. Deferred work (image loads, the
//! failure-reset timer) captures the generation when scheduled and must be
//! discarded on mismatch, so a superseded load can't corrupt a newer session.

use glam::DVec2;

use super::verify::verify;
use crate::config::WidgetConfig;
use crate::consts::EDGE_STOP;
use crate::travel_scale;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created, no puzzle requested yet
    Idle,
    /// Waiting for the background image
    Loading,
    /// Puzzle drawn, slider at rest
    Ready,
    /// Drag gesture in progress
    Dragging,
    /// Solved; locked until an external reset
    Verified,
    /// Last attempt failed; auto-resets after a delay
    Failed,
}

/// Lifecycle notification for the host. Fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new puzzle is being generated; `auto` distinguishes automatic
    /// retries from user-initiated refreshes
    Refresh { auto: bool },
    Success,
    Fail,
}

/// Slider positions produced by an accepted drag movement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragFrame {
    /// Raw horizontal drag distance (knob position)
    pub move_x: f64,
    /// Scaled piece position on the canvas
    pub block_left: f64,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct SessionState {
    width: f64,
    phase: SessionPhase,
    generation: u64,
    notch: Option<DVec2>,
    origin: DVec2,
    move_x: f64,
    block_left: f64,
    trail: Vec<f64>,
}

impl SessionState {
    pub fn new(config: &WidgetConfig) -> Self {
        Self {
            width: config.width as f64,
            phase: SessionPhase::Idle,
            generation: 0,
            notch: None,
            origin: DVec2::ZERO,
            move_x: 0.0,
            block_left: 0.0,
            trail: Vec::new(),
        }
    }

    #[inline]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Notch anchor of the current puzzle, if one is drawn
    #[inline]
    pub fn notch(&self) -> Option<DVec2> {
        self.notch
    }

    #[inline]
    pub fn block_left(&self) -> f64 {
        self.block_left
    }

    #[inline]
    pub fn move_x(&self) -> f64 {
        self.move_x
    }

    /// Whether a manual refresh is currently allowed
    pub fn can_refresh(&self) -> bool {
        !matches!(self.phase, SessionPhase::Loading | SessionPhase::Verified)
    }

    /// Start a new puzzle: supersede any pending work, clear the drag state
    /// and enter `Loading`. Returns the refresh event to forward to the host.
    ///
    /// Manual refreshes (`auto == false`) are no-ops while loading or after a
    /// successful solve; automatic resets are unconditional.
    pub fn begin_reset(&mut self, auto: bool) -> Option<SessionEvent> {
        if !auto && !self.can_refresh() {
            return None;
        }
        self.generation += 1;
        self.phase = SessionPhase::Loading;
        self.notch = None;
        self.origin = DVec2::ZERO;
        self.move_x = 0.0;
        self.block_left = 0.0;
        self.trail.clear();
        Some(SessionEvent::Refresh { auto })
    }

    /// Image arrived and the puzzle was drawn. Stale generations are
    /// discarded; returns whether the session accepted the puzzle.
    pub fn puzzle_ready(&mut self, generation: u64, notch: DVec2) -> bool {
        if generation != self.generation || self.phase != SessionPhase::Loading {
            return false;
        }
        self.notch = Some(notch);
        self.phase = SessionPhase::Ready;
        true
    }

    /// Begin a drag gesture at `pointer` (viewport coordinates).
    ///
    /// Only accepted while a puzzle is on screen and unsolved (`Ready`, or
    /// `Failed` during the pre-reset window).
    pub fn drag_start(&mut self, pointer: DVec2) -> bool {
        if !matches!(self.phase, SessionPhase::Ready | SessionPhase::Failed) {
            return false;
        }
        self.origin = pointer;
        self.phase = SessionPhase::Dragging;
        true
    }

    /// Track a drag movement. Rejects leftward drags and drags that would
    /// push the slider within [`EDGE_STOP`] of the right canvas edge; an
    /// accepted movement updates the slider positions and appends the
    /// vertical delta to the trail.
    pub fn drag_move(&mut self, pointer: DVec2) -> Option<DragFrame> {
        if self.phase != SessionPhase::Dragging {
            return None;
        }
        let delta = pointer - self.origin;
        if delta.x < 0.0 || delta.x + EDGE_STOP >= self.width {
            return None;
        }
        self.move_x = delta.x;
        self.block_left = travel_scale(self.width) * delta.x;
        self.trail.push(delta.y);
        Some(DragFrame {
            move_x: self.move_x,
            block_left: self.block_left,
        })
    }

    /// End the drag and verify. A release at the exact origin x is a no-op
    /// tap: the gesture stays open and nothing is emitted. Otherwise the
    /// verdict moves the session to `Verified` or `Failed` and the matching
    /// event is returned; after a failure the caller schedules an automatic
    /// reset.
    pub fn drag_end(&mut self, pointer_x: f64) -> Option<SessionEvent> {
        if self.phase != SessionPhase::Dragging {
            return None;
        }
        if pointer_x == self.origin.x {
            return None;
        }
        let Some(notch) = self.notch else {
            return None;
        };
        let verdict = verify(&mut self.trail, self.block_left, notch.x);
        if verdict.passed() {
            self.phase = SessionPhase::Verified;
            Some(SessionEvent::Success)
        } else {
            self.phase = SessionPhase::Failed;
            Some(SessionEvent::Fail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WidgetConfig;

    fn ready_session() -> SessionState {
        let mut session = SessionState::new(&WidgetConfig::default());
        session.begin_reset(true);
        let generation = session.generation();
        assert!(session.puzzle_ready(generation, DVec2::new(100.0, 50.0)));
        session
    }

    /// Drag to put block_left exactly on the notch, with human-looking jitter
    fn drag_to_notch(session: &mut SessionState) {
        assert!(session.drag_start(DVec2::new(500.0, 300.0)));
        let target_move = 100.0 / travel_scale(310.0);
        for (i, jitter) in [1.0, -2.0, 3.0, 0.5].iter().enumerate() {
            let x = 500.0 + target_move * (i + 1) as f64 / 4.0;
            assert!(
                session
                    .drag_move(DVec2::new(x, 300.0 + jitter))
                    .is_some()
            );
        }
    }

    #[test]
    fn test_reset_enters_loading_and_emits_refresh() {
        let mut session = SessionState::new(&WidgetConfig::default());
        assert_eq!(session.phase(), SessionPhase::Idle);
        let event = session.begin_reset(true);
        assert_eq!(event, Some(SessionEvent::Refresh { auto: true }));
        assert_eq!(session.phase(), SessionPhase::Loading);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_manual_refresh_blocked_while_loading() {
        let mut session = SessionState::new(&WidgetConfig::default());
        session.begin_reset(true);
        assert_eq!(session.begin_reset(false), None);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_manual_refresh_blocked_after_success() {
        let mut session = ready_session();
        drag_to_notch(&mut session);
        assert_eq!(session.drag_end(700.0), Some(SessionEvent::Success));
        assert_eq!(session.phase(), SessionPhase::Verified);
        assert_eq!(session.begin_reset(false), None);
        // an external/auto reset still unlocks
        assert!(session.begin_reset(true).is_some());
    }

    #[test]
    fn test_stale_puzzle_ready_is_discarded() {
        let mut session = SessionState::new(&WidgetConfig::default());
        session.begin_reset(true);
        let stale = session.generation();
        session.begin_reset(true);
        assert!(!session.puzzle_ready(stale, DVec2::new(90.0, 40.0)));
        assert_eq!(session.phase(), SessionPhase::Loading);
        assert_eq!(session.notch(), None);
    }

    #[test]
    fn test_drag_move_without_start_is_noop() {
        let mut session = ready_session();
        assert_eq!(session.drag_move(DVec2::new(510.0, 301.0)), None);
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.block_left(), 0.0);
    }

    #[test]
    fn test_drag_start_ignored_while_loading() {
        let mut session = SessionState::new(&WidgetConfig::default());
        session.begin_reset(true);
        assert!(!session.drag_start(DVec2::new(500.0, 300.0)));
        assert_eq!(session.phase(), SessionPhase::Loading);
    }

    #[test]
    fn test_drag_start_ignored_after_success() {
        let mut session = ready_session();
        drag_to_notch(&mut session);
        session.drag_end(700.0);
        assert!(!session.drag_start(DVec2::new(500.0, 300.0)));
        assert_eq!(session.phase(), SessionPhase::Verified);
    }

    #[test]
    fn test_drag_move_rejects_leftward_and_edge_overshoot() {
        let mut session = ready_session();
        session.drag_start(DVec2::new(500.0, 300.0));
        assert_eq!(session.drag_move(DVec2::new(499.0, 300.0)), None);
        // 310 - 38 = 272 is the first rejected distance
        assert_eq!(session.drag_move(DVec2::new(772.0, 300.0)), None);
        assert!(session.drag_move(DVec2::new(771.0, 300.0)).is_some());
        assert_eq!(session.move_x(), 271.0);
    }

    #[test]
    fn test_drag_move_scales_block_left() {
        let mut session = ready_session();
        session.drag_start(DVec2::new(500.0, 300.0));
        let frame = session.drag_move(DVec2::new(608.0, 302.0)).unwrap();
        assert_eq!(frame.move_x, 108.0);
        let expected = (310.0 - 60.0) / (310.0 - 40.0) * 108.0;
        assert!((frame.block_left - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_distance_release_keeps_gesture_open() {
        let mut session = ready_session();
        session.drag_start(DVec2::new(500.0, 300.0));
        assert_eq!(session.drag_end(500.0), None);
        assert_eq!(session.phase(), SessionPhase::Dragging);
    }

    #[test]
    fn test_drag_end_without_gesture_is_noop() {
        let mut session = ready_session();
        assert_eq!(session.drag_end(700.0), None);
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_flat_trail_fails_even_when_aligned() {
        let mut session = ready_session();
        session.drag_start(DVec2::new(500.0, 300.0));
        let target_move = 100.0 / travel_scale(310.0);
        for step in 1..=4 {
            // perfectly horizontal, machine-like drag
            let x = 500.0 + target_move * step as f64 / 4.0;
            assert!(session.drag_move(DVec2::new(x, 300.0)).is_some());
        }
        assert_eq!(session.drag_end(700.0), Some(SessionEvent::Fail));
        assert_eq!(session.phase(), SessionPhase::Failed);
    }

    #[test]
    fn test_misaligned_drag_fails_despite_jitter() {
        let mut session = ready_session();
        session.drag_start(DVec2::new(500.0, 300.0));
        for (i, jitter) in [2.0, -1.0, 4.0, 0.0].iter().enumerate() {
            let x = 500.0 + 20.0 * (i + 1) as f64;
            assert!(session.drag_move(DVec2::new(x, 300.0 + jitter)).is_some());
        }
        assert_eq!(session.drag_end(580.0), Some(SessionEvent::Fail));
    }

    #[test]
    fn test_failed_session_allows_retry_and_auto_reset() {
        let mut session = ready_session();
        session.drag_start(DVec2::new(500.0, 300.0));
        session.drag_move(DVec2::new(520.0, 300.0));
        assert_eq!(session.drag_end(520.0 + 1.0), Some(SessionEvent::Fail));

        // re-drag during the pre-reset window is allowed
        assert!(session.drag_start(DVec2::new(500.0, 300.0)));

        // the scheduled auto reset supersedes everything
        let generation = session.generation();
        assert_eq!(
            session.begin_reset(true),
            Some(SessionEvent::Refresh { auto: true })
        );
        assert_eq!(session.generation(), generation + 1);
        assert_eq!(session.phase(), SessionPhase::Loading);
        assert_eq!(session.notch(), None);
        assert_eq!(session.block_left(), 0.0);
    }

    #[test]
    fn test_drag_move_after_auto_reset_is_noop() {
        let mut session = ready_session();
        session.drag_start(DVec2::new(500.0, 300.0));
        session.begin_reset(true);
        assert_eq!(session.drag_move(DVec2::new(600.0, 300.0)), None);
        assert_eq!(session.block_left(), 0.0);
    }
}
