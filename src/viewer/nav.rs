//! Page navigation state machine for an open viewer.
//!
//! The controller owns the current logical page and the legality of
//! single-step navigation. Whether a neighbouring page exists is not known
//! a priori (it has to be asked of the backend), so every position change
//! schedules a bounds probe and the controller sits in [`NavState::Probing`]
//! until the matching result comes back.
//!
//! Probes are tagged with the page they were issued for. Rapid input can
//! leave several probes in flight at once; only the result whose tag still
//! matches the current page may update the bounds, and everything else is
//! dropped on arrival. The controller itself performs no I/O: callers take
//! the [`ProbeRequest`] it hands out, ask the existence oracle, and feed the
//! [`ProbeOutcome`] back in.

use super::align::raw_page_index;

/// How far the multi-page jump operations move by default.
pub const JUMP_STRIDE: i64 = 5;

/// Lifecycle state of a navigation controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// No session opened yet.
    Idle,
    /// Bounds are known for the current page; input is accepted.
    Ready,
    /// A bounds probe is in flight; single-step input is suppressed.
    Probing,
    /// Terminal. A closed controller ignores everything, including probes.
    Closed,
}

/// Navigability of the current page, as last derived.
///
/// Bounds are only trustworthy while `is_checking` is false; they go stale
/// the instant the page changes and are re-derived by the next probe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavBounds {
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub is_checking: bool,
}

/// A bounds probe issued for a specific page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRequest {
    /// The logical page this probe was issued for; doubles as the
    /// staleness tag.
    pub page: i64,
}

impl ProbeRequest {
    /// Raw index to probe for the backward bound, or `None` when the page
    /// has no predecessor to navigate to.
    pub fn previous_target(&self) -> Option<i64> {
        (self.page > 0).then(|| self.page - 1)
    }

    /// Raw index to probe for the forward bound.
    pub fn next_target(&self) -> i64 {
        raw_page_index(self.page + 1)
    }
}

/// Result of executing a [`ProbeRequest`] against the existence oracle.
///
/// A probe that failed at the transport level reports `false` for the
/// affected side: the system never offers navigation into unknown territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Tag copied from the request this outcome answers.
    pub page: i64,
    pub previous_exists: bool,
    pub next_exists: bool,
}

/// State machine owning the current page of one viewer session.
#[derive(Debug)]
pub struct NavController {
    state: NavState,
    current_page: i64,
    can_go_previous: bool,
    can_go_next: bool,
}

impl NavController {
    pub fn new() -> Self {
        Self {
            state: NavState::Idle,
            current_page: 0,
            can_go_previous: false,
            can_go_next: false,
        }
    }

    /// Open at a starting page. Valid once, from `Idle`; immediately
    /// schedules the first bounds probe.
    pub fn open(&mut self, start_page: i64) -> Option<ProbeRequest> {
        if self.state != NavState::Idle {
            return None;
        }
        self.current_page = start_page;
        Some(self.schedule_probe())
    }

    /// Step back one page. No-op unless bounds are known and allow it.
    pub fn previous_page(&mut self) -> Option<ProbeRequest> {
        if self.state != NavState::Ready || !self.can_go_previous {
            return None;
        }
        self.current_page -= 1;
        Some(self.schedule_probe())
    }

    /// Step forward one page. No-op unless bounds are known and allow it.
    pub fn next_page(&mut self) -> Option<ProbeRequest> {
        if self.state != NavState::Ready || !self.can_go_next {
            return None;
        }
        self.current_page += 1;
        Some(self.schedule_probe())
    }

    /// Jump back `n` pages, clamped at 0. Unlike single steps this is not
    /// gated on known bounds and may be issued while a probe is still in
    /// flight, superseding it. No-op when the clamped target equals the
    /// current page.
    pub fn jump_back(&mut self, n: i64) -> Option<ProbeRequest> {
        if !self.accepts_jumps() {
            return None;
        }
        let target = (self.current_page - n.max(0)).max(0);
        if target == self.current_page {
            return None;
        }
        self.current_page = target;
        Some(self.schedule_probe())
    }

    /// Jump forward `n` pages, unconditionally. The landing page's existence
    /// is validated retroactively by the probe this schedules; until then
    /// the display may show a nonexistent page, which the user backs out of.
    pub fn jump_forward(&mut self, n: i64) -> Option<ProbeRequest> {
        if !self.accepts_jumps() || n <= 0 {
            return None;
        }
        self.current_page += n;
        Some(self.schedule_probe())
    }

    /// Set the page directly. Like the jumps, not gated on bounds.
    pub fn set_page(&mut self, page: i64) -> Option<ProbeRequest> {
        if !self.accepts_jumps() || page == self.current_page {
            return None;
        }
        self.current_page = page;
        Some(self.schedule_probe())
    }

    /// Feed a completed probe back in. Returns `true` when the outcome was
    /// applied; stale outcomes (tag no longer matching the current page) and
    /// anything arriving after `close()` are dropped.
    pub fn complete_probe(&mut self, outcome: ProbeOutcome) -> bool {
        match self.state {
            NavState::Idle | NavState::Closed => false,
            NavState::Ready | NavState::Probing => {
                if outcome.page != self.current_page {
                    tracing::debug!(
                        probed = outcome.page,
                        current = self.current_page,
                        "dropping stale probe result"
                    );
                    return false;
                }
                self.can_go_previous = outcome.previous_exists;
                self.can_go_next = outcome.next_exists;
                self.state = NavState::Ready;
                true
            }
        }
    }

    /// Close the controller. Always legal, idempotent.
    pub fn close(&mut self) {
        self.state = NavState::Closed;
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn current_page(&self) -> i64 {
        self.current_page
    }

    pub fn bounds(&self) -> NavBounds {
        NavBounds {
            can_go_previous: self.can_go_previous,
            can_go_next: self.can_go_next,
            is_checking: self.state == NavState::Probing,
        }
    }

    fn accepts_jumps(&self) -> bool {
        matches!(self.state, NavState::Ready | NavState::Probing)
    }

    /// Invalidate bounds for the (new) current page and enter `Probing`.
    fn schedule_probe(&mut self) -> ProbeRequest {
        self.can_go_previous = false;
        self.can_go_next = false;
        self.state = NavState::Probing;
        ProbeRequest {
            page: self.current_page,
        }
    }
}

impl Default for NavController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Controller opened at `page` with both bounds reported open.
    fn ready_at(page: i64) -> NavController {
        let mut nav = NavController::new();
        let req = nav.open(page).unwrap();
        assert!(nav.complete_probe(ProbeOutcome {
            page: req.page,
            previous_exists: true,
            next_exists: true,
        }));
        nav
    }

    #[test]
    fn open_schedules_initial_probe() {
        let mut nav = NavController::new();
        let req = nav.open(8).unwrap();
        assert_eq!(req.page, 8);
        assert_eq!(nav.state(), NavState::Probing);
        assert!(nav.bounds().is_checking);
        // Opening twice is rejected.
        assert!(nav.open(3).is_none());
    }

    #[test]
    fn bounds_follow_independent_existence_checks() {
        let mut nav = NavController::new();
        nav.open(8);
        // Probe for page 7 true, page 9 false.
        nav.complete_probe(ProbeOutcome {
            page: 8,
            previous_exists: true,
            next_exists: false,
        });
        let bounds = nav.bounds();
        assert!(bounds.can_go_previous);
        assert!(!bounds.can_go_next);
        assert!(!bounds.is_checking);
    }

    #[test]
    fn single_steps_gated_on_bounds() {
        let mut nav = NavController::new();
        nav.open(8);
        nav.complete_probe(ProbeOutcome {
            page: 8,
            previous_exists: false,
            next_exists: true,
        });
        assert!(nav.previous_page().is_none());
        assert_eq!(nav.current_page(), 8);

        let req = nav.next_page().unwrap();
        assert_eq!(req.page, 9);
        assert_eq!(nav.current_page(), 9);
        assert_eq!(nav.state(), NavState::Probing);
    }

    #[test]
    fn single_steps_suppressed_while_probing() {
        let mut nav = ready_at(5);
        nav.next_page().unwrap();
        // Probe for page 6 is in flight; arrows must be ignored.
        assert!(nav.next_page().is_none());
        assert!(nav.previous_page().is_none());
        assert_eq!(nav.current_page(), 6);
    }

    #[test]
    fn stale_probe_result_is_dropped() {
        let mut nav = ready_at(5);
        nav.jump_forward(5).unwrap();
        assert_eq!(nav.current_page(), 10);

        // Late answer for page 5 must not touch page 10's bounds.
        assert!(!nav.complete_probe(ProbeOutcome {
            page: 5,
            previous_exists: true,
            next_exists: true,
        }));
        assert_eq!(nav.state(), NavState::Probing);
        assert!(!nav.bounds().can_go_next);

        assert!(nav.complete_probe(ProbeOutcome {
            page: 10,
            previous_exists: true,
            next_exists: false,
        }));
        assert_eq!(nav.state(), NavState::Ready);
        assert!(nav.bounds().can_go_previous);
    }

    #[test]
    fn jump_forward_never_blocks() {
        let mut nav = NavController::new();
        nav.open(2);
        nav.complete_probe(ProbeOutcome {
            page: 2,
            previous_exists: false,
            next_exists: false,
        });
        // can_go_next is false, the jump moves anyway.
        let req = nav.jump_forward(JUMP_STRIDE).unwrap();
        assert_eq!(nav.current_page(), 7);
        assert_eq!(req.page, 7);
    }

    #[test]
    fn jump_back_clamps_at_zero() {
        let mut nav = ready_at(3);
        nav.jump_back(5).unwrap();
        assert_eq!(nav.current_page(), 0);

        // Already at the clamp: no movement, no probe.
        nav.complete_probe(ProbeOutcome {
            page: 0,
            previous_exists: false,
            next_exists: true,
        });
        assert!(nav.jump_back(5).is_none());
        assert_eq!(nav.state(), NavState::Ready);
    }

    #[test]
    fn jumps_supersede_inflight_probes() {
        let mut nav = ready_at(5);
        nav.jump_forward(5).unwrap();
        let req = nav.jump_forward(5).unwrap();
        assert_eq!(req.page, 15);
        // Both older probes are now stale.
        assert!(!nav.complete_probe(ProbeOutcome {
            page: 5,
            previous_exists: true,
            next_exists: true,
        }));
        assert!(!nav.complete_probe(ProbeOutcome {
            page: 10,
            previous_exists: true,
            next_exists: true,
        }));
    }

    #[test]
    fn probe_targets_skip_nonexistent_predecessor() {
        let req = ProbeRequest { page: 0 };
        assert_eq!(req.previous_target(), None);
        assert_eq!(req.next_target(), 1);

        let req = ProbeRequest { page: 8 };
        assert_eq!(req.previous_target(), Some(7));
        assert_eq!(req.next_target(), 9);

        // Transiently negative position: forward target clamps to raw 0.
        let req = ProbeRequest { page: -3 };
        assert_eq!(req.previous_target(), None);
        assert_eq!(req.next_target(), 0);
    }

    #[test]
    fn closed_controller_ignores_everything() {
        let mut nav = ready_at(4);
        nav.close();
        nav.close(); // idempotent
        assert_eq!(nav.state(), NavState::Closed);
        assert!(nav.next_page().is_none());
        assert!(nav.jump_forward(5).is_none());
        assert!(!nav.complete_probe(ProbeOutcome {
            page: 4,
            previous_exists: true,
            next_exists: true,
        }));
    }

    #[test]
    fn set_page_reprobes_only_on_change() {
        let mut nav = ready_at(4);
        assert!(nav.set_page(4).is_none());
        let req = nav.set_page(-2).unwrap();
        assert_eq!(req.page, -2);
        assert_eq!(nav.current_page(), -2);
    }
}
