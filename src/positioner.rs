//! Floating menu placement and show/hide transitions.
//!
//! # Placement
//!
//! `place_menu` takes the selection's viewport-space anchor, the menu's
//! measured size and the viewport, and returns a document-space rectangle:
//!
//! - horizontally centered on the anchor, clamped to `edge_margin` from the
//!   left and right edges
//! - below the anchor, flipped above it when below would overflow the bottom
//! - vertically clamped to the same margin so a tall menu near the top edge
//!   still stays on screen
//!
//! # Transitions
//!
//! [`MenuTransition`] models the two-phase reveal (mount invisible, lay out,
//! animate in) and the delayed removal after hiding. There is only ever one
//! element: a show during the hide animation takes the element back instead
//! of mounting a second one.

use std::time::{Duration, Instant};

use crate::geometry::{Rect, Size, Viewport};

/// Hide animation length; the element is removed once it has elapsed.
pub const DURATION_HIDE: Duration = Duration::from_millis(200);

/// Vertical slide distance of the reveal animation.
pub const REVEAL_OFFSET_Y: f32 = 10.0;

/// Which side of the anchor the menu ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Below,
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Document-space rectangle of the menu
    pub rect: Rect,
    pub side: Side,
}

/// Compute where the menu goes. See the module docs for the rules.
pub fn place_menu(anchor: Rect, menu: Size, viewport: Viewport, edge_margin: f64) -> Placement {
    let Viewport {
        width: vw,
        height: vh,
        scroll_x,
        scroll_y,
    } = viewport;

    let mut side = Side::Below;
    let mut top = anchor.bottom() + scroll_y;
    if anchor.bottom() + menu.height > vh - edge_margin {
        side = Side::Above;
        top = anchor.top + scroll_y - menu.height;
    }

    let min_top = scroll_y + edge_margin;
    let max_top = scroll_y + vh - menu.height - edge_margin;
    top = clamp_lenient(top, min_top, max_top);

    let centered = anchor.left + scroll_x - menu.width / 2.0 + anchor.width / 2.0;
    let min_left = scroll_x + edge_margin;
    let max_left = scroll_x + vw - menu.width - edge_margin;
    let left = clamp_lenient(centered, min_left, max_left);

    Placement {
        rect: Rect::new(left, top, menu.width, menu.height),
        side,
    }
}

/// `clamp` that prefers `min` when the range is empty (menu larger than viewport).
fn clamp_lenient(value: f64, min: f64, max: f64) -> f64 {
    if max < min {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Quadratic ease out, for the reveal.
#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Opacity and slide offset a renderer should apply to the menu element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub opacity: f32,
    pub offset_y: f32,
}

impl Appearance {
    pub const HIDDEN: Self = Self {
        opacity: 0.0,
        offset_y: REVEAL_OFFSET_Y,
    };
    pub const VISIBLE: Self = Self {
        opacity: 1.0,
        offset_y: 0.0,
    };

    pub fn lerp(&self, to: &Self, delta: f32) -> Self {
        Self {
            opacity: self.opacity + (to.opacity - self.opacity) * delta,
            offset_y: self.offset_y + (to.offset_y - self.offset_y) * delta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuPhase {
    /// Not in the interactive layer at all.
    Removed,
    /// Mounted at its target position but invisible; waiting for layout.
    Mounted,
    /// Animating or animated in.
    Visible { since: Instant },
    /// Fading out; removed once `until` passes.
    Hiding { since: Instant, until: Instant },
}

/// Show/hide state of the single menu element of a surface.
#[derive(Debug)]
pub struct MenuTransition {
    phase: MenuPhase,
    hide_duration: Duration,
    mounts: u64,
}

impl MenuTransition {
    pub fn new(hide_duration: Duration) -> Self {
        Self {
            phase: MenuPhase::Removed,
            hide_duration,
            mounts: 0,
        }
    }

    pub fn phase(&self) -> MenuPhase {
        self.phase
    }

    /// Phase one of the reveal: mount invisible at the target position.
    ///
    /// A menu that is still fading out is reused rather than mounted again.
    pub fn show(&mut self) {
        if matches!(self.phase, MenuPhase::Removed) {
            self.mounts += 1;
        }
        self.phase = MenuPhase::Mounted;
    }

    /// Phase two: layout has happened, start animating in.
    pub fn layout_done(&mut self, now: Instant) {
        if matches!(self.phase, MenuPhase::Mounted) {
            self.phase = MenuPhase::Visible { since: now };
        }
    }

    /// Start the hide animation. No-op when already hiding or removed.
    pub fn hide(&mut self, now: Instant) {
        match self.phase {
            MenuPhase::Mounted | MenuPhase::Visible { .. } => {
                self.phase = MenuPhase::Hiding {
                    since: now,
                    until: now + self.hide_duration,
                };
            }
            MenuPhase::Hiding { .. } | MenuPhase::Removed => {}
        }
    }

    /// Advance timers. Returns true when the element was removed by this call.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let MenuPhase::Hiding { until, .. } = self.phase {
            if now >= until {
                self.phase = MenuPhase::Removed;
                return true;
            }
        }
        false
    }

    /// When the next `tick` can change anything.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            MenuPhase::Hiding { until, .. } => Some(until),
            _ => None,
        }
    }

    /// Still part of the interactive layer (including while fading out).
    pub fn is_mounted(&self) -> bool {
        !matches!(self.phase, MenuPhase::Removed)
    }

    /// Shown or on its way in; what surface events treat as "menu visible".
    pub fn is_shown(&self) -> bool {
        matches!(self.phase, MenuPhase::Mounted | MenuPhase::Visible { .. })
    }

    /// Number of times an element was mounted from scratch.
    pub fn mount_count(&self) -> u64 {
        self.mounts
    }

    pub fn appearance(&self, now: Instant) -> Appearance {
        let progress = |since: Instant, total: Duration| -> f32 {
            if total.is_zero() {
                return 1.0;
            }
            (now.saturating_duration_since(since).as_secs_f32() / total.as_secs_f32()).min(1.0)
        };
        match self.phase {
            MenuPhase::Removed | MenuPhase::Mounted => Appearance::HIDDEN,
            MenuPhase::Visible { since } => Appearance::HIDDEN.lerp(
                &Appearance::VISIBLE,
                ease_out_quad(progress(since, self.hide_duration)),
            ),
            MenuPhase::Hiding { since, .. } => {
                Appearance::VISIBLE.lerp(&Appearance::HIDDEN, progress(since, self.hide_duration))
            }
        }
    }
}

impl Default for MenuTransition {
    fn default() -> Self {
        Self::new(DURATION_HIDE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARGIN: f64 = 10.0;

    fn inner(viewport: Viewport) -> Rect {
        let doc = viewport.document_rect();
        Rect::new(
            doc.left + MARGIN,
            doc.top + MARGIN,
            doc.width - 2.0 * MARGIN,
            doc.height - 2.0 * MARGIN,
        )
    }

    #[test]
    fn centers_below_the_anchor() {
        let viewport = Viewport::new(1000.0, 800.0);
        let p = place_menu(
            Rect::new(400.0, 100.0, 200.0, 20.0),
            Size::new(120.0, 40.0),
            viewport,
            MARGIN,
        );
        assert_eq!(p.side, Side::Below);
        assert_eq!(p.rect, Rect::new(440.0, 120.0, 120.0, 40.0));
    }

    #[test]
    fn flips_above_near_the_bottom() {
        let viewport = Viewport::new(1000.0, 800.0);
        let p = place_menu(
            Rect::new(400.0, 770.0, 100.0, 20.0),
            Size::new(120.0, 40.0),
            viewport,
            MARGIN,
        );
        assert_eq!(p.side, Side::Above);
        assert_eq!(p.rect.top, 730.0);
    }

    #[test]
    fn clamps_at_left_and_right_edges() {
        let viewport = Viewport::new(1000.0, 800.0);
        let left = place_menu(
            Rect::new(0.0, 100.0, 10.0, 20.0),
            Size::new(200.0, 40.0),
            viewport,
            MARGIN,
        );
        assert_eq!(left.rect.left, 10.0);

        let right = place_menu(
            Rect::new(990.0, 100.0, 10.0, 20.0),
            Size::new(200.0, 40.0),
            viewport,
            MARGIN,
        );
        assert_eq!(right.rect.left, 1000.0 - 200.0 - 10.0);
    }

    #[test]
    fn result_is_in_document_space() {
        let viewport = Viewport::new(1000.0, 800.0).scrolled(30.0, 2000.0);
        let p = place_menu(
            Rect::new(400.0, 100.0, 200.0, 20.0),
            Size::new(120.0, 40.0),
            viewport,
            MARGIN,
        );
        assert_eq!(p.rect, Rect::new(470.0, 2120.0, 120.0, 40.0));
    }

    #[test]
    fn placement_stays_inside_margin_for_every_anchor() {
        let viewports = [
            Viewport::new(1280.0, 720.0),
            Viewport::new(320.0, 480.0).scrolled(0.0, 900.0),
            Viewport::new(800.0, 600.0).scrolled(150.0, 40.0),
        ];
        let menus = [Size::new(160.0, 44.0), Size::new(280.0, 120.0)];

        for viewport in viewports {
            let inside = inner(viewport);
            for menu in menus {
                let mut x = 0.0;
                while x <= viewport.width {
                    let mut y = 0.0;
                    while y <= viewport.height {
                        for (w, h) in [(0.0, 20.0), (60.0, 18.0), (300.0, 60.0)] {
                            let anchor = Rect::new(x, y, w, h);
                            let p = place_menu(anchor, menu, viewport, MARGIN);
                            assert!(
                                inside.contains_rect(&p.rect),
                                "anchor {:?} menu {:?} viewport {:?} -> {:?}",
                                anchor,
                                menu,
                                viewport,
                                p.rect
                            );
                        }
                        y += 37.0;
                    }
                    x += 41.0;
                }
            }
        }
    }

    #[test]
    fn reveal_is_two_phase() {
        let mut t = MenuTransition::default();
        let now = Instant::now();
        t.show();
        assert_eq!(t.phase(), MenuPhase::Mounted);
        assert_eq!(t.appearance(now), Appearance::HIDDEN);

        t.layout_done(now);
        assert!(matches!(t.phase(), MenuPhase::Visible { .. }));
        assert_eq!(
            t.appearance(now + Duration::from_millis(500)),
            Appearance::VISIBLE
        );
    }

    #[test]
    fn hidden_menu_is_removed_only_after_the_animation() {
        let mut t = MenuTransition::default();
        let now = Instant::now();
        t.show();
        t.layout_done(now);
        t.hide(now);

        assert!(!t.tick(now + Duration::from_millis(199)));
        assert!(t.is_mounted());
        assert!(!t.is_shown());

        assert!(t.tick(now + DURATION_HIDE));
        assert!(!t.is_mounted());
    }

    #[test]
    fn show_during_hide_reuses_the_element() {
        let mut t = MenuTransition::default();
        let now = Instant::now();
        t.show();
        t.layout_done(now);
        t.hide(now);
        t.show();
        assert_eq!(t.mount_count(), 1);

        // The stale removal deadline must not take the new menu down
        assert!(!t.tick(now + Duration::from_secs(1)));
        assert!(t.is_shown());
    }
}
