use crate::driver::{Actions, Config, WindowMode};
use crate::geom::{Dp, Metric, Point, Rect};
use crate::ops::{DecorationOp, Op, Ops};

/// Client-side decorations, drawn when asked for and the platform can't.
#[derive(Debug, Clone)]
pub(crate) struct Decorations {
    /// The application wants decorations.
    pub enabled: bool,
    pub height: Dp,
    /// Last configuration reported by the platform.
    pub config: Config,
}

impl Decorations {
    pub fn new(enabled: bool, height: Dp) -> Self {
        Self {
            enabled,
            height,
            config: Config::default(),
        }
    }

    #[inline]
    pub fn active(&self) -> bool {
        self.enabled
            && !self.config.decorated
            && !matches!(
                self.config.mode,
                WindowMode::Fullscreen | WindowMode::Minimized
            )
    }

    /// Height to report in the `DecorationHeight` option.
    #[inline]
    pub fn option_height(&self) -> Dp {
        if self.enabled {
            self.height
        } else {
            Dp(0.0)
        }
    }

    /// Record the decoration ops for a frame of `size` pixels into `ops`.
    /// Returns the size left to the client and the offset of its content.
    pub fn layout(&self, m: &Metric, size: Point, ops: &mut Ops) -> (Point, Point) {
        ops.reset();
        if !self.active() {
            return (size, Point::ZERO);
        }
        let h = m.dp(self.height).min(size.y).max(0);
        let bar = Rect::new(0, 0, size.x, h);
        let maximized = self.config.mode == WindowMode::Maximized;
        ops.add(Op::Decoration(DecorationOp::TitleBar {
            rect: bar,
            title: self.config.title.clone(),
            maximized,
        }))
        .add(Op::ActionArea {
            rect: bar,
            actions: Actions::MOVE,
        });

        let toggle = if maximized {
            Actions::UNMAXIMIZE
        } else {
            Actions::MAXIMIZE
        };
        // Right to left.
        for (i, action) in [Actions::CLOSE, toggle, Actions::MINIMIZE].into_iter().enumerate() {
            let x1 = size.x - i as i32 * h;
            let rect = Rect::new((x1 - h).max(0), 0, x1.max(0), h);
            ops.add(Op::Decoration(DecorationOp::Button { rect, action }))
                .add(Op::ActionArea {
                    rect,
                    actions: action,
                });
        }
        (Point::new(size.x, size.y - h), Point::new(0, h))
    }

    /// Platform configuration as the client should see it.
    pub fn effective_config(&self, m: &Metric) -> Config {
        let mut cnf = self.config.clone();
        if self.active() {
            cnf.size.y -= m.dp(self.height);
        }
        cnf.decorated = self.enabled || cnf.decorated;
        cnf
    }
}
