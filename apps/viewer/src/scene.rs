//! The viewer's content: a background and one clickable swatch.

use std::time::{Duration, Instant};

use newengine_window::input::{InputEvent, KeyName, KeyState, PointerKind};
use newengine_window::ops::{Filter, Op, Tag};
use newengine_window::router::InputSource;
use newengine_window::semantic::{SemanticClass, SemanticDesc, SemanticId};
use newengine_window::{Actions, Dp, Metric, Ops, Point, Rect, Rgba};

const PALETTE: [Rgba; 3] = [
    Rgba::new(0x2e, 0x86, 0xde, 0xff),
    Rgba::new(0xe6, 0x7e, 0x22, 0xff),
    Rgba::new(0x27, 0xae, 0x60, 0xff),
];

const BLINK: Duration = Duration::from_millis(500);

pub struct Scene {
    swatch: Tag,
    color: usize,
    blink: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            swatch: Tag::next(),
            color: 0,
            blink: false,
        }
    }

    /// Consume queued input. Returns the actions the window should perform.
    pub fn update(&mut self, input: &InputSource) -> Actions {
        let mut actions = Actions::empty();
        for e in input.events(self.swatch) {
            match e {
                InputEvent::Pointer(p) if p.kind == PointerKind::Press => self.next_color(),
                InputEvent::Key(k) if k.state == KeyState::Press => match k.name {
                    KeyName::Space | KeyName::Enter => self.next_color(),
                    KeyName::Escape => actions |= Actions::CLOSE,
                    _ => {}
                },
                _ => {}
            }
        }
        actions
    }

    fn next_color(&mut self) {
        self.color = (self.color + 1) % PALETTE.len();
    }

    pub fn draw(&mut self, ops: &mut Ops, now: Instant, metric: &Metric, size: Point) {
        ops.add(Op::Fill {
            rect: Rect::from_size(size),
            color: Rgba::new(0x20, 0x20, 0x24, 0xff),
        });

        let side = metric.dp(Dp(120.0));
        let origin = Point::new((size.x - side) / 2, (size.y - side) / 2);
        let rect = Rect::from_size(Point::new(side, side)).translate(origin);
        let mut color = PALETTE[self.color];
        if self.blink {
            color.a = 0xc0;
        }
        self.blink = !self.blink;

        ops.add(Op::PushSemantic {
            id: SemanticId(1),
            desc: SemanticDesc {
                class: SemanticClass::Button,
                label: "swatch".into(),
                bounds: rect,
                ..SemanticDesc::default()
            },
        })
        .add(Op::InputArea {
            tag: self.swatch,
            rect,
            filter: Filter::POINTER | Filter::KEY,
        })
        .add(Op::Focusable {
            tag: self.swatch,
            rect,
        })
        .add(Op::Fill { rect, color })
        .add(Op::PopSemantic)
        .add(Op::Invalidate {
            at: Some(now + BLINK),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swatch_is_centered_and_reschedules() {
        let mut scene = Scene::new();
        let mut ops = Ops::new();
        let now = Instant::now();
        scene.draw(&mut ops, now, &Metric::default(), Point::new(320, 240));

        let fills: Vec<Rect> = ops
            .iter()
            .filter_map(|op| match op {
                Op::Fill { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[1], Rect::new(100, 60, 220, 180));
        assert!(ops
            .iter()
            .any(|op| matches!(op, Op::Invalidate { at: Some(t) } if *t == now + BLINK)));
    }
}
