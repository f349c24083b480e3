//! Pointer gesture tracking and annotation placement.
//!
//! Press/move/release events feed an explicit state machine instead of
//! loose drag fields; on release the machine commits a single gesture
//! object, which the placer maps through the coordinate pipeline into an
//! engine annotation call.

use crate::engine::Document;
use crate::error::Result;
use crate::geom::{PageRect, ViewPoint};
use crate::viewer::transform::{DisplayTransform, view_to_page};

/// Active annotation tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    /// Navigation only; commits no gestures.
    Pan,
    /// Rectangle drag producing a highlight.
    Highlight,
    /// Freehand stroke producing an ink annotation.
    Pen,
    /// Point tap producing a text note.
    Note,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Dragging,
}

/// A committed gesture in view space.
#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
    Rect { from: ViewPoint, to: ViewPoint },
    Stroke(Vec<ViewPoint>),
    Tap(ViewPoint),
}

#[derive(Debug)]
pub struct GestureTracker {
    tool: Tool,
    phase: Phase,
    start: ViewPoint,
    stroke: Vec<ViewPoint>,
}

impl GestureTracker {
    #[must_use]
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            phase: Phase::Idle,
            start: ViewPoint::default(),
            stroke: Vec::new(),
        }
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools; cancels any drag in flight.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.cancel();
    }

    pub fn press(&mut self, p: ViewPoint) {
        self.phase = Phase::Dragging;
        self.start = p;
        self.stroke.clear();
        if self.tool == Tool::Pen {
            self.stroke.push(p);
        }
    }

    pub fn motion(&mut self, p: ViewPoint) {
        if self.phase == Phase::Dragging && self.tool == Tool::Pen {
            self.stroke.push(p);
        }
    }

    /// Commit the drag. Returns `None` when no drag was in progress or
    /// the active tool does not annotate.
    pub fn release(&mut self, p: ViewPoint) -> Option<Gesture> {
        if self.phase != Phase::Dragging {
            return None;
        }
        self.phase = Phase::Idle;
        match self.tool {
            Tool::Pan => None,
            Tool::Highlight => Some(Gesture::Rect {
                from: self.start,
                to: p,
            }),
            Tool::Pen => {
                self.stroke.push(p);
                Some(Gesture::Stroke(std::mem::take(&mut self.stroke)))
            }
            Tool::Note => Some(Gesture::Tap(p)),
        }
    }

    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
        self.stroke.clear();
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.phase == Phase::Dragging
    }
}

/// Maps committed gestures into engine annotation calls through the
/// display transform of the current render.
#[derive(Clone, Copy, Debug)]
pub struct AnnotationPlacer {
    pub transform: DisplayTransform,
    pub dpi: u32,
}

impl AnnotationPlacer {
    const NOTE_TEXT: &'static str = "Note";

    #[must_use]
    pub fn new(transform: DisplayTransform, dpi: u32) -> Self {
        Self { transform, dpi }
    }

    /// Issue the annotation for a gesture on `page`. Returns whether an
    /// annotation was created: zero-area rectangles and strokes shorter
    /// than two points are discarded.
    pub fn place<D: Document>(&self, doc: &mut D, page: usize, gesture: Gesture) -> Result<bool> {
        match gesture {
            Gesture::Rect { from, to } => {
                let a = view_to_page(from, self.transform, self.dpi);
                let b = view_to_page(to, self.transform, self.dpi);
                let rect = PageRect::from_corners(a, b);
                if rect.is_empty() {
                    return Ok(false);
                }
                doc.add_highlight(page, rect)?;
                Ok(true)
            }
            Gesture::Stroke(points) => {
                if points.len() < 2 {
                    return Ok(false);
                }
                let stroke: Vec<_> = points
                    .into_iter()
                    .map(|p| view_to_page(p, self.transform, self.dpi))
                    .collect();
                doc.add_ink(page, &stroke)?;
                Ok(true)
            }
            Gesture::Tap(p) => {
                doc.add_note(page, view_to_page(p, self.transform, self.dpi), Self::NOTE_TEXT)?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeAnnotation, FakeDocument};
    use crate::viewer::transform::compute_display_transform;

    fn placer() -> AnnotationPlacer {
        // Widget equals raster: identity placement at 72 dpi.
        AnnotationPlacer::new(
            compute_display_transform((612.0, 792.0), (612.0, 792.0)),
            72,
        )
    }

    #[test]
    fn drag_commits_exactly_one_rect_gesture() {
        let mut tracker = GestureTracker::new(Tool::Highlight);
        tracker.press(ViewPoint::new(10.0, 10.0));
        tracker.motion(ViewPoint::new(50.0, 40.0));
        let gesture = tracker.release(ViewPoint::new(60.0, 80.0)).unwrap();
        assert_eq!(
            gesture,
            Gesture::Rect {
                from: ViewPoint::new(10.0, 10.0),
                to: ViewPoint::new(60.0, 80.0)
            }
        );
        // A second release without a press commits nothing.
        assert!(tracker.release(ViewPoint::new(60.0, 80.0)).is_none());
    }

    #[test]
    fn pan_tool_never_commits() {
        let mut tracker = GestureTracker::new(Tool::Pan);
        tracker.press(ViewPoint::new(0.0, 0.0));
        assert!(tracker.release(ViewPoint::new(9.0, 9.0)).is_none());
    }

    #[test]
    fn pen_collects_the_whole_stroke() {
        let mut tracker = GestureTracker::new(Tool::Pen);
        tracker.press(ViewPoint::new(1.0, 1.0));
        tracker.motion(ViewPoint::new(2.0, 2.0));
        tracker.motion(ViewPoint::new(3.0, 3.0));
        let Some(Gesture::Stroke(points)) = tracker.release(ViewPoint::new(4.0, 4.0)) else {
            panic!("expected a stroke");
        };
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn switching_tools_cancels_the_drag() {
        let mut tracker = GestureTracker::new(Tool::Highlight);
        tracker.press(ViewPoint::new(1.0, 1.0));
        tracker.set_tool(Tool::Pen);
        assert!(!tracker.is_dragging());
        assert!(tracker.release(ViewPoint::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn rect_gesture_places_a_highlight() {
        let mut doc = FakeDocument::with_pages(1);
        let placed = placer()
            .place(
                &mut doc,
                0,
                Gesture::Rect {
                    from: ViewPoint::new(100.0, 120.0),
                    to: ViewPoint::new(50.0, 60.0),
                },
            )
            .unwrap();
        assert!(placed);
        let FakeAnnotation::Highlight(rect) = &doc.pages[0].annotations[0] else {
            panic!("expected a highlight");
        };
        // Corners are normalized on the way in.
        assert_eq!(rect.x0, 50.0);
        assert_eq!(rect.y1, 120.0);
    }

    #[test]
    fn zero_area_rect_is_discarded() {
        let mut doc = FakeDocument::with_pages(1);
        let placed = placer()
            .place(
                &mut doc,
                0,
                Gesture::Rect {
                    from: ViewPoint::new(10.0, 10.0),
                    to: ViewPoint::new(10.0, 90.0),
                },
            )
            .unwrap();
        assert!(!placed);
        assert!(doc.pages[0].annotations.is_empty());
    }

    #[test]
    fn short_stroke_is_discarded() {
        let mut doc = FakeDocument::with_pages(1);
        let placed = placer()
            .place(&mut doc, 0, Gesture::Stroke(vec![ViewPoint::new(1.0, 1.0)]))
            .unwrap();
        assert!(!placed);
    }

    #[test]
    fn tap_places_a_note() {
        let mut doc = FakeDocument::with_pages(1);
        placer()
            .place(&mut doc, 0, Gesture::Tap(ViewPoint::new(30.0, 40.0)))
            .unwrap();
        assert!(matches!(
            &doc.pages[0].annotations[0],
            FakeAnnotation::Note(_, text) if text == "Note"
        ));
    }
}
