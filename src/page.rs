//! The narrow surface the dispatcher drives.
//!
//! Everything the engine does to the outside world goes through [`Page`]:
//! scrolling, activating elements, drawing hint labels, the command line
//! surface and console output. The engine never reads layout directly.

use crate::model::geometry::{Element, ElementId, Point};

/// z-order given to hint labels; above any page content.
pub const LABEL_Z_INDEX: u32 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Top,
    Bottom,
    Position(Point),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// A run of text the search operator can match against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    /// Row the text renders on.
    pub row: usize,
    pub text: String,
}

pub trait Page {
    /// Host of the current page, used for the suppression list.
    fn hostname(&self) -> &str;

    /// Interactive elements (links) with their rendered boxes, in page order.
    fn links(&self) -> Vec<Element>;

    fn text_nodes(&self) -> Vec<TextNode>;

    fn scroll_position(&self) -> Point;
    fn scroll_by(&mut self, dy: i32);
    fn scroll_to(&mut self, target: ScrollTarget, behavior: ScrollBehavior);
    fn history_back(&mut self);

    /// Synthetic click.
    fn activate(&mut self, element: ElementId);

    /// Draws a label at page coordinates, above page content.
    fn render_label(&mut self, code: &str, at: Point) -> LabelId;
    fn remove_label(&mut self, label: LabelId);

    /// Moves the caret of the focused field by `delta` characters, clamped.
    fn move_caret(&mut self, delta: isize);
    fn clear_field(&mut self);

    fn show_command_line(&mut self);
    fn update_command_line(&mut self, text: &str);
    fn hide_command_line(&mut self);

    /// Console output.
    fn report(&mut self, message: &str);
}

#[cfg(test)]
pub(crate) mod recording {
    //! In-memory [`Page`] that records every call.

    use super::*;
    use crate::model::geometry::Rect;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        ScrollBy(i32),
        ScrollTo(ScrollTarget, ScrollBehavior),
        HistoryBack,
        Activate(ElementId),
        MoveCaret(isize),
        ClearField,
        ShowCommandLine,
        HideCommandLine,
    }

    #[derive(Debug, Default)]
    pub struct RecordingPage {
        pub host: String,
        pub links: Vec<Element>,
        pub texts: Vec<String>,
        pub scroll: Point,
        pub labels: Vec<(LabelId, String, Point)>,
        pub command_line: Option<String>,
        pub console: Vec<String>,
        pub calls: Vec<Call>,
        next_label: u64,
    }

    impl RecordingPage {
        pub fn with_links(count: usize) -> Self {
            let links = (0..count)
                .map(|i| Element {
                    id: ElementId(i),
                    rect: Rect::new(2, i as i32 * 2, 8, 1),
                })
                .collect();
            Self {
                host: "example.org".to_string(),
                links,
                ..Self::default()
            }
        }

        pub fn activated(&self) -> Vec<ElementId> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Activate(id) => Some(*id),
                    _ => None,
                })
                .collect()
        }
    }

    impl Page for RecordingPage {
        fn hostname(&self) -> &str {
            &self.host
        }

        fn links(&self) -> Vec<Element> {
            self.links.clone()
        }

        fn text_nodes(&self) -> Vec<TextNode> {
            self.texts
                .iter()
                .enumerate()
                .map(|(row, text)| TextNode {
                    row,
                    text: text.clone(),
                })
                .collect()
        }

        fn scroll_position(&self) -> Point {
            self.scroll
        }

        fn scroll_by(&mut self, dy: i32) {
            self.scroll.y = (self.scroll.y + dy).max(0);
            self.calls.push(Call::ScrollBy(dy));
        }

        fn scroll_to(&mut self, target: ScrollTarget, behavior: ScrollBehavior) {
            self.scroll = match target {
                ScrollTarget::Top => Point::ORIGIN,
                ScrollTarget::Bottom => Point::new(0, 1000),
                ScrollTarget::Position(point) => point,
            };
            self.calls.push(Call::ScrollTo(target, behavior));
        }

        fn history_back(&mut self) {
            self.calls.push(Call::HistoryBack);
        }

        fn activate(&mut self, element: ElementId) {
            self.calls.push(Call::Activate(element));
        }

        fn render_label(&mut self, code: &str, at: Point) -> LabelId {
            let id = LabelId(self.next_label);
            self.next_label += 1;
            self.labels.push((id, code.to_string(), at));
            id
        }

        fn remove_label(&mut self, label: LabelId) {
            self.labels.retain(|(id, _, _)| *id != label);
        }

        fn move_caret(&mut self, delta: isize) {
            self.calls.push(Call::MoveCaret(delta));
        }

        fn clear_field(&mut self) {
            self.calls.push(Call::ClearField);
        }

        fn show_command_line(&mut self) {
            self.command_line = Some(String::new());
            self.calls.push(Call::ShowCommandLine);
        }

        fn update_command_line(&mut self, text: &str) {
            self.command_line = Some(text.to_string());
        }

        fn hide_command_line(&mut self) {
            self.command_line = None;
            self.calls.push(Call::HideCommandLine);
        }

        fn report(&mut self, message: &str) {
            self.console.push(message.to_string());
        }
    }
}
