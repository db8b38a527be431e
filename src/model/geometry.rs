/// Page coordinates: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rendered bounding box, relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Zero-sized boxes are not interactable.
    pub fn is_rendered(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Top-left corner in page coordinates for the given scroll offset.
    pub fn anchor(&self, scroll: Point) -> Point {
        Point::new(self.left + scroll.x, self.top + scroll.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// An interactive element (a link) and where it currently renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: ElementId,
    pub rect: Rect,
}

/// Elements that currently render with a non-zero box, in page order.
pub fn visible(elements: impl IntoIterator<Item = Element>) -> Vec<Element> {
    elements
        .into_iter()
        .filter(|element| element.rect.is_rendered())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(id: usize, width: i32, height: i32) -> Element {
        Element {
            id: ElementId(id),
            rect: Rect::new(0, id as i32, width, height),
        }
    }

    #[test]
    fn drops_zero_width_and_zero_height() {
        let kept = visible([
            element(0, 4, 1),
            element(1, 0, 1),
            element(2, 3, 0),
            element(3, 1, 1),
        ]);
        let ids: Vec<_> = kept.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![ElementId(0), ElementId(3)]);
    }

    #[test]
    fn anchor_adds_scroll_offset() {
        let rect = Rect::new(4, 2, 10, 1);
        assert_eq!(rect.anchor(Point::new(0, 30)), Point::new(4, 32));
    }
}
