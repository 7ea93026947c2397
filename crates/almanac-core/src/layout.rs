//! Pixel geometry for overlays drawn on top of a rendered calendar.
//!
//! Callers measure their containers and pass the rectangles in, so the
//! placement math stays independent of any rendering toolkit.

use chrono::{NaiveTime, Timelike};

use crate::clock;
use crate::views::{HOURS_PER_DAY, PlacedActivity};

/// Distance a time label sits above the slot border it names.
pub const LABEL_OFFSET_TOP: f64 = 10.0;
/// Distance a time label sits left of the slot column.
pub const LABEL_OFFSET_LEFT: f64 = 55.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub top: f64,
    pub left: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeLabel {
    pub position: Point,
    pub text: String,
}

/// One label per hour slot, aligned with the slot's top border, plus a
/// closing `00:00` under the last slot.
pub fn time_label_positions(slot_rects: &[Rect]) -> Vec<TimeLabel> {
    let mut labels: Vec<TimeLabel> = slot_rects
        .iter()
        .enumerate()
        .map(|(idx, rect)| TimeLabel {
            position: Point {
                top: rect.top - LABEL_OFFSET_TOP,
                left: rect.left - LABEL_OFFSET_LEFT,
            },
            text: clock::hour_label(idx as u32),
        })
        .collect();

    if let Some(last) = slot_rects.last() {
        labels.push(TimeLabel {
            position: Point {
                top: last.bottom() - LABEL_OFFSET_TOP,
                left: last.left - LABEL_OFFSET_LEFT,
            },
            text: clock::hour_label(0),
        });
    }

    labels
}

/// Popups hang from the bottom-left corner of the clicked cell.
pub fn popup_anchor(cell: Rect) -> Point {
    Point {
        top: cell.bottom(),
        left: cell.left,
    }
}

/// Vertical position of the current-time line in a column spanning 24 hours.
pub fn now_indicator_top(now: NaiveTime, container: Rect) -> f64 {
    let seconds = f64::from(now.num_seconds_from_midnight());
    container.top + container.height * seconds / day_seconds()
}

/// Box of a placed activity inside a 24-hour column, clipped at midnight.
pub fn activity_block(placed: &PlacedActivity<'_>, container: Rect) -> Rect {
    let per_hour = container.height / f64::from(HOURS_PER_DAY);
    let start = placed.start_hours.clamp(0.0, f64::from(HOURS_PER_DAY));
    let end = placed.end_hours().clamp(start, f64::from(HOURS_PER_DAY));
    Rect {
        top: container.top + start * per_hour,
        left: container.left,
        width: container.width,
        height: (end - start) * per_hour,
    }
}

fn day_seconds() -> f64 {
    f64::from(HOURS_PER_DAY * 3600)
}
