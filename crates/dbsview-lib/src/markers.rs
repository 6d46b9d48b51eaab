use log::debug;
use serde::{Deserialize, Serialize};

/// A marked span in seconds, stored exactly as it was dragged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkedInterval {
    pub start: f64,
    pub end: f64,
}

impl MarkedInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// The one list of intervals shared by every plot. Append and remove-last only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerList {
    intervals: Vec<MarkedInterval>,
}

impl MarkerList {
    pub fn push(&mut self, interval: MarkedInterval) {
        self.intervals.push(interval);
    }

    pub fn pop_last(&mut self) -> Option<MarkedInterval> {
        self.intervals.pop()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkedInterval> {
        self.intervals.iter()
    }

    /// Intervals whose start lies in `[t0, t1]`, in insertion order.
    pub fn visible_between(&self, t0: f64, t1: f64) -> impl Iterator<Item = &MarkedInterval> {
        self.intervals
            .iter()
            .filter(move |m| t0 <= m.start && m.start <= t1)
    }
}

impl FromIterator<MarkedInterval> for MarkerList {
    fn from_iter<I: IntoIterator<Item = MarkedInterval>>(iter: I) -> Self {
        Self {
            intervals: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    Armed,
    Dragging {
        start: f64,
    },
}

/// One-shot marking mode.
///
/// Pointer positions are plot x coordinates in seconds; `None` means the pointer was outside
/// every plot and the event is ignored. A completed drag yields one interval and disarms the
/// session, so each mark needs its own [`MarkingSession::arm`].
#[derive(Debug, Clone, Default)]
pub struct MarkingSession {
    gesture: Gesture,
}

impl MarkingSession {
    pub fn arm(&mut self) {
        self.gesture = Gesture::Armed;
    }

    pub fn disarm(&mut self) {
        self.gesture = Gesture::Idle;
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    pub fn pointer_down(&mut self, x: Option<f64>) {
        let Some(start) = x else { return };
        if self.is_armed() {
            self.gesture = Gesture::Dragging { start };
        }
    }

    pub fn pointer_up(&mut self, x: Option<f64>) -> Option<MarkedInterval> {
        let end = x?;
        let Gesture::Dragging { start } = self.gesture else {
            return None;
        };
        self.gesture = Gesture::Idle;
        debug!("marked {start:.3}-{end:.3} s");
        Some(MarkedInterval::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_last_only() {
        let mut list: MarkerList = [
            MarkedInterval::new(1.0, 2.0),
            MarkedInterval::new(5.0, 6.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(list.pop_last(), Some(MarkedInterval::new(5.0, 6.0)));
        assert_eq!(list.len(), 1);
        list.pop_last();
        assert_eq!(list.pop_last(), None);
    }

    #[test]
    fn visibility_uses_start_inclusive() {
        let list: MarkerList = [
            MarkedInterval::new(0.0, 1.0),
            MarkedInterval::new(10.0, 30.0),
            MarkedInterval::new(20.0, 21.0),
            MarkedInterval::new(9.0, 12.0),
        ]
        .into_iter()
        .collect();
        let visible: Vec<_> = list.visible_between(10.0, 20.0).copied().collect();
        assert_eq!(
            visible,
            vec![MarkedInterval::new(10.0, 30.0), MarkedInterval::new(20.0, 21.0)]
        );
    }

    #[test]
    fn gesture_needs_arming_and_disarms_after_one_mark() {
        let mut session = MarkingSession::default();
        session.pointer_down(Some(1.0));
        assert_eq!(session.pointer_up(Some(2.0)), None);

        session.arm();
        session.pointer_down(Some(1.0));
        assert_eq!(
            session.pointer_up(Some(2.0)),
            Some(MarkedInterval::new(1.0, 2.0))
        );
        assert!(!session.is_armed());

        session.pointer_down(Some(3.0));
        assert_eq!(session.pointer_up(Some(4.0)), None);
    }

    #[test]
    fn events_outside_the_plot_are_ignored() {
        let mut session = MarkingSession::default();
        session.arm();
        session.pointer_down(None);
        assert_eq!(session.pointer_up(Some(2.0)), None);
        assert!(session.is_armed());

        session.pointer_down(Some(4.0));
        assert_eq!(session.pointer_up(None), None);
        assert_eq!(
            session.pointer_up(Some(4.5)),
            Some(MarkedInterval::new(4.0, 4.5))
        );
    }

    #[test]
    fn disarm_cancels_a_drag() {
        let mut session = MarkingSession::default();
        session.arm();
        session.pointer_down(Some(1.0));
        session.disarm();
        assert_eq!(session.pointer_up(Some(2.0)), None);
    }
}
