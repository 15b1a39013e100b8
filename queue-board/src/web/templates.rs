//! Askama templates for the board page.

use askama::Template;

use crate::api::{QUEUE_DISPLAY_COUNT, QueueCategory};
use crate::board::BoardView;

/// The full-screen board.
#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    pub heading: String,
    pub sections: Vec<QueueSectionView>,
    pub walk_in_suspended: bool,
    /// User-facing error lines, resolver first.
    pub messages: Vec<String>,
    pub loading: bool,
    pub time: String,
    /// Seconds between page reloads.
    pub refresh_secs: u64,
}

/// One queue category on the board.
#[derive(Debug, Clone)]
pub struct QueueSectionView {
    pub title: &'static str,
    pub subtitle: &'static str,
    /// Exactly three slots; empty strings render as blanks.
    pub slots: Vec<String>,
}

impl QueueSectionView {
    /// Slot positions, 1-based.
    pub fn positions(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.slots.len()
    }
}

impl BoardTemplate {
    pub fn from_view(view: &BoardView, time: String, refresh_secs: u64) -> Self {
        let sections = QueueCategory::ALL
            .into_iter()
            .map(|category| QueueSectionView {
                title: category.title(),
                subtitle: category.subtitle(),
                slots: view
                    .queue
                    .snapshot
                    .as_ref()
                    .map(|s| s.top(category, QUEUE_DISPLAY_COUNT))
                    .unwrap_or_else(|| vec![String::new(); QUEUE_DISPLAY_COUNT]),
            })
            .collect();

        Self {
            heading: view.heading(),
            sections,
            walk_in_suspended: view.walk_in_suspended(),
            messages: view.messages(),
            loading: view.queue_loading(),
            time,
            refresh_secs: refresh_secs.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{NetTicketStatus, QueueSnapshot, Store};
    use crate::error::ClassifiedError;
    use crate::queue::QueueState;
    use crate::stores::ResolutionSource;

    fn view(store: Option<Store>, snapshot: Option<QueueSnapshot>) -> BoardView {
        BoardView {
            store_id: 2,
            store,
            source: ResolutionSource::Default,
            store_error: None,
            queue: QueueState {
                snapshot,
                ..QueueState::default()
            },
            polling: true,
        }
    }

    fn mong_kok(status: &str) -> Store {
        Store {
            id: 2,
            name: "Mong Kok".into(),
            net_ticket_status: Some(NetTicketStatus::from(status.to_string())),
        }
    }

    #[test]
    fn empty_board_has_blank_slots() {
        let template = BoardTemplate::from_view(&view(None, None), "09:05".into(), 30);

        assert_eq!(template.sections.len(), 3);
        assert!(template.sections.iter().all(|s| s.slots == ["", "", ""]));
        assert!(template.loading);
        assert_eq!(template.sections[0].positions().collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn renders_board() {
        let snapshot = QueueSnapshot {
            store_queue: vec!["201".into(), "202".into()],
            booth_queue: vec!["301".into()],
            reservation_queue: vec![],
        };
        let html = BoardTemplate::from_view(
            &view(Some(mong_kok("ONLINE")), Some(snapshot)),
            "09:05".into(),
            30,
        )
        .render()
        .unwrap();

        assert!(html.contains("Mong Kok即將要帶位的號碼:"));
        assert!(html.contains("Counter / booth"));
        assert!(html.contains("手機APP預約(按預約時間先後順序叫號)"));
        assert!(html.contains(">201<"));
        assert!(html.contains(">301<"));
        assert!(html.contains("&nbsp;"));
        assert!(html.contains("Walk-ins Suspended"));
        assert!(html.contains("09:05"));
        assert!(html.contains(r#"content="30""#));
    }

    #[test]
    fn offline_manual_hides_banner() {
        let html = BoardTemplate::from_view(&view(Some(mong_kok("OFFLINE_MANUAL")), None), "09:05".into(), 30)
            .render()
            .unwrap();
        assert!(!html.contains("Walk-ins Suspended"));
    }

    #[test]
    fn ticket_labels_are_escaped() {
        let snapshot = QueueSnapshot {
            store_queue: vec!["<b>1</b>".into()],
            ..QueueSnapshot::default()
        };
        let html = BoardTemplate::from_view(&view(None, Some(snapshot)), "09:05".into(), 30)
            .render()
            .unwrap();
        assert!(!html.contains("<b>1</b>"));
        assert!(html.contains("即將要帶位的號碼:"));
    }

    #[test]
    fn shows_error_messages() {
        let mut view = view(None, None);
        view.store_error = Some(ClassifiedError::validation("No stores available"));
        let html = BoardTemplate::from_view(&view, "09:05".into(), 30)
            .render()
            .unwrap();
        assert!(html.contains("No stores available"));
    }
}
