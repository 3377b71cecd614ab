use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

/// How long a notice stays up before it dismisses itself.
pub const NOTICE_DISMISS_MS: u32 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

impl NoticeLevel {
    fn css_class(self) -> &'static str {
        match self {
            NoticeLevel::Info => "notice notice-info",
            NoticeLevel::Success => "notice notice-success",
            NoticeLevel::Error => "notice notice-error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

/// Ordered stack of transient banners. Ids only grow, so a late dismissal
/// for an already-replaced notice is a harmless miss.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoticeQueue {
    next_id: u64,
    notices: Vec<Notice>,
}

impl NoticeQueue {
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.notices.push(Notice {
            id,
            level,
            message: message.into(),
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.notices.retain(|n| n.id != id);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

/// Push a notice that takes itself down after [`NOTICE_DISMISS_MS`].
pub fn push_transient(mut notices: Signal<NoticeQueue>, level: NoticeLevel, message: impl Into<String>) {
    let id = notices.write().push(level, message);
    wasm_bindgen_futures::spawn_local(async move {
        TimeoutFuture::new(NOTICE_DISMISS_MS).await;
        // Navigation may have dropped the queue while the timer ran
        if let Ok(mut queue) = notices.try_write() {
            queue.dismiss(id);
        }
    });
}

#[component]
pub fn NoticeHost(notices: Signal<NoticeQueue>) -> Element {
    let items = notices.read().notices().to_vec();
    if items.is_empty() {
        return rsx! {};
    }

    rsx! {
        div { class: "notice-stack",
            for notice in items {
                div { class: notice.level.css_class(),
                    span { class: "notice-message", "{notice.message}" }
                    button {
                        class: "notice-close",
                        onclick: move |_| notices.write().dismiss(notice.id),
                        "\u{00d7}"
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_increasing_ids() {
        let mut queue = NoticeQueue::default();
        let a = queue.push(NoticeLevel::Info, "first");
        let b = queue.push(NoticeLevel::Error, "second");
        assert!(b > a);
        assert_eq!(queue.notices().len(), 2);
    }

    #[test]
    fn test_dismiss_removes_only_the_target() {
        let mut queue = NoticeQueue::default();
        let a = queue.push(NoticeLevel::Success, "kept");
        let b = queue.push(NoticeLevel::Success, "gone");
        queue.dismiss(b);
        assert_eq!(queue.notices().len(), 1);
        assert_eq!(queue.notices()[0].id, a);
        // Dismissing an unknown id is a no-op
        queue.dismiss(999);
        assert_eq!(queue.notices().len(), 1);
    }

    #[test]
    fn test_levels_map_to_distinct_classes() {
        assert_ne!(
            NoticeLevel::Info.css_class(),
            NoticeLevel::Error.css_class()
        );
        assert_ne!(
            NoticeLevel::Success.css_class(),
            NoticeLevel::Error.css_class()
        );
    }
}
