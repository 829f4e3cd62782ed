use std::sync::mpsc::Sender;

use scout_core::{Item, Platform};
use serde::{Deserialize, Serialize};

/// Messages from a running scout to whoever drives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScoutMessage {
    /// The job finished; the snapshot to export.
    ScrapeFinished { items: Vec<Item>, platform: Platform },
    StatusUpdate { text: String },
    /// Something the user must acknowledge.
    Notice { text: String },
}

pub trait Notifier {
    fn notify(&self, message: ScoutMessage);
}

/// Forwards messages over an mpsc channel. A dropped receiver is ignored.
pub struct ChannelNotifier {
    tx: Sender<ScoutMessage>,
}

impl ChannelNotifier {
    pub fn new(tx: Sender<ScoutMessage>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: ScoutMessage) {
        let _ = self.tx.send(message);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn messages_are_tagged_by_kind() {
        let finished = ScoutMessage::ScrapeFinished {
            items: vec![Item::new("鼠标", "59", "https://item.jd.com/1.html")],
            platform: Platform::Jd,
        };
        let value = serde_json::to_value(&finished).unwrap();
        assert_eq!(value["kind"], "scrapeFinished");
        assert_eq!(value["platform"], "jd");
        assert_eq!(value["items"][0]["title"], "鼠标");

        let status = serde_json::to_value(ScoutMessage::StatusUpdate {
            text: "第 1 页完成".into(),
        })
        .unwrap();
        assert_eq!(status, json!({"kind": "statusUpdate", "text": "第 1 页完成"}));
    }

    #[test]
    fn channel_notifier_survives_a_dropped_receiver() {
        let (tx, rx) = std::sync::mpsc::channel();
        let notifier = ChannelNotifier::new(tx);
        notifier.notify(ScoutMessage::Notice { text: "a".into() });
        assert_eq!(rx.recv().unwrap(), ScoutMessage::Notice { text: "a".into() });
        drop(rx);
        notifier.notify(ScoutMessage::Notice { text: "b".into() });
    }
}
