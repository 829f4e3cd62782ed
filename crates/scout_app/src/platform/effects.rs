use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use chrono::Utc;
use scout_core::{Item, Platform};
use scout_engine::{export_filename, write_csv, ExportError, ExportSummary, ScoutMessage};
use scout_logging::{scout_error, scout_warn};

/// Writes `<platform>_<unix-millis>.csv` into `dir`.
pub fn export_items(
    dir: &Path,
    items: &[Item],
    platform: Platform,
) -> Result<ExportSummary, ExportError> {
    let millis = u128::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    write_csv(dir, &export_filename(platform, millis), items, platform)
}

/// Consumes scout messages on a background thread until the scout is
/// dropped: statuses go to stdout, notices to stderr, and the finished
/// snapshot is exported.
pub struct MessagePump {
    handle: JoinHandle<Option<ExportSummary>>,
}

impl MessagePump {
    pub fn spawn(rx: Receiver<ScoutMessage>, out_dir: PathBuf) -> Self {
        let handle = thread::spawn(move || {
            let mut exported = None;
            for message in rx {
                match message {
                    ScoutMessage::StatusUpdate { text } => println!("{text}"),
                    ScoutMessage::Notice { text } => eprintln!("{text}"),
                    ScoutMessage::ScrapeFinished { items, platform } => {
                        match export_items(&out_dir, &items, platform) {
                            Ok(summary) => exported = Some(summary),
                            Err(err) => scout_error!("CSV export failed: {}", err),
                        }
                    }
                }
            }
            exported
        });
        Self { handle }
    }

    /// Blocks until the sending side is gone. Returns the export written for
    /// the finished message, if any.
    pub fn finish(self) -> Option<ExportSummary> {
        self.handle.join().unwrap_or_else(|_| {
            scout_warn!("Message pump thread panicked");
            None
        })
    }
}
