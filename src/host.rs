//! Console host: the runtime side of [`HostContext`] and the event dispatcher.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use karma_core::{parse_command, HostContext, KarmaModule, ModuleRequest, KARMA_GET};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::channels::ChatEvent;
use crate::config::{AccessConfig, Config};

/// A reply the module wants delivered to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub channel: String,
    pub text: String,
}

impl std::fmt::Display for OutgoingMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.channel, self.text)
    }
}

pub struct ConsoleHost {
    data_file: PathBuf,
    access: AccessConfig,
    outbox: Mutex<Vec<OutgoingMessage>>,
    save_pending: AtomicBool,
}

impl ConsoleHost {
    pub fn new(data_file: PathBuf, access: AccessConfig) -> Self {
        Self {
            data_file,
            access,
            outbox: Mutex::new(Vec::new()),
            save_pending: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.data_file(), config.access.clone())
    }

    /// Clear and return the pending save flag.
    pub fn take_save_request(&self) -> bool {
        self.save_pending.swap(false, Ordering::AcqRel)
    }

    #[cfg(test)]
    fn save_pending(&self) -> bool {
        self.save_pending.load(Ordering::Acquire)
    }

    pub fn drain_outbox(&self) -> Vec<OutgoingMessage> {
        std::mem::take(&mut *self.outbox.lock())
    }
}

impl HostContext for ConsoleHost {
    fn request_save(&self) {
        self.save_pending.store(true, Ordering::Release);
    }

    fn send_message(&self, channel: &str, text: &str) {
        self.outbox.lock().push(OutgoingMessage {
            channel: channel.to_string(),
            text: text.to_string(),
        });
    }

    fn data_file(&self) -> PathBuf {
        self.data_file.clone()
    }

    fn is_admin(&self, name: &str) -> bool {
        self.access.is_admin(name)
    }

    fn is_allowlisted(&self, name: &str) -> bool {
        self.access.is_allowlisted(name)
    }
}

/// Owns the karma module and feeds it one event at a time.
pub struct Dispatcher {
    module: KarmaModule<ConsoleHost>,
    saves: usize,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Self {
        let module = KarmaModule::init(ConsoleHost::from_config(config), config.karma.clone());
        info!(
            "Karma module ready: {} record(s) from {}",
            module.store().len(),
            config.data_file().display()
        );
        Self { module, saves: 0 }
    }

    pub fn module(&self) -> &KarmaModule<ConsoleHost> {
        &self.module
    }

    /// Number of successful writes of the data file so far.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Handle one event and return the lines to show the operator.
    pub fn dispatch(&mut self, event: ChatEvent) -> Vec<String> {
        let mut lines = Vec::new();

        match event {
            ChatEvent::Message {
                channel,
                sender,
                text,
            } => {
                let command = parse_command(&text, &self.module.config().control_chars);
                match command {
                    Some((cmd, arg)) => {
                        debug!("{sender} ran {} in {channel}", cmd.name());
                        self.module.on_command(&channel, &sender, arg, cmd);
                    }
                    None => self.module.on_message(&channel, &sender, &text),
                }
            }
            ChatEvent::Join { channel, name } => self.module.on_join(&channel, &name),
            ChatEvent::Nick { prev, cur } => self.module.on_nick(&prev, &cur),
            ChatEvent::Query { name } => {
                let request = ModuleRequest {
                    cmd: KARMA_GET,
                    arg: &name,
                };
                self.module.on_module_message("console", request, |score| {
                    lines.push(format!("{KARMA_GET} {name}: {score}"));
                });
            }
            ChatEvent::Reload => {
                info!("Data file changed, reloading");
                self.module.on_modified();
            }
            ChatEvent::Save => self.module.host().request_save(),
        }

        lines.extend(
            self.module
                .host()
                .drain_outbox()
                .into_iter()
                .map(|msg| msg.to_string()),
        );
        self.flush_save();
        lines
    }

    /// Write the data file if the module asked for it. A failed write is
    /// logged and stays pending.
    pub fn flush_save(&mut self) -> Option<usize> {
        if !self.module.host().take_save_request() {
            return None;
        }
        match self.module.persist() {
            Ok(written) => {
                self.saves += 1;
                Some(written)
            }
            Err(e) => {
                warn!("Failed to save karma: {e:#}");
                self.module.host().request_save();
                None
            }
        }
    }

    /// Flush any pending save, then release the module's records.
    pub fn shutdown(&mut self) {
        self.flush_save();
        self.module.shutdown();
    }
}
