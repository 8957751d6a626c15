//! The karma module as the host sees it: one handler per chat event.
//!
//! Handlers run to completion and are invoked one at a time, so the module
//! owns its store outright and needs no locking. Mutations that should reach
//! disk end with [`HostContext::request_save`]; the host later calls
//! [`KarmaModule::save`] or [`KarmaModule::persist`].

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::codec::{self, DecodeError};
use crate::command::KarmaCommand;
use crate::config::KarmaConfig;
use crate::error::{KarmaError, Result};
use crate::host::HostContext;
use crate::policy::VotePolicy;
use crate::record::{RecordId, ScoreRecord};
use crate::scanner::scan;
use crate::store::{AliasChange, AliasStore};

/// Cross-module request asking for an identity's net karma.
pub const KARMA_GET: &str = "karma_get";

/// A request from another bot module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleRequest<'a> {
    pub cmd: &'a str,
    pub arg: &'a str,
}

pub struct KarmaModule<H> {
    host: H,
    config: KarmaConfig,
    policy: VotePolicy,
    store: AliasStore,
}

impl<H: HostContext> KarmaModule<H> {
    pub const NAME: &'static str = "karma";
    pub const DESCRIPTION: &'static str = "Tracks imaginary internet points";

    /// Build the module and load whatever the host's data file holds.
    pub fn init(host: H, config: KarmaConfig) -> Self {
        let policy = VotePolicy::from_config(&config);
        let mut module = Self {
            host,
            config,
            policy,
            store: AliasStore::new(),
        };
        module.load();
        module
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &KarmaConfig {
        &self.config
    }

    pub fn store(&self) -> &AliasStore {
        &self.store
    }

    /// Record for `name`, if known. Does not change the active alias.
    pub fn record(&self, name: &str) -> Option<&ScoreRecord> {
        self.store.lookup(name).and_then(|id| self.store.get(id))
    }

    /// Net karma for `name`, 0 when unknown.
    pub fn karma_of(&self, name: &str) -> i64 {
        self.record(name).map(ScoreRecord::net).unwrap_or(0)
    }

    // ── Event handlers ──────────────────────────────────────────

    /// A chat line from `sender`: track them, then look for a vote.
    pub fn on_message(&mut self, _channel: &str, sender: &str, text: &str) {
        let Some(actor) = self.store.get_or_create(sender) else {
            return;
        };
        self.check_votes(actor, text);
    }

    pub fn on_join(&mut self, _channel: &str, name: &str) {
        self.store.get_or_create(name);
    }

    /// `prev` is now known as `cur`. Unknown departing names are ignored.
    pub fn on_nick(&mut self, prev: &str, cur: &str) {
        let Some(id) = self.store.find_by_alias(prev, false) else {
            tracing::debug!(prev, cur, "karma: nick change for untracked name");
            return;
        };
        match self.store.add_alias(id, cur) {
            AliasChange::Added => tracing::debug!(prev, cur, "karma: alias added"),
            AliasChange::Reactivated => {}
            AliasChange::Invalid => tracing::debug!(prev, cur, "karma: new nick is not storable"),
            AliasChange::ClaimedBy(other) => tracing::debug!(
                prev,
                cur,
                other = other.index(),
                "karma: new nick already belongs to another identity"
            ),
        }
    }

    pub fn on_command(&mut self, channel: &str, sender: &str, arg: &str, cmd: KarmaCommand) {
        let Some(actor) = self.store.get_or_create(sender) else {
            return;
        };
        let arg = arg.trim();

        match cmd {
            KarmaCommand::Show => {
                if arg.is_empty() {
                    if let Some(record) = self.store.get(actor) {
                        let text = format!(
                            "{sender}: You have {} karma [+{}|-{}].",
                            record.net(),
                            record.upvotes,
                            record.downvotes
                        );
                        self.host.send_message(channel, &text);
                    }
                    return;
                }

                if !self.host.is_allowlisted(sender) {
                    tracing::debug!(sender, "karma: lookup of others denied");
                    return;
                }
                let name = arg.split_whitespace().next().unwrap_or(arg);
                if let Some(record) = self.record(name) {
                    let text = format!(
                        "{sender}: {name} has {} karma [+{}|-{}].",
                        record.net(),
                        record.upvotes,
                        record.downvotes
                    );
                    self.host.send_message(channel, &text);
                }
            }

            KarmaCommand::Top => {
                let admin =
                    is_channel_owner(channel, sender) || self.host.is_admin(sender);
                if !admin && !self.host.is_allowlisted(sender) {
                    tracing::debug!(sender, "karma: leaderboard denied");
                    return;
                }

                let requested = if arg.is_empty() {
                    i64::try_from(self.config.default_top).unwrap_or(i64::MAX)
                } else {
                    parse_leading_int(arg)
                };
                let count = self.config.clamp_top(requested);

                let mut text = String::from("Top karma:");
                for record in self.store.top(count) {
                    text.push_str(&format!(" |{}: {}|", record.active_alias(), record.net()));
                }
                text.push('.');
                self.host.send_message(channel, &text);
            }
        }
    }

    /// Answer a request from another module. Returns false if not understood.
    pub fn on_module_message(
        &self,
        sender: &str,
        request: ModuleRequest<'_>,
        reply: impl FnOnce(i64),
    ) -> bool {
        if request.cmd != KARMA_GET {
            tracing::debug!(sender, cmd = request.cmd, "karma: unknown module request");
            return false;
        }
        reply(self.karma_of(request.arg));
        true
    }

    /// The data file was changed behind our back: start over from disk.
    pub fn on_modified(&mut self) {
        self.shutdown();
        self.load();
    }

    /// Release all records. Nothing is saved.
    pub fn shutdown(&mut self) {
        tracing::debug!(records = self.store.len(), "karma: releasing records");
        self.store.clear();
    }

    // ── Votes ───────────────────────────────────────────────────

    fn check_votes(&mut self, actor: RecordId, text: &str) {
        let now = self.host.now();
        if self.policy.cooling_down(&self.store, actor, now) {
            tracing::debug!(actor = actor.index(), "karma: voter is cooling down");
            return;
        }

        let gestures = scan(text, &self.config.meme_prefixes);
        let Some((target, gesture)) = self.policy.select(&self.store, actor, gestures) else {
            return;
        };

        self.policy
            .apply(&mut self.store, actor, target, gesture.direction, now);

        if let (Some(voter), Some(voted)) = (self.store.get(actor), self.store.get(target)) {
            tracing::info!(
                voter = voter.active_alias(),
                target = voted.active_alias(),
                up = gesture.direction.is_up(),
                net = voted.net(),
                "karma: vote applied"
            );
        }

        self.store.resort();
        self.host.request_save();
    }

    // ── Persistence ─────────────────────────────────────────────

    /// Write all active records to `out`, leaderboard order.
    pub fn save<W: Write>(&mut self, out: &mut W) -> Result<usize> {
        self.store.resort();
        codec::encode(self.store.ranked(), out).map_err(KarmaError::Write)
    }

    /// Save to the host's data file, replacing it atomically.
    pub fn persist(&mut self) -> Result<usize> {
        let path = self.host.data_file();
        let written = self
            .write_atomic(&path)
            .map_err(|source| KarmaError::Persist {
                path: path.clone(),
                source,
            })?;
        tracing::info!(records = written, path = %path.display(), "karma: saved");
        Ok(written)
    }

    fn write_atomic(&mut self, path: &Path) -> io::Result<usize> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = tmp_path(path);
        let result = self.write_file(&tmp).and_then(|written| {
            std::fs::rename(&tmp, path)?;
            Ok(written)
        });
        if result.is_err() {
            if let Err(e) = std::fs::remove_file(&tmp) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %tmp.display(), "karma: cannot remove temp file: {e}");
                }
            }
        }
        result
    }

    fn write_file(&mut self, path: &Path) -> io::Result<usize> {
        let mut out = BufWriter::new(File::create(path)?);
        self.store.resort();
        let written = codec::encode(self.store.ranked(), &mut out)?;
        out.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        Ok(written)
    }

    /// Replace the in-memory store with the host's data file.
    ///
    /// A missing or unreadable file yields an empty store. Returns the
    /// number of records loaded.
    pub fn load(&mut self) -> usize {
        let path = self.host.data_file();
        match File::open(&path) {
            Ok(file) => self.load_from(BufReader::new(file)).0,
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    tracing::debug!(path = %path.display(), "karma: no data file yet");
                } else {
                    tracing::warn!(path = %path.display(), "karma: cannot read data file: {e}");
                }
                self.store.clear();
                0
            }
        }
    }

    /// Replace the in-memory store with records read from `reader`.
    pub fn load_from<R: BufRead>(&mut self, reader: R) -> (usize, Option<DecodeError>) {
        self.store.clear();
        let report = codec::decode(reader);
        if let Some(stopped) = &report.stopped {
            tracing::warn!("karma: stopped loading early, {stopped}");
        }
        for record in report.records {
            self.store.insert(record);
        }
        self.store.resort();
        tracing::info!(records = self.store.len(), "karma: loaded");
        (self.store.len(), report.stopped)
    }
}

/// A caller owns a channel named after them (`#alice` for `alice`).
fn is_channel_owner(channel: &str, name: &str) -> bool {
    let mut chars = channel.chars();
    chars.next();
    chars.as_str().eq_ignore_ascii_case(name)
}

/// Leading signed decimal integer, `strtol` style: junk reads as 0.
fn parse_leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        -value
    } else {
        value
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
