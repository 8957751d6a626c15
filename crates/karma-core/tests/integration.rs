use chrono::{DateTime, Duration, TimeZone, Utc};
use karma_core::*;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

/// In-memory host with a hand-driven clock.
struct TestHost {
    data_file: PathBuf,
    clock: Cell<DateTime<Utc>>,
    saves: Cell<usize>,
    sent: RefCell<Vec<String>>,
    allowlist: Vec<String>,
}

impl TestHost {
    fn new(data_file: PathBuf) -> Self {
        Self {
            data_file,
            clock: Cell::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
            saves: Cell::new(0),
            sent: RefCell::new(Vec::new()),
            allowlist: vec!["op".to_string()],
        }
    }

    fn advance(&self, secs: i64) {
        self.clock.set(self.clock.get() + Duration::seconds(secs));
    }
}

impl HostContext for TestHost {
    fn request_save(&self) {
        self.saves.set(self.saves.get() + 1);
    }
    fn send_message(&self, _channel: &str, text: &str) {
        self.sent.borrow_mut().push(text.to_string());
    }
    fn data_file(&self) -> PathBuf {
        self.data_file.clone()
    }
    fn is_admin(&self, _name: &str) -> bool {
        false
    }
    fn is_allowlisted(&self, name: &str) -> bool {
        self.allowlist.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
    fn now(&self) -> DateTime<Utc> {
        self.clock.get()
    }
}

fn fresh() -> (tempfile::TempDir, KarmaModule<TestHost>) {
    let dir = tempfile::tempdir().unwrap();
    let host = TestHost::new(dir.path().join("karma.txt"));
    let module = KarmaModule::init(host, KarmaConfig::default());
    (dir, module)
}

fn counts(m: &KarmaModule<TestHost>, name: &str) -> (u32, u32) {
    let r = m.record(name).unwrap();
    (r.upvotes, r.downvotes)
}

#[test]
fn upvote_and_downvote_effects() {
    let (_dir, mut m) = fresh();
    m.on_join("#dev", "yuri");

    m.on_message("#dev", "xena", "yuri++ nice");
    assert_eq!(counts(&m, "yuri"), (1, 0));
    assert_eq!(counts(&m, "xena"), (0, 0));

    m.host().advance(61);
    m.on_message("#dev", "xena", "--yuri");
    assert_eq!(counts(&m, "yuri"), (1, 1));
    assert_eq!(counts(&m, "xena"), (0, 1));
}

#[test]
fn self_votes_never_count() {
    let (_dir, mut m) = fresh();
    m.on_join("#dev", "xena");
    m.on_nick("xena", "xena_phone");

    for text in ["xena++", "--XENA", "xena_phone++", "!ytmnd xena"] {
        m.host().advance(120);
        m.on_message("#dev", "xena_phone", text);
    }
    assert_eq!(counts(&m, "xena"), (0, 0));
    assert_eq!(m.host().saves.get(), 0);
}

#[test]
fn cooldown_blocks_second_vote_within_window() {
    let (_dir, mut m) = fresh();
    m.on_join("#dev", "yuri");
    m.on_join("#dev", "zack");

    m.on_message("#dev", "xena", "yuri++");
    m.host().advance(59);
    m.on_message("#dev", "xena", "zack++");
    assert_eq!(counts(&m, "zack"), (0, 0));

    m.host().advance(1);
    m.on_message("#dev", "xena", "zack++");
    assert_eq!(counts(&m, "zack"), (1, 0));
}

#[test]
fn rejected_gesture_does_not_start_cooldown() {
    let (_dir, mut m) = fresh();
    m.on_join("#dev", "yuri");
    m.on_message("#dev", "xena", "ghost++");
    m.on_message("#dev", "xena", "yuri++");
    assert_eq!(counts(&m, "yuri"), (1, 0));
}

#[test]
fn one_vote_per_message() {
    let (_dir, mut m) = fresh();
    m.on_join("#dev", "yuri");
    m.on_join("#dev", "zack");
    m.on_message("#dev", "xena", "ghost++ yuri++ zack++");
    assert_eq!(counts(&m, "yuri"), (1, 0));
    assert_eq!(counts(&m, "zack"), (0, 0));
}

#[test]
fn nick_change_merges_aliases() {
    let (_dir, mut m) = fresh();
    m.on_join("#dev", "amy");
    m.on_message("#dev", "bea", "amy++");
    m.on_nick("amy", "amy_work");

    assert_eq!(m.karma_of("amy"), 1);
    assert_eq!(m.karma_of("AMY_WORK"), 1);
    assert_eq!(m.store().len(), 2);

    let record = m.record("amy").unwrap();
    assert_eq!(record.active_alias(), "amy_work");

    m.on_nick("amy_work", "amy");
    assert_eq!(m.record("amy").unwrap().active_alias(), "amy");
    m.on_message("#dev", "amy_work", "hello");
    assert_eq!(m.record("amy").unwrap().active_alias(), "amy_work");
    assert_eq!(m.record("amy").unwrap().aliases(), ["amy", "amy_work"]);
}

#[test]
fn unknown_departing_nick_creates_nothing() {
    let (_dir, mut m) = fresh();
    m.on_nick("stranger", "stranger2");
    assert!(m.store().is_empty());
}

#[test]
fn unknown_target_creates_nothing() {
    let (_dir, mut m) = fresh();
    m.on_message("#dev", "xena", "nonexistentuser++");
    assert_eq!(m.store().len(), 1);
    assert!(m.record("nonexistentuser").is_none());
    assert_eq!(counts(&m, "xena"), (0, 0));
}

#[test]
fn meme_link_upvotes() {
    let (_dir, mut m) = fresh();
    m.on_join("#dev", "yuri");
    m.on_message("#dev", "xena", "!YTWND yuri http://example.com");
    assert_eq!(counts(&m, "yuri"), (1, 0));
}

#[test]
fn leaderboard_orders_ties_by_insertion() {
    let (_dir, mut m) = fresh();
    m.load_from("five_a: 5:0\nminus_two: 0:2\nfive_b: 5:0\nzero: 1:1\n".as_bytes());

    m.on_command("#op", "op", " 3", KarmaCommand::Top);
    assert_eq!(
        m.host().sent.borrow().last().unwrap(),
        "Top karma: |five_a: 5| |five_b: 5| |zero: 0|."
    );
}

#[test]
fn leaderboard_count_clamped() {
    let (_dir, mut m) = fresh();
    m.load_from("a: 3:0\nb: 2:0\n".as_bytes());

    m.on_command("#op", "op", " 0", KarmaCommand::Top);
    m.on_command("#op", "op", " 50", KarmaCommand::Top);
    m.on_command("#op", "op", " lots", KarmaCommand::Top);
    let sent = m.host().sent.borrow();
    assert_eq!(sent[0], "Top karma: |a: 3|.");
    assert_eq!(sent[1], "Top karma: |a: 3| |b: 2| |op: 0|.");
    assert_eq!(sent[2], "Top karma: |a: 3|.");
}

#[test]
fn persist_then_reload_roundtrip() {
    let (dir, mut m) = fresh();
    m.on_join("#dev", "yuri");
    m.on_join("#dev", "idle");
    m.on_message("#dev", "xena", "yuri++");
    m.on_nick("yuri", "yuri_");
    m.host().advance(60);
    m.on_message("#dev", "xena", "--idle");
    m.on_join("#dev", "never_voted");

    let written = m.persist().unwrap();
    assert_eq!(written, 3);

    let data = std::fs::read_to_string(dir.path().join("karma.txt")).unwrap();
    assert!(data.contains("yuri:yuri_: 1:0\n"));
    assert!(!data.contains("never_voted"));

    let host = TestHost::new(dir.path().join("karma.txt"));
    let reloaded = KarmaModule::init(host, KarmaConfig::default());
    let mut tuples: Vec<(Vec<String>, u32, u32)> = reloaded
        .store()
        .iter()
        .map(|(_, r)| (r.aliases().to_vec(), r.upvotes, r.downvotes))
        .collect();
    tuples.sort();
    assert_eq!(
        tuples,
        vec![
            (vec!["idle".to_string()], 0, 1),
            (vec!["xena".to_string()], 0, 1),
            (vec!["yuri".to_string(), "yuri_".to_string()], 1, 0),
        ]
    );
    assert!(reloaded.record("never_voted").is_none());
}

#[test]
fn data_changed_reloads_from_disk() {
    let (dir, mut m) = fresh();
    m.on_join("#dev", "yuri");
    std::fs::write(dir.path().join("karma.txt"), "edited: 9:0\n").unwrap();

    m.on_modified();
    assert!(m.record("yuri").is_none());
    assert_eq!(m.karma_of("edited"), 9);
}

#[test]
fn truncated_data_file_keeps_parsed_records() {
    let (dir, _) = fresh();
    let path = dir.path().join("karma.txt");
    std::fs::write(&path, "good: 2:0\nalso_good:x: 1:1\ntrunc: 4").unwrap();

    let m = KarmaModule::init(TestHost::new(path), KarmaConfig::default());
    assert_eq!(m.store().len(), 2);
    assert_eq!(m.karma_of("good"), 2);
    assert_eq!(m.record("x").unwrap().active_alias(), "x");
    assert!(m.record("trunc").is_none());
}

#[test]
fn save_to_writer_uses_leaderboard_order() {
    let (_dir, mut m) = fresh();
    m.load_from("low: 0:3\nhigh: 7:0\n".as_bytes());
    let mut out = Vec::new();
    m.save(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "high: 7:0\nlow: 0:3\n");
}

#[test]
fn persist_reports_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the data file should be makes the rename fail.
    let path = dir.path().join("karma.txt");
    std::fs::create_dir_all(path.join("blocker")).unwrap();
    let mut m = KarmaModule::init(TestHost::new(path.clone()), KarmaConfig::default());
    m.on_join("#dev", "yuri");
    m.on_message("#dev", "xena", "yuri++");

    let err = m.persist().unwrap_err();
    assert!(matches!(&err, KarmaError::Persist { path: p, .. } if *p == path));
    assert!(!dir.path().join("karma.txt.tmp").exists());
}

#[test]
fn colon_names_cannot_corrupt_the_data_file() {
    let (dir, mut m) = fresh();
    for name in [":", "a:b", "low"] {
        m.on_join("#c", name);
    }
    m.on_message("#c", "x", ":++");
    m.host().advance(60);
    m.on_message("#c", "y", "a:b++");
    m.host().advance(60);
    m.on_message("#c", "z", "--low");
    m.on_nick("low", "low:afk");

    assert!(m.record(":").is_none());
    assert!(m.record("a:b").is_none());
    assert_eq!(m.record("low").unwrap().aliases(), ["low"]);

    let written = m.persist().unwrap();
    let reloaded = KarmaModule::init(
        TestHost::new(dir.path().join("karma.txt")),
        KarmaConfig::default(),
    );
    assert_eq!(reloaded.store().len(), written);
    assert_eq!(counts(&reloaded, "low"), (0, 1));
    assert_eq!(counts(&reloaded, "z"), (0, 1));
}

#[test]
fn shutdown_releases_everything() {
    let (_dir, mut m) = fresh();
    m.on_join("#dev", "yuri");
    m.shutdown();
    assert!(m.store().is_empty());
}
