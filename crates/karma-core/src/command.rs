//! Commands the karma module answers, and how their triggers are spelled.

/// Chat commands handled by [`KarmaModule::on_command`](crate::module::KarmaModule::on_command).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KarmaCommand {
    /// `karma [name]`: the caller's score, or someone else's for trusted callers.
    Show,
    /// `ktop [count]`: the leaderboard.
    Top,
}

impl KarmaCommand {
    pub const ALL: [KarmaCommand; 2] = [KarmaCommand::Show, KarmaCommand::Top];

    pub fn name(self) -> &'static str {
        match self {
            KarmaCommand::Show => "karma",
            KarmaCommand::Top => "ktop",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name().eq_ignore_ascii_case(name))
    }
}

/// Split a chat line into a command and its raw argument text, if it starts
/// with one of `control_chars` followed by a command name.
pub fn parse_command<'a, S: AsRef<str>>(
    text: &'a str,
    control_chars: &[S],
) -> Option<(KarmaCommand, &'a str)> {
    let rest = control_chars.iter().find_map(|cc| {
        let cc: &str = cc.as_ref();
        if cc.is_empty() {
            None
        } else {
            text.strip_prefix(cc)
        }
    })?;

    let (word, arg) = match rest.find(char::is_whitespace) {
        Some(split) => rest.split_at(split),
        None => (rest, ""),
    };
    KarmaCommand::from_name(word).map(|cmd| (cmd, arg))
}
