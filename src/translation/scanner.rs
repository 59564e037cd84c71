#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    Bracketed,
    LineComment,
    BlockComment,
}

impl State {
    /// State entered when `b` opens a quoted region, if it does.
    pub(super) fn opened_by(b: u8) -> Option<State> {
        match b {
            b'\'' => Some(State::SingleQuoted),
            b'"' => Some(State::DoubleQuoted),
            b'`' => Some(State::Backticked),
            b'[' => Some(State::Bracketed),
            _ => None,
        }
    }

    pub(super) fn closing_byte(self) -> Option<u8> {
        match self {
            State::SingleQuoted => Some(b'\''),
            State::DoubleQuoted => Some(b'"'),
            State::Backticked => Some(b'`'),
            State::Bracketed => Some(b']'),
            _ => None,
        }
    }
}
