//! Command completion status.

/// The three-valued status of an OK/NO/BAD response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed for an operational reason (e.g. unknown mailbox).
    No,
    /// Command was malformed or invalid in the current state.
    Bad,
}

impl Status {
    /// Decodes a status keyword, case-insensitively.
    #[must_use]
    pub fn from_atom(atom: &str) -> Option<Self> {
        if atom.eq_ignore_ascii_case("OK") {
            Some(Self::Ok)
        } else if atom.eq_ignore_ascii_case("NO") {
            Some(Self::No)
        } else if atom.eq_ignore_ascii_case("BAD") {
            Some(Self::Bad)
        } else {
            None
        }
    }

    /// The wire keyword for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_keywords() {
        assert_eq!(Status::from_atom("OK"), Some(Status::Ok));
        assert_eq!(Status::from_atom("NO"), Some(Status::No));
        assert_eq!(Status::from_atom("BAD"), Some(Status::Bad));
        assert_eq!(Status::from_atom("bad"), Some(Status::Bad));
        assert_eq!(Status::from_atom("PREAUTH"), None);
        assert_eq!(Status::from_atom(""), None);
    }

    #[test]
    fn displays_wire_form() {
        assert_eq!(Status::Ok.to_string(), "OK");
        assert_eq!(Status::No.to_string(), "NO");
        assert_eq!(Status::Bad.to_string(), "BAD");
    }
}
