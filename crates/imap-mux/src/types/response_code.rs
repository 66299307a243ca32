//! Bracketed response codes.

/// The machine-readable code inside the `[...]` of an OK/NO/BAD text.
///
/// Three code forms are decoded structurally; every other code is kept as
/// its atom plus whatever free text followed it up to the closing bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// PERMANENTFLAGS: the flags the client can change permanently.
    PermanentFlags(Vec<String>),
    /// UIDVALIDITY: unique identifier validity value.
    UidValidity(u32),
    /// UIDNEXT: the next message UID the server predicts.
    UidNext(u32),
    /// Any unrecognized code.
    Other {
        /// The code atom, e.g. `READ-ONLY` or `AUTHENTICATIONFAILED`.
        atom: String,
        /// Free text following the atom, if any.
        text: Option<String>,
    },
}

impl ResponseCode {
    /// Returns the code atom for unrecognized codes.
    #[must_use]
    pub fn as_other(&self) -> Option<&str> {
        match self {
            Self::Other { atom, .. } => Some(atom),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_accessor() {
        let code = ResponseCode::Other {
            atom: "READ-ONLY".into(),
            text: None,
        };
        assert_eq!(code.as_other(), Some("READ-ONLY"));
        assert_eq!(ResponseCode::UidNext(4392).as_other(), None);
    }
}
