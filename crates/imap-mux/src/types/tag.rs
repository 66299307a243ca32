//! Command tags.
//!
//! Tags correlate commands with their completion responses. This client
//! renders them on the wire as a lowercase `a` followed by decimal digits,
//! starting at `a0` and increasing strictly monotonically for the lifetime
//! of the session.

/// A client-assigned command identifier.
///
/// The integer value is the identity; the wire form is `a{n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(u32);

impl Tag {
    /// Creates a tag from its integer identity.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the integer identity.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Decodes the wire form: `a` followed by decimal digits.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('a')?;
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// Monotonic tag allocator.
///
/// Not synchronized; the registry owns one and hands out tags under its own
/// lock so that allocation order matches registration order.
#[derive(Debug, Default)]
pub struct TagSequence {
    next: u32,
}

impl TagSequence {
    /// Creates an allocator starting at `a0`.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocates the next tag.
    ///
    /// # Panics
    ///
    /// Panics if the tag space is exhausted, which would take 4+ billion
    /// commands in one session.
    pub fn next_tag(&mut self) -> Tag {
        let tag = Tag(self.next);
        self.next = self.next.checked_add(1).expect("tag space exhausted");
        tag
    }

    /// Returns the tag the next allocation will produce.
    #[must_use]
    pub const fn peek(&self) -> Tag {
        Tag(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_round_trips() {
        let tag = Tag::new(17);
        assert_eq!(tag.to_string(), "a17");
        assert_eq!(Tag::parse("a17"), Some(tag));
    }

    #[test]
    fn parse_rejects_foreign_tags() {
        assert_eq!(Tag::parse("A17"), None);
        assert_eq!(Tag::parse("a"), None);
        assert_eq!(Tag::parse("a1x"), None);
        assert_eq!(Tag::parse("17"), None);
        assert_eq!(Tag::parse(""), None);
        assert_eq!(Tag::parse("a-1"), None);
    }

    #[test]
    fn allocation_is_strictly_monotonic() {
        let mut tags = TagSequence::new();
        let mut previous = tags.next_tag();
        assert_eq!(previous, Tag::new(0));
        for _ in 0..1000 {
            let tag = tags.next_tag();
            assert!(tag > previous);
            previous = tag;
        }
    }

    #[test]
    fn peek_does_not_allocate() {
        let mut tags = TagSequence::new();
        assert_eq!(tags.peek(), Tag::new(0));
        assert_eq!(tags.peek(), Tag::new(0));
        assert_eq!(tags.next_tag(), Tag::new(0));
        assert_eq!(tags.peek(), Tag::new(1));
    }
}
