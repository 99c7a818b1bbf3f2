use std::fmt;
use std::ops::Not;

use crate::TermId;

/// A handle to an equality atom `lhs = rhs`.
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-1", serde(transparent))]
pub struct AtomId(u32);

impl From<usize> for AtomId {
    fn from(n: usize) -> AtomId {
        AtomId(n as u32)
    }
}

impl From<AtomId> for usize {
    fn from(id: AtomId) -> usize {
        id.0 as usize
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// An equality atom together with a polarity.
///
/// Positive literals assert `lhs = rhs`, negative ones `lhs != rhs`.
/// These are the currency exchanged with the boolean search: merge
/// reasons, conflict clauses and implied facts are all literals.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Lit {
    atom: AtomId,
    positive: bool,
}

impl Lit {
    /// The literal `atom`.
    pub fn pos(atom: AtomId) -> Lit {
        Lit {
            atom,
            positive: true,
        }
    }

    /// The literal `!atom`.
    pub fn neg(atom: AtomId) -> Lit {
        Lit {
            atom,
            positive: false,
        }
    }

    /// Builds a literal of the given polarity.
    pub fn new(atom: AtomId, positive: bool) -> Lit {
        Lit { atom, positive }
    }

    /// The underlying atom.
    pub fn atom(self) -> AtomId {
        self.atom
    }

    /// Returns `true` for `atom`, `false` for `!atom`.
    pub fn is_positive(self) -> bool {
        self.positive
    }
}

impl Not for Lit {
    type Output = Lit;
    fn not(self) -> Lit {
        Lit {
            atom: self.atom,
            positive: !self.positive,
        }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}", self.atom)
        } else {
            write!(f, "!{}", self.atom)
        }
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Atom {
    pub lhs: TermId,
    pub rhs: TermId,
    pub value: Option<bool>,
}

impl Atom {
    pub fn new(lhs: TermId, rhs: TermId) -> Self {
        Atom {
            lhs,
            rhs,
            value: None,
        }
    }

    /// The literal that holds under the current assignment.
    pub fn assigned(&self, id: AtomId) -> Option<Lit> {
        self.value.map(|v| Lit::new(id, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation() {
        let p = Lit::pos(AtomId::from(3));
        assert_eq!(!p, Lit::neg(AtomId::from(3)));
        assert_eq!(!!p, p);
        assert_eq!(p.to_string(), "p3");
        assert_eq!((!p).to_string(), "!p3");
        assert!(!(!p).is_positive());
    }

    #[test]
    fn assignment() {
        let mut atom = Atom::new(TermId::from(0), TermId::from(1));
        assert_eq!(atom.assigned(AtomId::from(0)), None);
        atom.value = Some(false);
        assert_eq!(atom.assigned(AtomId::from(0)), Some(Lit::neg(AtomId::from(0))));
    }
}
