use crate::util::{remove_item, HashMap};
use crate::{AtomId, Lit, TermId, TriggerId};

/// A disequality witness between two classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Disequality {
    /// A member of one class.
    pub lhs: TermId,
    /// A member of the other class.
    pub rhs: TermId,
    /// The negative literal that asserted `lhs != rhs`.
    pub reason: Lit,
}

/// Everything known between the members of two classes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PairInfo {
    pub eqlits: Vec<AtomId>,
    pub diseq: Option<Disequality>,
    pub triggers: Vec<TriggerId>,
}

impl PairInfo {
    fn is_empty(&self) -> bool {
        self.eqlits.is_empty() && self.diseq.is_none() && self.triggers.is_empty()
    }
}

#[derive(Clone, Debug)]
struct PairSplit {
    other: TermId,
    position: usize,
    info: PairInfo,
    eqlits: usize,
    triggers: usize,
    diseq_moved: bool,
    created: bool,
}

/// What [`PairIndex::merge`] needs to split the entries again.
#[derive(Clone, Debug, Default)]
pub(crate) struct PairMerge {
    splits: Vec<PairSplit>,
}

/// Facts implied by re-keying the entries of a merged class.
#[derive(Debug, Default)]
pub(crate) struct PairEffects {
    pub now_equal: Vec<AtomId>,
    pub now_distinct: Vec<(AtomId, Disequality)>,
    pub fired: Vec<TriggerId>,
}

fn key(a: TermId, b: TermId) -> (TermId, TermId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Entries keyed by unordered pairs of representatives.
///
/// Entries are created on first use and dropped as soon as they are empty.
/// Each representative also lists the partners it shares an entry with, so
/// merging a class only visits its own entries.
#[derive(Clone, Debug, Default)]
pub struct PairIndex {
    entries: HashMap<(TermId, TermId), PairInfo>,
    partners: Vec<Vec<TermId>>,
}

impl PairIndex {
    pub fn add_node(&mut self) {
        self.partners.push(Vec::new());
    }

    pub(crate) fn get(&self, a: TermId, b: TermId) -> Option<&PairInfo> {
        self.entries.get(&key(a, b))
    }

    pub fn partners(&self, rep: TermId) -> &[TermId] {
        &self.partners[usize::from(rep)]
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&(TermId, TermId), &PairInfo)> {
        self.entries.iter()
    }

    fn entry(&mut self, a: TermId, b: TermId) -> &mut PairInfo {
        debug_assert_ne!(a, b);
        let k = key(a, b);
        if !self.entries.contains_key(&k) {
            self.partners[usize::from(a)].push(b);
            self.partners[usize::from(b)].push(a);
        }
        self.entries.entry(k).or_default()
    }

    /// Drops the entry if it became empty. Only valid when the entry was
    /// the last one created for both representatives.
    fn release(&mut self, a: TermId, b: TermId) {
        let k = key(a, b);
        if self.entries.get(&k).map_or(false, PairInfo::is_empty) {
            self.entries.remove(&k);
            for (x, y) in [(a, b), (b, a)] {
                let popped = self.partners[usize::from(x)].pop();
                assert_eq!(popped, Some(y), "Pair entries released out of order");
            }
        }
    }

    /// Records that `atom` equates members of the classes `a` and `b`.
    /// Returns the disequality witness between them, if there is one.
    pub fn add_eqlit(&mut self, a: TermId, b: TermId, atom: AtomId) -> Option<Disequality> {
        let info = self.entry(a, b);
        info.eqlits.push(atom);
        info.diseq
    }

    pub fn remove_eqlit(&mut self, a: TermId, b: TermId, atom: AtomId) {
        let info = self
            .entries
            .get_mut(&key(a, b))
            .unwrap_or_else(|| panic!("No pair entry for {} and {}", a, b));
        let popped = info.eqlits.pop();
        assert_eq!(popped, Some(atom), "Atom registrations undone out of order");
        self.release(a, b);
    }

    pub fn add_trigger(&mut self, a: TermId, b: TermId, trigger: TriggerId) {
        self.entry(a, b).triggers.push(trigger);
    }

    pub fn remove_trigger(&mut self, a: TermId, b: TermId, trigger: TriggerId) {
        let info = self
            .entries
            .get_mut(&key(a, b))
            .unwrap_or_else(|| panic!("No pair entry for {} and {}", a, b));
        let popped = info.triggers.pop();
        assert_eq!(popped, Some(trigger), "Trigger registrations undone out of order");
        self.release(a, b);
    }

    /// Records a disequality witness between the classes `a` and `b`.
    ///
    /// Returns `None` if the pair already has a witness, which is kept.
    /// Otherwise returns the atoms between the two classes that are now
    /// known to be false.
    pub fn set_diseq(&mut self, a: TermId, b: TermId, diseq: Disequality) -> Option<Vec<AtomId>> {
        let info = self.entry(a, b);
        if info.diseq.is_some() {
            return None;
        }
        info.diseq = Some(diseq);
        Some(info.eqlits.clone())
    }

    pub fn unset_diseq(&mut self, a: TermId, b: TermId) {
        let info = self
            .entries
            .get_mut(&key(a, b))
            .unwrap_or_else(|| panic!("No pair entry for {} and {}", a, b));
        assert!(info.diseq.take().is_some(), "No disequality between {} and {}", a, b);
        self.release(a, b);
    }

    /// Re-keys every entry of `src` onto `dest`.
    pub(crate) fn merge(&mut self, src: TermId, dest: TermId, effects: &mut PairEffects) -> PairMerge {
        let mut record = PairMerge::default();
        let others = self.partners[usize::from(src)].clone();
        for other in others {
            let info = self
                .entries
                .remove(&key(src, other))
                .unwrap_or_else(|| panic!("Missing pair entry for {} and {}", src, other));
            let position = remove_item(&mut self.partners[usize::from(other)], &src)
                .unwrap_or_else(|| panic!("{} does not list {} as a partner", other, src));

            if other == dest {
                // the two classes became one
                effects.now_equal.extend_from_slice(&info.eqlits);
                effects.fired.extend_from_slice(&info.triggers);
                record.splits.push(PairSplit {
                    other,
                    position,
                    info,
                    eqlits: 0,
                    triggers: 0,
                    diseq_moved: false,
                    created: false,
                });
                continue;
            }

            let created = !self.entries.contains_key(&key(dest, other));
            let target = self.entry(dest, other);
            let (eqlits, triggers) = (target.eqlits.len(), target.triggers.len());
            let mut diseq_moved = false;
            match (target.diseq, info.diseq) {
                (None, Some(d)) => {
                    target.diseq = Some(d);
                    diseq_moved = true;
                    effects
                        .now_distinct
                        .extend(target.eqlits.iter().map(|&atom| (atom, d)));
                }
                (Some(d), None) => {
                    effects
                        .now_distinct
                        .extend(info.eqlits.iter().map(|&atom| (atom, d)));
                }
                _ => {}
            }
            target.eqlits.extend_from_slice(&info.eqlits);
            target.triggers.extend_from_slice(&info.triggers);
            record.splits.push(PairSplit {
                other,
                position,
                info,
                eqlits,
                triggers,
                diseq_moved,
                created,
            });
        }
        record
    }

    /// Splits the entries re-keyed by [`merge`](PairIndex::merge).
    pub(crate) fn undo(&mut self, record: PairMerge, src: TermId, dest: TermId) {
        for split in record.splits.into_iter().rev() {
            let other = split.other;
            if other != dest {
                if split.created {
                    self.entries.remove(&key(dest, other));
                    for (x, y) in [(dest, other), (other, dest)] {
                        let popped = self.partners[usize::from(x)].pop();
                        assert_eq!(popped, Some(y), "Pair entries split out of order");
                    }
                } else {
                    let target = self
                        .entries
                        .get_mut(&key(dest, other))
                        .unwrap_or_else(|| panic!("Missing pair entry for {} and {}", dest, other));
                    target.eqlits.truncate(split.eqlits);
                    target.triggers.truncate(split.triggers);
                    if split.diseq_moved {
                        target.diseq = None;
                    }
                }
            }
            self.partners[usize::from(other)].insert(split.position, src);
            self.entries.insert(key(src, other), split.info);
        }
    }
}
