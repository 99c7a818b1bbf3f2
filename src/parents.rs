use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::util::HashMap;
use crate::{FuncKey, TermBank, TermId, TriggerId, UnionFind};

/// The applications at one function key whose argument lies in a class,
/// and the reverse triggers waiting on that class at that key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ParentList {
    pub apps: Vec<TermId>,
    pub reverse_triggers: Vec<TriggerId>,
}

impl ParentList {
    fn is_empty(&self) -> bool {
        self.apps.is_empty() && self.reverse_triggers.is_empty()
    }
}

/// Parent information of one class, valid at its representative.
///
/// A class of ordinary terms uses `by_key`; a class of function-valued
/// terms uses `func_apps`, the applications whose function part is in the
/// class.
#[derive(Clone, Debug, Default)]
pub(crate) struct ParentInfo {
    pub by_key: BTreeMap<FuncKey, ParentList>,
    pub func_apps: Vec<TermId>,
}

#[derive(Clone, Copy, Debug)]
struct KeySplit {
    key: FuncKey,
    apps: usize,
    triggers: usize,
    created: bool,
}

/// What [`ParentIndex::merge`] needs to split the lists again.
#[derive(Clone, Debug)]
pub(crate) struct ParentMerge {
    func_apps: usize,
    keys: SmallVec<[KeySplit; 4]>,
}

/// New facts discovered while joining parent lists.
#[derive(Debug, Default)]
pub(crate) struct ParentEffects {
    pub congruences: Vec<(TermId, TermId)>,
    pub activations: Vec<(TriggerId, TermId)>,
}

/// Per-class parent lists, used to discover congruences when classes merge.
///
/// Joining two classes appends the absorbed class's lists to the surviving
/// ones and leaves the absorbed class's own lists untouched, so undoing a
/// merge only has to truncate.
#[derive(Clone, Debug, Default)]
pub struct ParentIndex {
    infos: Vec<ParentInfo>,
}

impl ParentIndex {
    pub fn add_node(&mut self) {
        self.infos.push(ParentInfo::default());
    }

    pub(crate) fn info(&self, rep: TermId) -> &ParentInfo {
        &self.infos[usize::from(rep)]
    }

    fn info_mut(&mut self, rep: TermId) -> &mut ParentInfo {
        &mut self.infos[usize::from(rep)]
    }

    /// Returns an application already present that is congruent to `app`.
    pub fn find_congruent(&self, app: TermId, terms: &TermBank, uf: &UnionFind) -> Option<TermId> {
        let (func, arg) = terms.term(app).as_app()?;
        let arg = uf.find(arg);
        self.info(uf.find(func))
            .func_apps
            .iter()
            .copied()
            .find(|&other| {
                other != app
                    && terms
                        .term(other)
                        .as_app()
                        .map_or(false, |(_, other_arg)| uf.find(other_arg) == arg)
            })
    }

    /// Adds `app` to the parent lists of its function and argument classes.
    pub fn register(&mut self, app: TermId, key: FuncKey, func_rep: TermId, arg_rep: TermId) {
        self.info_mut(arg_rep)
            .by_key
            .entry(key)
            .or_default()
            .apps
            .push(app);
        self.info_mut(func_rep).func_apps.push(app);
    }

    /// Exact inverse of [`register`](ParentIndex::register).
    pub fn unregister(&mut self, app: TermId, key: FuncKey, func_rep: TermId, arg_rep: TermId) {
        let popped = self.info_mut(func_rep).func_apps.pop();
        assert_eq!(popped, Some(app), "Parent registrations undone out of order");
        let info = self.info_mut(arg_rep);
        let list = info
            .by_key
            .get_mut(&key)
            .unwrap_or_else(|| panic!("No parent list for {} at {}", key, arg_rep));
        let popped = list.apps.pop();
        assert_eq!(popped, Some(app), "Parent registrations undone out of order");
        if list.is_empty() {
            info.by_key.remove(&key);
        }
    }

    /// Stores a reverse trigger, returning the applications it already applies to.
    pub fn add_reverse_trigger(&mut self, rep: TermId, key: FuncKey, trigger: TriggerId) -> &[TermId] {
        let list = self.info_mut(rep).by_key.entry(key).or_default();
        list.reverse_triggers.push(trigger);
        &list.apps
    }

    pub fn remove_reverse_trigger(&mut self, rep: TermId, key: FuncKey, trigger: TriggerId) {
        let info = self.info_mut(rep);
        let list = info
            .by_key
            .get_mut(&key)
            .unwrap_or_else(|| panic!("No parent list for {} at {}", key, rep));
        let popped = list.reverse_triggers.pop();
        assert_eq!(popped, Some(trigger), "Trigger registrations undone out of order");
        if list.is_empty() {
            info.by_key.remove(&key);
        }
    }

    /// Joins the lists of `src` into `dest`.
    ///
    /// Must be called after `uf` has relabeled the members of `src`.
    pub(crate) fn merge(
        &mut self,
        src: TermId,
        dest: TermId,
        terms: &TermBank,
        uf: &UnionFind,
        effects: &mut ParentEffects,
    ) -> ParentMerge {
        let func_of = |app: TermId| terms.term(app).as_app().map(|(f, _)| uf.find(f));
        let arg_of = |app: TermId| terms.term(app).as_app().map(|(_, a)| uf.find(a));

        let src_info = std::mem::take(self.info_mut(src));
        let dest_info = self.info_mut(dest);

        // function parts coincide now, compare the arguments
        congruent_pairs(
            &src_info.func_apps,
            &dest_info.func_apps,
            &arg_of,
            &mut effects.congruences,
        );
        let func_apps = dest_info.func_apps.len();
        dest_info.func_apps.extend_from_slice(&src_info.func_apps);

        let mut keys = SmallVec::new();
        for (&key, list) in &src_info.by_key {
            match dest_info.by_key.get_mut(&key) {
                Some(dest_list) => {
                    // arguments coincide now, compare the function parts
                    congruent_pairs(&list.apps, &dest_list.apps, &func_of, &mut effects.congruences);
                    for &trigger in &list.reverse_triggers {
                        for &app in &dest_list.apps {
                            effects.activations.push((trigger, app));
                        }
                    }
                    for &trigger in &dest_list.reverse_triggers {
                        for &app in &list.apps {
                            effects.activations.push((trigger, app));
                        }
                    }
                    keys.push(KeySplit {
                        key,
                        apps: dest_list.apps.len(),
                        triggers: dest_list.reverse_triggers.len(),
                        created: false,
                    });
                    dest_list.apps.extend_from_slice(&list.apps);
                    dest_list
                        .reverse_triggers
                        .extend_from_slice(&list.reverse_triggers);
                }
                None => {
                    keys.push(KeySplit {
                        key,
                        apps: 0,
                        triggers: 0,
                        created: true,
                    });
                    dest_info.by_key.insert(key, list.clone());
                }
            }
        }

        *self.info_mut(src) = src_info;
        ParentMerge { func_apps, keys }
    }

    /// Splits the lists joined by [`merge`](ParentIndex::merge).
    pub(crate) fn undo(&mut self, record: ParentMerge, dest: TermId) {
        let dest_info = self.info_mut(dest);
        for split in record.keys.iter().rev() {
            if split.created {
                dest_info.by_key.remove(&split.key);
            } else if let Some(list) = dest_info.by_key.get_mut(&split.key) {
                list.apps.truncate(split.apps);
                list.reverse_triggers.truncate(split.triggers);
            }
        }
        dest_info.func_apps.truncate(record.func_apps);
    }
}

/// Pairs up applications from both sides that agree on `key`.
/// Pairs are reported as `(src side, dest side)`.
fn congruent_pairs(
    src: &[TermId],
    dest: &[TermId],
    key: impl Fn(TermId) -> Option<TermId>,
    out: &mut Vec<(TermId, TermId)>,
) {
    if src.is_empty() || dest.is_empty() {
        return;
    }
    let index_src = src.len() <= dest.len();
    let (index, probe) = if index_src { (src, dest) } else { (dest, src) };

    let mut seen: HashMap<TermId, TermId> = HashMap::default();
    for &app in index {
        if let Some(k) = key(app) {
            seen.entry(k).or_insert(app);
        }
    }
    for &app in probe {
        if let Some(&other) = key(app).and_then(|k| seen.get(&k)) {
            out.push(if index_src { (other, app) } else { (app, other) });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Justification, Lit};

    fn setup(exprs: &[&str]) -> (TermBank, UnionFind, ParentIndex, Vec<TermId>) {
        let mut terms = TermBank::default();
        let ids = exprs.iter().map(|e| terms.parse(e).unwrap()).collect();
        let mut uf = UnionFind::default();
        let mut parents = ParentIndex::default();
        for id in terms.ids() {
            uf.make_set();
            parents.add_node();
            if let Some((func, arg)) = terms.term(id).as_app() {
                let key = terms.term(func).func_key().unwrap();
                parents.register(id, key, func, arg);
            }
        }
        (terms, uf, parents, ids)
    }

    #[test]
    fn merging_arguments_finds_congruences() {
        crate::init_logger();
        let (terms, mut uf, mut parents, ids) = setup(&["x", "y", "(f x)", "(f y)", "(g x)"]);
        let (x, y, fx, fy) = (ids[0], ids[1], ids[2], ids[3]);

        let before = parents.info(y).by_key.clone();
        let (src, dest) = uf.link(x, y, Justification::Asserted(Lit::pos(0.into())), 1);
        let mut effects = ParentEffects::default();
        let record = parents.merge(src, dest, &terms, &uf, &mut effects);
        assert_eq!(effects.congruences, vec![(fx, fy)]);
        // (g x) now hangs off y's class too
        assert_eq!(parents.info(y).by_key.len(), 2);

        parents.undo(record, dest);
        assert_eq!(parents.info(y).by_key, before);
        assert_eq!(parents.info(x).by_key.len(), 2);
    }

    #[test]
    fn merging_function_parts_compares_arguments() {
        let (terms, mut uf, mut parents, ids) = setup(&["a", "b", "(h a b)", "(h b b)"]);
        let (a, b, hab, hbb) = (ids[0], ids[1], ids[2], ids[3]);
        let ha = terms.term(hab).as_app().unwrap().0;
        let hb = terms.term(hbb).as_app().unwrap().0;

        // merge the partial applications directly, as a congruence would
        let (src, dest) = uf.link(ha, hb, Justification::Congruence, 1);
        let mut effects = ParentEffects::default();
        parents.merge(src, dest, &terms, &uf, &mut effects);
        assert_eq!(effects.congruences, vec![(hab, hbb)]);
        assert_eq!(parents.find_congruent(hab, &terms, &uf), Some(hbb));
        assert!(terms.get(a).is_ok() && terms.get(b).is_ok());
    }

    #[test]
    fn reverse_triggers_meet_applications() {
        let (terms, mut uf, mut parents, ids) = setup(&["x", "y", "(f x)"]);
        let (x, y, fx) = (ids[0], ids[1], ids[2]);
        let key = terms.key_of("f", 0).unwrap();
        let trigger = TriggerId::from(0);
        assert!(parents.add_reverse_trigger(y, key, trigger).is_empty());

        let (src, dest) = uf.link(x, y, Justification::Congruence, 1);
        let mut effects = ParentEffects::default();
        let record = parents.merge(src, dest, &terms, &uf, &mut effects);
        assert_eq!(effects.activations, vec![(trigger, fx)]);
        parents.undo(record, dest);
        parents.remove_reverse_trigger(y, key, trigger);
        assert!(parents.info(y).by_key.is_empty());
    }
}
