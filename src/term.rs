use std::fmt;

use log::*;
use symbolic_expressions::{parser::parse_str, Sexp, SexpError};
use thiserror::Error;

use crate::util::{HashMap, IndexMap};
use crate::{Symbol, TermId};

/// Identifies one argument position of one function symbol.
///
/// Every function-valued node (the bare symbol `f` and each partial
/// application `f a1 .. ai`) carries the key of the position it is waiting
/// to be applied at. Parent lists are indexed by these keys.
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-1", serde(transparent))]
pub struct FuncKey(u32);

impl fmt::Display for FuncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k{}", self.0)
    }
}

/// The shape of a term node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TermKind {
    /// A constant, or the bare symbol of a function with positive arity.
    Symbol(Symbol),
    /// A curried application of a function-valued node to one argument.
    App {
        /// The function part, always function-valued.
        func: TermId,
        /// The argument, never function-valued.
        arg: TermId,
    },
}

/// An interned, immutable term node.
#[derive(Clone, Debug)]
pub struct Term {
    kind: TermKind,
    head: Symbol,
    applied: usize,
    key: Option<FuncKey>,
}

impl Term {
    /// The shape of this node.
    pub fn kind(&self) -> TermKind {
        self.kind
    }

    /// The function symbol at the head of the (possibly partial) application.
    pub fn head(&self) -> Symbol {
        self.head
    }

    /// `Some` iff this node is function-valued, i.e. a partial application.
    pub fn func_key(&self) -> Option<FuncKey> {
        self.key
    }

    /// Returns `true` for nodes that only exist because of currying.
    pub fn is_function(&self) -> bool {
        self.key.is_some()
    }

    /// The `(func, arg)` parts of an application node.
    pub fn as_app(&self) -> Option<(TermId, TermId)> {
        match self.kind {
            TermKind::App { func, arg } => Some((func, arg)),
            TermKind::Symbol(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Function {
    arity: usize,
    first_key: FuncKey,
}

/// Errors raised while building terms.
///
/// These are always reported at construction time, before the term can
/// reach the congruence engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermError {
    /// A symbol was used with a different number of arguments than it was declared with.
    #[error("`{name}` has arity {expected} but was given {found} argument(s)")]
    ArityMismatch {
        /// The offending symbol.
        name: Symbol,
        /// The declared arity.
        expected: usize,
        /// The number of arguments it was used with.
        found: usize,
    },
    /// The handle does not belong to this term bank.
    #[error("unknown term {0}")]
    UnknownTerm(TermId),
    /// A function-valued node was used as an argument.
    #[error("{0} is a partial application and cannot be an argument")]
    PartialArgument(TermId),
    /// An equality atom mentions a function-valued node.
    #[error("cannot equate partial applications ({0}, {1})")]
    PartialEquality(TermId, TermId),
    /// A node that is not function-valued was applied to an argument.
    #[error("{0} is not function-valued")]
    NotAFunction(TermId),
    /// The symbol was never declared with a positive arity.
    #[error("`{0}` is not a declared function")]
    UnknownFunction(Symbol),
    /// An argument position past the arity of a function.
    #[error("`{name}` has no argument position {position}")]
    BadPosition {
        /// The function symbol.
        name: Symbol,
        /// The requested position.
        position: usize,
    },
    /// The input was not a well-formed s-expression term.
    #[error("parse error: {0}")]
    Parse(String),
    /// The input s-expression was empty.
    #[error("empty term")]
    Empty,
}

impl From<SexpError> for TermError {
    fn from(e: SexpError) -> TermError {
        TermError::Parse(e.to_string())
    }
}

/** Interns the ground terms of one solving context.

Every unique ground subterm is built exactly once; building the same term
again returns the same [`TermId`].
Applications are curried: `(f a b)` is stored as `((f a) b)`, where the
bare `f` and the partial application `(f a)` are *function-valued* nodes.
Each function symbol gets a fixed arity the first time it is used (or when
it is [`declare`](TermBank::declare)d), and every later use is checked
against it.

```
use cclosure::TermBank;

let mut bank = TermBank::default();
let t = bank.parse("(f (g a) b)").unwrap();
assert_eq!(bank.parse("(f (g a) b)").unwrap(), t);
assert_eq!(bank.to_string(t), "(f (g a) b)");
assert!(bank.parse("(f a)").is_err());
```
**/
#[derive(Clone, Default)]
pub struct TermBank {
    terms: Vec<Term>,
    users: Vec<Vec<TermId>>,
    memo: HashMap<TermKind, TermId>,
    functions: IndexMap<Symbol, Function>,
    n_keys: u32,
}

impl fmt::Debug for TermBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries((0..self.len()).map(|i| {
                let id = TermId::from(i);
                (id, crate::util::DisplayAsDebug(self.to_string(id)))
            }))
            .finish()
    }
}

impl TermBank {
    /// The number of term nodes, including function-valued ones.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if no term was built yet.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterates over every handle in creation order.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = TermId> {
        (0..self.terms.len()).map(TermId::from)
    }

    /// Looks up a node.
    pub fn get(&self, id: TermId) -> Result<&Term, TermError> {
        self.terms
            .get(usize::from(id))
            .ok_or(TermError::UnknownTerm(id))
    }

    pub(crate) fn term(&self, id: TermId) -> &Term {
        &self.terms[usize::from(id)]
    }

    /// Returns `true` if `id` is function-valued.
    pub fn is_function(&self, id: TermId) -> bool {
        self.term(id).is_function()
    }

    /// The applications whose function part is exactly `id`.
    pub fn users(&self, id: TermId) -> &[TermId] {
        &self.users[usize::from(id)]
    }

    /// Declares `name` with the given arity.
    ///
    /// Re-declaring with the same arity is allowed.
    pub fn declare(&mut self, name: impl Into<Symbol>, arity: usize) -> Result<(), TermError> {
        self.function_info(name.into(), arity).map(|_| ())
    }

    fn function_info(&mut self, name: Symbol, arity: usize) -> Result<Function, TermError> {
        if let Some(&func) = self.functions.get(&name) {
            return if func.arity == arity {
                Ok(func)
            } else {
                Err(TermError::ArityMismatch {
                    name,
                    expected: func.arity,
                    found: arity,
                })
            };
        }
        let func = Function {
            arity,
            first_key: FuncKey(self.n_keys),
        };
        self.n_keys += arity as u32;
        self.functions.insert(name, func);
        trace!("Declared {}/{}", name, arity);
        Ok(func)
    }

    /// The arity `name` was declared with, if any.
    pub fn arity(&self, name: impl Into<Symbol>) -> Option<usize> {
        self.functions.get(&name.into()).map(|f| f.arity)
    }

    /// The key of the application of `name` at argument `position`.
    pub fn key_of(&self, name: impl Into<Symbol>, position: usize) -> Result<FuncKey, TermError> {
        let name = name.into();
        let func = self
            .functions
            .get(&name)
            .filter(|f| f.arity > 0)
            .ok_or(TermError::UnknownFunction(name))?;
        if position >= func.arity {
            return Err(TermError::BadPosition { name, position });
        }
        Ok(FuncKey(func.first_key.0 + position as u32))
    }

    fn intern(&mut self, kind: TermKind, head: Symbol, applied: usize, func: Function) -> TermId {
        if let Some(&id) = self.memo.get(&kind) {
            return id;
        }
        let key = if applied < func.arity {
            Some(FuncKey(func.first_key.0 + applied as u32))
        } else {
            None
        };
        let id = TermId::from(self.terms.len());
        if let TermKind::App { func, .. } = kind {
            self.users[usize::from(func)].push(id);
        }
        self.terms.push(Term {
            kind,
            head,
            applied,
            key,
        });
        self.users.push(Vec::new());
        self.memo.insert(kind, id);
        id
    }

    /// Builds the constant `name`.
    pub fn constant(&mut self, name: impl Into<Symbol>) -> Result<TermId, TermError> {
        self.app(name, &[])
    }

    /// Builds the bare function-valued node of `name`.
    ///
    /// `name` must have been declared (or used) with a positive arity.
    pub fn function(&mut self, name: impl Into<Symbol>) -> Result<TermId, TermError> {
        let name = name.into();
        let func = *self
            .functions
            .get(&name)
            .filter(|f| f.arity > 0)
            .ok_or(TermError::UnknownFunction(name))?;
        Ok(self.intern(TermKind::Symbol(name), name, 0, func))
    }

    /// Builds `name(args..)`, declaring `name` with `args.len()` arguments
    /// on first use.
    pub fn app(&mut self, name: impl Into<Symbol>, args: &[TermId]) -> Result<TermId, TermError> {
        let name = name.into();
        for &arg in args {
            if self.get(arg)?.is_function() {
                return Err(TermError::PartialArgument(arg));
            }
        }
        let func = self.function_info(name, args.len())?;
        let mut id = self.intern(TermKind::Symbol(name), name, 0, func);
        for (i, &arg) in args.iter().enumerate() {
            id = self.intern(TermKind::App { func: id, arg }, name, i + 1, func);
        }
        Ok(id)
    }

    /// Applies the function-valued node `func` to one argument.
    pub fn apply(&mut self, func: TermId, arg: TermId) -> Result<TermId, TermError> {
        let term = self.get(func)?;
        if !term.is_function() {
            return Err(TermError::NotAFunction(func));
        }
        let (head, applied) = (term.head, term.applied);
        if self.get(arg)?.is_function() {
            return Err(TermError::PartialArgument(arg));
        }
        let info = self.functions[&head];
        Ok(self.intern(TermKind::App { func, arg }, head, applied + 1, info))
    }

    /// Builds a term from an s-expression such as `(f (g a) b)`.
    pub fn parse(&mut self, s: &str) -> Result<TermId, TermError> {
        let sexp = parse_str(s.trim())?;
        self.add_sexp(&sexp)
    }

    /// Builds a term from an already parsed s-expression.
    pub fn add_sexp(&mut self, sexp: &Sexp) -> Result<TermId, TermError> {
        match sexp {
            Sexp::Empty => Err(TermError::Empty),
            Sexp::String(s) => self.constant(s.as_str()),
            Sexp::List(list) => {
                let (op, args) = list.split_first().ok_or(TermError::Empty)?;
                let op = match op {
                    Sexp::String(op) => op,
                    op => return Err(TermError::Parse(format!("expected a symbol, got {}", op))),
                };
                let args = args
                    .iter()
                    .map(|arg| self.add_sexp(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.app(op.as_str(), &args)
            }
        }
    }

    /// Splits a node into its head symbol and the arguments applied so far.
    pub fn head_and_args(&self, mut id: TermId) -> (Symbol, Vec<TermId>) {
        let mut args = vec![];
        loop {
            match self.term(id).kind {
                TermKind::Symbol(head) => {
                    args.reverse();
                    return (head, args);
                }
                TermKind::App { func, arg } => {
                    args.push(arg);
                    id = func;
                }
            }
        }
    }

    /// The original formula a node stands for.
    ///
    /// Partial applications only exist because of currying and have no
    /// formula.
    pub fn formula(&self, id: TermId) -> Option<Sexp> {
        if self.term(id).is_function() {
            return None;
        }
        Some(self.to_sexp(id))
    }

    /// Builds the s-expression of a node bottom up, so deep terms do not
    /// grow the call stack.
    fn to_sexp(&self, id: TermId) -> Sexp {
        let mut todo = vec![(id, false)];
        let mut done: Vec<Sexp> = vec![];
        while let Some((id, expanded)) = todo.pop() {
            let (head, args) = self.head_and_args(id);
            let head = Sexp::String(head.to_string());
            if args.is_empty() && !self.term(id).is_function() {
                done.push(head);
            } else if expanded {
                let mut list = vec![head];
                list.extend(done.drain(done.len() - args.len()..));
                done.push(Sexp::List(list));
            } else {
                todo.push((id, true));
                todo.extend(args.into_iter().rev().map(|arg| (arg, false)));
            }
        }
        done.pop().unwrap_or_default()
    }

    /// Like [`formula`](TermBank::formula), but partial applications are
    /// rendered with a trailing `_` for every missing argument.
    pub fn sexp(&self, id: TermId) -> Sexp {
        let term = self.term(id);
        let mut s = self.to_sexp(id);
        if let (Sexp::List(list), Some(func)) = (&mut s, self.functions.get(&term.head)) {
            for _ in term.applied..func.arity {
                list.push(Sexp::String("_".into()));
            }
        }
        s
    }

    /// Renders a node; partial applications get a trailing `_` for every
    /// missing argument.
    pub fn to_string(&self, id: TermId) -> String {
        self.sexp(id).to_string()
    }

    /// Every node whose application chain reaches a full application
    /// through `id`, or `id` itself if it is not function-valued.
    pub fn full_applications(&self, id: TermId) -> Vec<TermId> {
        let mut found = vec![];
        let mut todo = vec![id];
        while let Some(t) = todo.pop() {
            if self.term(t).is_function() {
                todo.extend(self.users(t).iter().copied());
            } else {
                found.push(t);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_consing_shares_subterms() {
        crate::init_logger();
        let mut bank = TermBank::default();
        let a = bank.constant("a").unwrap();
        let ga = bank.app("g", &[a]).unwrap();
        let f1 = bank.parse("(f (g a) a)").unwrap();
        let f2 = bank.app("f", &[ga, a]).unwrap();
        assert_eq!(f1, f2);
        // a, g, (g a), f, (f (g a)), (f (g a) a)
        assert_eq!(bank.len(), 6);
        assert_eq!(bank.head_and_args(f1), (Symbol::from("f"), vec![ga, a]));
    }

    #[test]
    fn currying_assigns_keys_per_position() {
        let mut bank = TermBank::default();
        let t = bank.parse("(h a b c)").unwrap();
        assert!(!bank.is_function(t));
        let (func, _) = bank.get(t).unwrap().as_app().unwrap();
        let (func2, _) = bank.get(func).unwrap().as_app().unwrap();
        assert_eq!(bank.get(func).unwrap().func_key(), Some(bank.key_of("h", 2).unwrap()));
        assert_eq!(bank.get(func2).unwrap().func_key(), Some(bank.key_of("h", 1).unwrap()));
        assert_ne!(bank.key_of("h", 1).unwrap(), bank.key_of("h", 2).unwrap());
        assert_eq!(bank.formula(func), None);
        assert_eq!(bank.to_string(func), "(h a b _)");
        assert_eq!(bank.full_applications(func2), vec![t]);
    }

    #[test]
    fn malformed_terms_are_rejected() {
        let mut bank = TermBank::default();
        bank.declare("f", 2).unwrap();
        assert_eq!(
            bank.parse("(f a)"),
            Err(TermError::ArityMismatch {
                name: "f".into(),
                expected: 2,
                found: 1
            })
        );
        let f = bank.function("f").unwrap();
        let a = bank.constant("a").unwrap();
        assert_eq!(bank.app("g", &[f]), Err(TermError::PartialArgument(f)));
        assert_eq!(bank.apply(a, a), Err(TermError::NotAFunction(a)));
        assert_eq!(bank.get(TermId::from(99)).err(), Some(TermError::UnknownTerm(TermId::from(99))));
        assert!(matches!(bank.parse("(f a"), Err(TermError::Parse(_))));
        assert_eq!(bank.function("zzz"), Err(TermError::UnknownFunction("zzz".into())));
        assert_eq!(
            bank.key_of("f", 2),
            Err(TermError::BadPosition {
                name: "f".into(),
                position: 2
            })
        );
    }

    #[test]
    fn apply_matches_app() {
        let mut bank = TermBank::default();
        let a = bank.constant("a").unwrap();
        let b = bank.constant("b").unwrap();
        let fab = bank.app("f", &[a, b]).unwrap();
        let f = bank.function("f").unwrap();
        let fa = bank.apply(f, a).unwrap();
        assert_eq!(bank.apply(fa, b).unwrap(), fab);
        assert_eq!(bank.formula(fab).unwrap().to_string(), "(f a b)");
    }
}
