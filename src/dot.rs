use std::fmt::{self, Display, Formatter};

use crate::{Bridge, CongruenceClosure, Justification};

/**
A wrapper for a [`CongruenceClosure`] that renders it in
[`dot`](https://en.wikipedia.org/wiki/DOT_(graph_description_language))
format for [Graphviz](https://graphviz.org/).

Every class is a dotted cluster of its members. Solid edges are the
equality edges, labeled by their reason; dashed edges go from an
application to its function part and argument.

```
use cclosure::*;
let mut cc = CongruenceClosure::new();
let x = cc.add_expr("x").unwrap();
let y = cc.add_expr("y").unwrap();
cc.add_expr("(f x)").unwrap();
let p = cc.add_atom(x, y).unwrap();
cc.assert_literal(Lit::pos(p)).unwrap();

let dot = cc.dot().to_string();
assert!(dot.starts_with("digraph"));
assert!(dot.contains("label = \"p0\""));
```
**/
pub struct Dot<'a, B> {
    closure: &'a CongruenceClosure<B>,
}

impl<B: Bridge> CongruenceClosure<B> {
    /// A [`Dot`] rendering of the current classes.
    pub fn dot(&self) -> Dot<'_, B> {
        Dot { closure: self }
    }
}

impl<'a, B: Bridge> Display for Dot<'a, B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let cc = self.closure;
        writeln!(f, "digraph {{")?;
        writeln!(f, "  compound=true")?;
        writeln!(f, "  clusterrank=local")?;

        for class in cc.classes() {
            writeln!(f, "  subgraph cluster_{} {{", usize::from(class.id))?;
            writeln!(f, "    style=dotted")?;
            for &node in class.iter() {
                let mut label = cc.terms.to_string(node).replace('"', "\\\"");
                if class.shared() == Some(node) {
                    label.push_str(" *");
                }
                writeln!(f, "    {}[label = \"{}\"]", usize::from(node), label)?;
            }
            writeln!(f, "  }}")?;
        }

        for node in cc.terms.ids() {
            if let Some(edge) = cc.uf.edge(node) {
                let reason = match edge.reason {
                    Justification::Asserted(lit) => lit.to_string(),
                    Justification::Congruence => "cong".to_string(),
                };
                writeln!(
                    f,
                    "  {} -> {} [label = \"{}\"]",
                    usize::from(node),
                    usize::from(edge.to),
                    reason
                )?;
            }
            if let Some((func, arg)) = cc.terms.term(node).as_app() {
                for child in [func, arg] {
                    writeln!(
                        f,
                        "  {} -> {} [style = dashed, arrowhead = empty]",
                        usize::from(node),
                        usize::from(child)
                    )?;
                }
            }
        }

        write!(f, "}}")
    }
}
