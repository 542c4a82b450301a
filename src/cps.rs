use std::fmt;


/// Continuation name the compiler hands the top-level expression. Applying it
/// stops the trampoline and makes its argument the program result.
pub const HALT: &str = "$$HALT";


/// An operand with no sub-computation left in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Number(i64),
    Var(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cps {
    App {
        target: Atom,
        args: Vec<Atom>,
    },

    If {
        test: Atom,
        yes: Box<Self>,
        no: Box<Self>,
    },

    LetRec {
        bindings: Vec<Binding>,
        body: Box<Self>,
    },
}

/// Every procedure in the IR, user-written or a reified continuation, is one
/// of these. There is no lambda value node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub formals: Vec<String>,
    pub body: Cps,
}


impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        match self {
            Self::Number(n)=>write!(f, "{n}"),
            Self::Var(name)=>f.write_str(name),
        }
    }
}

impl fmt::Display for Cps {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        match self {
            Self::App {target, args}=>{
                write!(f, "({target}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            },
            Self::If {test, yes, no}=>write!(f, "(if {test} {yes} {no})"),
            Self::LetRec {bindings, body}=>{
                f.write_str("(letrec*")?;
                for binding in bindings {
                    write!(f, " {binding}")?;
                }
                write!(f, " {body})")
            },
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        write!(f, "({} (", self.name)?;
        for (i, formal) in self.formals.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(formal)?;
        }
        write!(f, ") {})", self.body)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_as_sexprs() {
        let program = Cps::LetRec {
            bindings: vec![Binding {
                name: "k".to_string(),
                formals: vec!["x".to_string(), "y".to_string()],
                body: Cps::App {
                    target: Atom::Var(HALT.to_string()),
                    args: vec![Atom::Var("x".to_string())],
                },
            }],
            body: Box::new(Cps::If {
                test: Atom::Var("t".to_string()),
                yes: Box::new(Cps::App {
                    target: Atom::Var("k".to_string()),
                    args: vec![Atom::Number(1), Atom::Number(2)],
                }),
                no: Box::new(Cps::App {
                    target: Atom::Var("k".to_string()),
                    args: vec![Atom::Number(3), Atom::Number(4)],
                }),
            }),
        };

        assert_eq!(
            program.to_string(),
            "(letrec* (k (x y) ($$HALT x)) (if t (k 1 2) (k 3 4)))",
        );
    }

    #[test]
    fn renders_empty_formals() {
        let binding = Binding {
            name: "thunk".to_string(),
            formals: Vec::new(),
            body: Cps::App {
                target: Atom::Var("k".to_string()),
                args: vec![Atom::Number(5)],
            },
        };

        assert_eq!(binding.to_string(), "(thunk () (k 5))");
    }
}
