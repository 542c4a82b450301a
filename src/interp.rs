use thiserror::Error;
use std::{
    fmt,
    rc::Rc,
};
use crate::{
    cps::{
        Atom,
        Cps,
        HALT,
    },
    scope::Scope,
};


pub type Env<'a> = Scope<'a, Value<'a>>;

/// Builtins receive their evaluated argument list, with the continuation to
/// resume as the final element, and hand the trampoline its next move.
pub type NativeFn = for<'a> fn(Vec<Value<'a>>)->Result<Step<'a>, EvalError>;


#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("no variable named `{name}`")]
    Unbound {
        name: String,
        visible: Vec<String>,
    },

    #[error("wrong arity when calling `{name}`: expected {expected} arguments, but got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("expected a {expected}, but got `{got}`")]
    Type {
        expected: &'static str,
        got: String,
    },
}


#[derive(Clone)]
pub enum Value<'a> {
    Number(i64),
    Bool(bool),
    Proc(Rc<Proc<'a>>),
    Native(&'static str, NativeFn),
    None,
}

/// A user-level procedure: formals and body borrowed from the compiled
/// program, plus the frame it closed over.
pub struct Proc<'a> {
    name: &'a str,
    formals: &'a [String],
    body: &'a Cps,
    scope: Rc<Env<'a>>,
}

/// What the trampoline does next.
pub enum Step<'a> {
    Done(Value<'a>),
    Call {
        target: Value<'a>,
        args: Vec<Value<'a>>,
    },
}


/// Runs a compiled program to its final value. The loop below is the only
/// native frame alive across logical calls, however deep the recursion.
pub fn interpret(expr: &Cps)->Result<Value<'_>, EvalError> {
    let mut step = step_until_call(expr, global())?;
    loop {
        match step {
            Step::Done(value)=>return Ok(value),
            Step::Call {target, args}=>step = apply(target, args)?,
        }
    }
}

/// Walks IR nodes up to the next procedure call without performing it.
fn step_until_call<'a>(expr: &'a Cps, scope: Rc<Env<'a>>)->Result<Step<'a>, EvalError> {
    match expr {
        Cps::App {target, args}=>{
            let target = eval_atom(target, &scope)?;
            let args = args.iter()
                .map(|arg|eval_atom(arg, &scope))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Step::Call {target, args})
        },
        Cps::If {test, yes, no}=>{
            // only boolean false selects the else branch
            if eval_atom(test, &scope)? == Value::Bool(false) {
                step_until_call(no, scope)
            } else {
                step_until_call(yes, scope)
            }
        },
        Cps::LetRec {bindings, body}=>{
            let child = scope.child();
            for binding in bindings {
                child.declare(binding.name.as_str(), Value::Proc(Rc::new(Proc {
                    name: binding.name.as_str(),
                    formals: &binding.formals,
                    body: &binding.body,
                    scope: child.clone(),
                })));
            }

            step_until_call(body, child)
        },
    }
}

fn apply<'a>(target: Value<'a>, args: Vec<Value<'a>>)->Result<Step<'a>, EvalError> {
    match target {
        Value::Proc(proc)=>{
            if proc.formals.len() != args.len() {
                return Err(EvalError::Arity {
                    name: proc.name.to_string(),
                    expected: proc.formals.len(),
                    got: args.len(),
                });
            }

            let frame = proc.scope.child();
            for (formal, arg) in proc.formals.iter().zip(args) {
                frame.declare(formal.as_str(), arg);
            }

            step_until_call(proc.body, frame)
        },
        Value::Native(_, f)=>f(args),
        other=>Err(EvalError::Type {expected: "procedure", got: other.to_string()}),
    }
}

fn eval_atom<'a>(atom: &'a Atom, scope: &Rc<Env<'a>>)->Result<Value<'a>, EvalError> {
    match atom {
        Atom::Number(n)=>Ok(Value::Number(*n)),
        Atom::Var(name)=>scope.lookup(name).ok_or_else(||EvalError::Unbound {
            name: name.clone(),
            visible: scope.visible(),
        }),
    }
}


fn global<'a>()->Rc<Env<'a>> {
    let scope = Scope::root();
    scope.declare("zero?", Value::Native("zero?", zero_p));
    scope.declare("*", Value::Native("*", multiply));
    scope.declare("+", Value::Native("+", add));
    scope.declare("add", Value::Native("add", add));
    scope.declare("subtract", Value::Native("subtract", subtract));
    scope.declare(HALT, Value::Native(HALT, halt));

    scope
}

fn zero_p<'a>(args: Vec<Value<'a>>)->Result<Step<'a>, EvalError> {
    let [value, cont] = take_args(args, "zero?")?;

    continue_with(cont, Value::Bool(value == Value::Number(0)))
}

fn multiply<'a>(args: Vec<Value<'a>>)->Result<Step<'a>, EvalError> {
    let [lhs, rhs, cont] = take_args(args, "*")?;

    continue_with(cont, Value::Number(as_number(lhs)?.wrapping_mul(as_number(rhs)?)))
}

fn add<'a>(args: Vec<Value<'a>>)->Result<Step<'a>, EvalError> {
    let [lhs, rhs, cont] = take_args(args, "add")?;

    continue_with(cont, Value::Number(as_number(lhs)?.wrapping_add(as_number(rhs)?)))
}

fn subtract<'a>(args: Vec<Value<'a>>)->Result<Step<'a>, EvalError> {
    let [lhs, rhs, cont] = take_args(args, "subtract")?;

    continue_with(cont, Value::Number(as_number(lhs)?.wrapping_sub(as_number(rhs)?)))
}

/// The only builtin that stops the trampoline instead of chaining it.
fn halt<'a>(args: Vec<Value<'a>>)->Result<Step<'a>, EvalError> {
    let [value] = take_args(args, HALT)?;

    Ok(Step::Done(value))
}

fn continue_with<'a>(cont: Value<'a>, value: Value<'a>)->Result<Step<'a>, EvalError> {
    Ok(Step::Call {target: cont, args: vec![value]})
}

fn take_args<'a, const N: usize>(args: Vec<Value<'a>>, name: &str)->Result<[Value<'a>; N], EvalError> {
    let got = args.len();
    args.try_into().map_err(|_|EvalError::Arity {
        name: name.to_string(),
        expected: N,
        got,
    })
}

fn as_number(value: Value<'_>)->Result<i64, EvalError> {
    match value {
        Value::Number(n)=>Ok(n),
        other=>Err(EvalError::Type {expected: "number", got: other.to_string()}),
    }
}


impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self)->bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b))=>a == b,
            (Self::Bool(a), Self::Bool(b))=>a == b,
            (Self::None, Self::None)=>true,
            (Self::Proc(a), Self::Proc(b))=>Rc::ptr_eq(a, b),
            (Self::Native(a, _), Self::Native(b, _))=>a == b,
            _=>false,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        match self {
            Self::Number(n)=>write!(f, "{n}"),
            Self::Bool(true)=>f.write_str("#t"),
            Self::Bool(false)=>f.write_str("#f"),
            Self::Proc(proc)=>write!(f, "<proc {}>", proc.name),
            Self::Native(name, _)=>write!(f, "<native {name}>"),
            Self::None=>f.write_str("#n"),
        }
    }
}

// closures make frames cyclic, so a derived Debug could never terminate
impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        write!(f, "{self}")
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cps::Binding;

    fn var(name: &str)->Atom {
        Atom::Var(name.to_string())
    }

    fn app(target: Atom, args: Vec<Atom>)->Cps {
        Cps::App {target, args}
    }

    #[test]
    fn halt_yields_its_argument() {
        let program = app(var(HALT), vec![Atom::Number(7)]);

        assert_eq!(interpret(&program).unwrap(), Value::Number(7));
    }

    #[test]
    fn builtins_forward_through_their_continuation() {
        let program = app(var("zero?"), vec![Atom::Number(0), var(HALT)]);

        assert_eq!(interpret(&program).unwrap(), Value::Bool(true));
    }

    #[test]
    fn false_selects_the_else_branch() {
        let branch = |name: &str| Binding {
            name: name.to_string(),
            formals: vec!["t".to_string()],
            body: Cps::If {
                test: var("t"),
                yes: Box::new(app(var(HALT), vec![Atom::Number(1)])),
                no: Box::new(app(var(HALT), vec![Atom::Number(2)])),
            },
        };

        let taken = Cps::LetRec {
            bindings: vec![branch("k")],
            body: Box::new(app(var("zero?"), vec![Atom::Number(0), var("k")])),
        };
        assert_eq!(interpret(&taken).unwrap(), Value::Number(1));

        let skipped = Cps::LetRec {
            bindings: vec![branch("k")],
            body: Box::new(app(var("zero?"), vec![Atom::Number(5), var("k")])),
        };
        assert_eq!(interpret(&skipped).unwrap(), Value::Number(2));
    }

    #[test]
    fn letrec_binds_every_name_before_any_body_runs() {
        // `first` forward-references `second`
        let program = Cps::LetRec {
            bindings: vec![
                Binding {
                    name: "first".to_string(),
                    formals: vec!["k".to_string()],
                    body: app(var("second"), vec![var("k")]),
                },
                Binding {
                    name: "second".to_string(),
                    formals: vec!["k".to_string()],
                    body: app(var("k"), vec![Atom::Number(9)]),
                },
            ],
            body: Box::new(app(var("first"), vec![var(HALT)])),
        };

        assert_eq!(interpret(&program).unwrap(), Value::Number(9));
    }

    #[test]
    fn arity_mismatch_is_fatal() {
        let program = Cps::LetRec {
            bindings: vec![Binding {
                name: "pair".to_string(),
                formals: vec!["a".to_string(), "b".to_string()],
                body: app(var(HALT), vec![var("a")]),
            }],
            body: Box::new(app(var("pair"), vec![
                Atom::Number(1),
                Atom::Number(2),
                Atom::Number(3),
            ])),
        };

        assert_eq!(interpret(&program), Err(EvalError::Arity {
            name: "pair".to_string(),
            expected: 2,
            got: 3,
        }));
    }

    #[test]
    fn builtin_arity_mismatch_is_fatal() {
        let program = app(var(HALT), vec![Atom::Number(1), Atom::Number(2)]);

        assert!(matches!(interpret(&program), Err(EvalError::Arity {expected: 1, got: 2, ..})));
    }

    #[test]
    fn unbound_names_carry_diagnostics() {
        let program = app(var("ghost"), vec![]);

        match interpret(&program) {
            Err(EvalError::Unbound {name, visible})=>{
                assert_eq!(name, "ghost");
                assert!(visible.contains(&"zero?".to_string()));
            },
            other=>panic!("expected an unbound error, got {other:?}"),
        }
    }

    #[test]
    fn calling_a_number_is_a_type_error() {
        let program = app(Atom::Number(3), vec![]);

        assert_eq!(interpret(&program), Err(EvalError::Type {
            expected: "procedure",
            got: "3".to_string(),
        }));
    }

    #[test]
    fn arithmetic_rejects_non_numbers() {
        let program = app(var("+"), vec![Atom::Number(1), var(HALT), var(HALT)]);

        assert!(matches!(interpret(&program), Err(EvalError::Type {expected: "number", ..})));
    }

    #[test]
    fn zero_p_compares_instead_of_casting() {
        // a non-number is simply not zero, as in the direct evaluator
        let program = Cps::LetRec {
            bindings: vec![Binding {
                name: "probe".to_string(),
                formals: vec!["v".to_string()],
                body: app(var("zero?"), vec![var("probe"), var(HALT)]),
            }],
            body: Box::new(app(var("probe"), vec![Atom::Number(0)])),
        };

        assert_eq!(interpret(&program).unwrap(), Value::Bool(false));
    }
}
