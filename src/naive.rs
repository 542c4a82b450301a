use std::{
    fmt,
    rc::Rc,
};
use crate::{
    ast::Expr,
    interp::EvalError,
    scope::Scope,
};


pub type Env<'a> = Scope<'a, Value<'a>>;

pub type NativeFn = for<'a> fn(Vec<Value<'a>>)->Result<Value<'a>, EvalError>;


/// Plain tree-walking evaluation, recursing through the native stack. Shares
/// its semantics with the trampolined path and serves as its cross-check.
pub fn interpret<'a>(expr: &'a Expr<'a>)->Result<Value<'a>, EvalError> {
    eval(expr, &global())
}


#[derive(Clone)]
pub enum Value<'a> {
    Number(i64),
    Bool(bool),
    Func(Rc<Func<'a>>),
    Native(&'static str, NativeFn),
    None,
}

pub struct Func<'a> {
    formals: &'a [&'a str],
    statements: &'a [Expr<'a>],
    ret: &'a Expr<'a>,
    scope: Rc<Env<'a>>,
}


fn eval<'a>(expr: &'a Expr<'a>, scope: &Rc<Env<'a>>)->Result<Value<'a>, EvalError> {
    match expr {
        Expr::Number(n)=>Ok(Value::Number(*n)),
        Expr::Ident(name)=>scope.lookup(name).ok_or_else(||EvalError::Unbound {
            name: (*name).to_string(),
            visible: scope.visible(),
        }),

        Expr::Lambda {formals, statements, ret}=>Ok(Value::Func(Rc::new(Func {
            formals,
            statements,
            ret,
            scope: scope.clone(),
        }))),

        Expr::Conditional {test, if_true, if_false}=>{
            if eval(test, scope)? == Value::Bool(false) {
                match if_false {
                    Some(if_false)=>eval(if_false, scope),
                    // unlike the compiled path, no else just means no value
                    None=>Ok(Value::None),
                }
            } else {
                eval(if_true, scope)
            }
        },

        Expr::LetRec {bindings, statements, ret}=>{
            let child = scope.child();
            for binding in bindings {
                let value = eval(&binding.expr, &child)?;
                child.declare(binding.name, value);
            }
            for statement in statements {
                eval(statement, &child)?;
            }

            eval(ret, &child)
        },

        Expr::Call {function, arguments}=>{
            let target = eval(function, scope)?;
            let args = arguments.iter()
                .map(|arg|eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;

            match target {
                Value::Func(func)=>{
                    if func.formals.len() != args.len() {
                        return Err(EvalError::Arity {
                            name: "lambda".to_string(),
                            expected: func.formals.len(),
                            got: args.len(),
                        });
                    }

                    let frame = func.scope.child();
                    for (formal, arg) in func.formals.iter().copied().zip(args) {
                        frame.declare(formal, arg);
                    }
                    for statement in func.statements {
                        eval(statement, &frame)?;
                    }

                    eval(func.ret, &frame)
                },
                Value::Native(_, f)=>f(args),
                other=>Err(EvalError::Type {expected: "procedure", got: other.to_string()}),
            }
        },
    }
}


fn global<'a>()->Rc<Env<'a>> {
    let scope = Scope::root();
    scope.declare("zero?", Value::Native("zero?", zero_p));
    scope.declare("*", Value::Native("*", multiply));
    scope.declare("+", Value::Native("+", add));
    scope.declare("add", Value::Native("add", add));
    scope.declare("subtract", Value::Native("subtract", subtract));

    scope
}

fn zero_p<'a>(args: Vec<Value<'a>>)->Result<Value<'a>, EvalError> {
    let [value] = take_args(args, "zero?")?;

    Ok(Value::Bool(value == Value::Number(0)))
}

fn multiply<'a>(args: Vec<Value<'a>>)->Result<Value<'a>, EvalError> {
    let [lhs, rhs] = take_args(args, "*")?;

    Ok(Value::Number(as_number(lhs)?.wrapping_mul(as_number(rhs)?)))
}

fn add<'a>(args: Vec<Value<'a>>)->Result<Value<'a>, EvalError> {
    let [lhs, rhs] = take_args(args, "add")?;

    Ok(Value::Number(as_number(lhs)?.wrapping_add(as_number(rhs)?)))
}

fn subtract<'a>(args: Vec<Value<'a>>)->Result<Value<'a>, EvalError> {
    let [lhs, rhs] = take_args(args, "subtract")?;

    Ok(Value::Number(as_number(lhs)?.wrapping_sub(as_number(rhs)?)))
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
            (Self::Func(a), Self::Func(b))=>Rc::ptr_eq(a, b),
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
            Self::Func(_)=>f.write_str("<lambda>"),
            Self::Native(name, _)=>write!(f, "<native {name}>"),
            Self::None=>f.write_str("#n"),
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        write!(f, "{self}")
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn check(source: &str, expected: &str) {
        let ast = Parser::new_from_source(source).parse().unwrap();
        assert_eq!(interpret(&ast).unwrap().to_string(), expected, "program: {source}");
    }

    #[test]
    fn evaluates_arithmetic() {
        check("(+ 2 3)", "5");
        check("(subtract 10 4)", "6");
    }

    #[test]
    fn missing_else_yields_no_value() {
        check("(if (zero? 1) 5)", "#n");
    }

    #[test]
    fn closures_capture_their_scope() {
        check("((lambda (n) ((lambda (m) (+ n m)) 2)) 3)", "5");
    }

    #[test]
    fn letrec_supports_mutual_recursion() {
        check(
            "(letrec \
             ((even? (lambda (n) (if (zero? n) (zero? 0) (odd? (subtract n 1))))) \
             (odd? (lambda (n) (if (zero? n) (zero? 1) (even? (subtract n 1)))))) \
             (even? 10))",
            "#t",
        );
    }

    #[test]
    fn letrec_accepts_plain_values() {
        // only the compiled path restricts bindings to lambdas
        check("(letrec ((x 5)) x)", "5");
    }

    #[test]
    fn statements_run_before_the_return() {
        let ast = Parser::new_from_source("((lambda (x) (missing) x) 1)").parse().unwrap();
        assert!(matches!(interpret(&ast), Err(EvalError::Unbound {..})));
    }
}
