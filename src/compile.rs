use thiserror::Error;
use crate::{
    ast::{
        Binding as AstBinding,
        Expr,
    },
    cps::{
        Atom,
        Binding,
        Cps,
        HALT,
    },
};


/// Structural problems caught before any evaluation happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("`letrec` binding `{0}` must be a lambda")]
    NonLambdaBinding(String),

    #[error("missing else branch in `if`")]
    MissingElse,
}


/// "The rest of the computation" during conversion. Meta-level only: these
/// closures are consumed while compiling and never end up in the IR.
type Cont<'a> = Box<dyn FnOnce(&mut Converter, Atom)->Result<Cps, CompileError> + 'a>;
type ContMany<'a> = Box<dyn FnOnce(&mut Converter, Vec<Atom>)->Result<Cps, CompileError> + 'a>;


pub fn compile(ast: &Expr)->Result<Cps, CompileError> {
    let mut converter = Converter::default();
    converter.convert(ast, Box::new(|_, x| Ok(Cps::App {
        target: Atom::Var(HALT.to_string()),
        args: vec![x],
    })))
}


#[derive(Default)]
struct Converter {
    last_var: u32,
}
impl Converter {
    fn gen_var(&mut self)->String {
        let n = self.last_var;
        self.last_var += 1;
        format!("$$var{n}")
    }

    fn gen_cont(&mut self)->String {
        let n = self.last_var;
        self.last_var += 1;
        format!("$$cont{n}")
    }

    fn convert<'a>(&mut self, expr: &'a Expr<'a>, cont: Cont<'a>)->Result<Cps, CompileError> {
        match expr {
            Expr::Number(n)=>cont(self, Atom::Number(*n)),
            Expr::Ident(name)=>cont(self, Atom::Var((*name).to_string())),

            Expr::Lambda {formals, statements, ret}=>{
                let f = self.gen_var();
                let k = self.gen_cont();
                let body = self.convert_body(statements, ret, k.clone())?;

                let mut cps_formals: Vec<String> = formals.iter().map(|s|s.to_string()).collect();
                cps_formals.push(k);
                let binding = Binding {name: f.clone(), formals: cps_formals, body};

                Ok(Cps::LetRec {
                    bindings: vec![binding],
                    body: Box::new(cont(self, Atom::Var(f))?),
                })
            },

            Expr::Call {function, arguments}=>{
                let r = self.gen_cont();
                let x = self.gen_cont();

                let ret_var = r.clone();
                let app = self.convert(function, Box::new(move |me, f| {
                    me.convert_many(arguments, Box::new(move |_, mut args| {
                        args.push(Atom::Var(ret_var));
                        Ok(Cps::App {target: f, args})
                    }))
                }))?;

                // whatever the call produces resumes the surrounding computation
                let binding = Binding {
                    name: r,
                    formals: vec![x.clone()],
                    body: cont(self, Atom::Var(x))?,
                };

                Ok(Cps::LetRec {bindings: vec![binding], body: Box::new(app)})
            },

            Expr::LetRec {bindings, statements, ret}=>{
                let converted = bindings.iter()
                    .map(|binding|self.convert_binding(binding))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Cps::LetRec {
                    bindings: converted,
                    body: Box::new(self.convert_seq(statements, ret, cont)?),
                })
            },

            Expr::Conditional {test, if_true, if_false}=>{
                let k = self.gen_cont();
                let x = self.gen_var();

                let join = k.clone();
                let yes = self.convert(if_true, Box::new(move |_, v| Ok(Cps::App {
                    target: Atom::Var(join),
                    args: vec![v],
                })))?;

                let if_false = if_false.as_deref().ok_or(CompileError::MissingElse)?;
                let join = k.clone();
                let no = self.convert(if_false, Box::new(move |_, v| Ok(Cps::App {
                    target: Atom::Var(join),
                    args: vec![v],
                })))?;

                // both branches resume through one join-point binding
                self.convert(test, Box::new(move |me, v| {
                    let binding = Binding {
                        name: k,
                        formals: vec![x.clone()],
                        body: cont(me, Atom::Var(x))?,
                    };
                    Ok(Cps::LetRec {
                        bindings: vec![binding],
                        body: Box::new(Cps::If {
                            test: v,
                            yes: Box::new(yes),
                            no: Box::new(no),
                        }),
                    })
                }))
            },
        }
    }

    fn convert_binding<'a>(&mut self, binding: &'a AstBinding<'a>)->Result<Binding, CompileError> {
        match &binding.expr {
            Expr::Lambda {formals, statements, ret}=>{
                let k = self.gen_cont();
                let body = self.convert_body(statements, ret, k.clone())?;

                let mut cps_formals: Vec<String> = formals.iter().map(|s|s.to_string()).collect();
                cps_formals.push(k);

                Ok(Binding {name: binding.name.to_string(), formals: cps_formals, body})
            },
            _=>Err(CompileError::NonLambdaBinding(binding.name.to_string())),
        }
    }

    /// Converts a procedure body so its return value flows into `k`.
    fn convert_body<'a>(&mut self, statements: &'a [Expr<'a>], ret: &'a Expr<'a>, k: String)->Result<Cps, CompileError> {
        self.convert_seq(statements, ret, Box::new(move |_, z| Ok(Cps::App {
            target: Atom::Var(k),
            args: vec![z],
        })))
    }

    /// Threads each statement before the return expression, dropping the
    /// statement values on the floor.
    fn convert_seq<'a>(&mut self, statements: &'a [Expr<'a>], ret: &'a Expr<'a>, cont: Cont<'a>)->Result<Cps, CompileError> {
        match statements.split_first() {
            None=>self.convert(ret, cont),
            Some((first, rest))=>self.convert(first, Box::new(move |me, _| {
                me.convert_seq(rest, ret, cont)
            })),
        }
    }

    fn convert_many<'a>(&mut self, exprs: &'a [Expr<'a>], cont: ContMany<'a>)->Result<Cps, CompileError> {
        match exprs.split_first() {
            None=>cont(self, Vec::new()),
            Some((head, tail))=>self.convert(head, Box::new(move |me, hd| {
                me.convert_many(tail, Box::new(move |me, mut tl| {
                    tl.insert(0, hd);
                    cont(me, tl)
                }))
            })),
        }
    }
}
