#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    Number(i64),
    Ident(&'a str),

    Call {
        function: Box<Self>,
        arguments: Vec<Self>,
    },

    /// `statements` run only for their effects; `ret` produces the value.
    Lambda {
        formals: Vec<&'a str>,
        statements: Vec<Self>,
        ret: Box<Self>,
    },

    Conditional {
        test: Box<Self>,
        if_true: Box<Self>,
        if_false: Option<Box<Self>>,
    },

    /// All bindings enter scope together, so they may refer to each other.
    LetRec {
        bindings: Vec<Binding<'a>>,
        statements: Vec<Self>,
        ret: Box<Self>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding<'a> {
    pub name: &'a str,
    pub expr: Expr<'a>,
}
