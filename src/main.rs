use anyhow::{
    Result,
    bail,
};
use std::{
    env::args,
    fs::read_to_string,
};
use bounce::{
    compile::compile,
    interp,
    parser::Parser,
};


fn main()->Result<()> {
    let Some(path) = args().nth(1) else {
        bail!("Usage: bounce <program>");
    };
    let source = read_to_string(&path)?;

    let mut parser = Parser::new_from_source(&source);
    let ast = parser.parse()?;
    let program = compile(&ast)?;

    println!("{}", interp::interpret(&program)?);

    return Ok(());
}
