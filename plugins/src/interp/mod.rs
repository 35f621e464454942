///
/// Interpreter Module - Tree-walking Script Evaluator
///
/// Executes a parsed Program against a root scope that persists across
/// runs. The root scope is where the builtin bridge installs its
/// namespace and where the host reads exports from once a run finishes.
///
/// Scoping rules:
/// - Top-level code reads and writes the root scope
/// - Each function call gets a fresh local frame
/// - Lookup order: current frame, root scope, intrinsics
/// - Assignment inside a function updates a local if one exists, else an
///   existing root name, else creates a local
///
/// Submodules:
/// - value: Value enum, NativeCallable trait, Namespace
/// - exception: Exception and ExceptionKind
/// - intrinsics: str, len, join
///

pub mod exception;
pub mod intrinsics;
pub mod value;

pub use exception::{Exception, ExceptionKind};
pub use value::{NativeCallable, Namespace, Value};

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::*;
use crate::source::{Span, Spanned};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 48;

/// Bound on nested statement and expression evaluation, across calls.
///
/// Every level costs a few KB of native stack, so this keeps a script
/// inside a 2 MB thread stack whatever `max_call_depth` is set to.
pub const MAX_NESTING_DEPTH: usize = 256;

type Scope = IndexMap<Rc<str>, Value>;

enum Flow {
    Normal,
    Return(Value),
    Break(Span),
    Continue(Span),
}

type ExecResult = Result<Flow, Exception>;

#[derive(Debug)]
pub struct Interpreter {
    globals: Scope,
    intrinsics: IndexMap<&'static str, Value>,
    frames: Vec<Scope>,
    max_call_depth: usize,
    nesting: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_max_call_depth(DEFAULT_MAX_CALL_DEPTH)
    }

    pub fn with_max_call_depth(max_call_depth: usize) -> Self {
        Self {
            globals: Scope::new(),
            intrinsics: intrinsics::all().into_iter().collect(),
            frames: Vec::new(),
            max_call_depth,
            nesting: 0,
        }
    }

    /// Execute every statement of `program` at top level.
    ///
    /// A top-level `return` ends the program early.
    pub fn run(&mut self, program: &Program) -> Result<(), Exception> {
        self.frames.clear();
        self.nesting = 0;
        for stmt in &program.statements {
            match self.exec(stmt)? {
                Flow::Normal => {}
                Flow::Return(_) => break,
                Flow::Break(span) => return Err(outside_loop("break", span)),
                Flow::Continue(span) => return Err(outside_loop("continue", span)),
            }
        }
        Ok(())
    }

    /// Bind `name` in the root scope, returning the previous value.
    pub fn bind_root(&mut self, name: &str, value: Value) -> Option<Value> {
        self.globals.insert(Rc::from(name), value)
    }

    pub fn lookup_root(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn remove_root(&mut self, name: &str) -> Option<Value> {
        self.globals.shift_remove(name)
    }

    /// Root bindings in the order they were first created.
    pub fn root_bindings(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.globals.iter().map(|(k, v)| (&**k, v))
    }

    pub fn clear_root(&mut self) {
        self.globals.clear();
    }

    /// Call a root-scope function by name.
    pub fn call_root(&mut self, name: &str, args: Vec<Value>) -> Result<Value, Exception> {
        let callee = self
            .globals
            .get(name)
            .cloned()
            .ok_or_else(|| Exception::name_error(name))?;
        self.frames.clear();
        self.nesting = 0;
        self.call_value(&callee, args)
    }

    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, Exception> {
        match callee {
            Value::Function(decl) => self.call_function(decl, args),
            Value::Native(native) => native.call(&args),
            other => Err(Exception::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(&mut self, decl: &Rc<FunctionDecl>, args: Vec<Value>) -> Result<Value, Exception> {
        if args.len() != decl.params.len() {
            return Err(Exception::type_error(format!(
                "{}() takes {} argument{} but {} were given",
                decl.name.name,
                decl.params.len(),
                if decl.params.len() == 1 { "" } else { "s" },
                args.len()
            )));
        }
        if self.frames.len() >= self.max_call_depth {
            return Err(Exception::new(
                ExceptionKind::RecursionError,
                format!("maximum call depth of {} exceeded", self.max_call_depth),
            ));
        }

        let frame: Scope = decl
            .params
            .iter()
            .map(|p| p.name.clone())
            .zip(args)
            .collect();
        self.frames.push(frame);
        let result = self.exec_block(&decl.body);
        self.frames.pop();

        match result? {
            Flow::Normal => Ok(Value::None),
            Flow::Return(value) => Ok(value),
            Flow::Break(span) => Err(outside_loop("break", span)),
            Flow::Continue(span) => Err(outside_loop("continue", span)),
        }
    }

    fn lookup(&self, ident: &Ident) -> Result<Value, Exception> {
        let found = self
            .frames
            .last()
            .and_then(|frame| frame.get(&ident.name))
            .or_else(|| self.globals.get(&ident.name))
            .or_else(|| self.intrinsics.get(&*ident.name));
        match found {
            Some(value) => Ok(value.clone()),
            None => Err(Exception::name_error(&ident.name).at(ident.span)),
        }
    }

    fn declare(&mut self, name: &Rc<str>, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => frame.insert(name.clone(), value),
            None => self.globals.insert(name.clone(), value),
        };
    }

    fn assign(&mut self, name: &Rc<str>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return;
            }
            if let Some(slot) = self.globals.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.declare(name, value);
    }

    fn exec_block(&mut self, block: &Block) -> ExecResult {
        for stmt in &block.statements {
            match self.exec(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn enter(&mut self) -> Result<(), Exception> {
        if self.nesting >= MAX_NESTING_DEPTH {
            return Err(Exception::new(
                ExceptionKind::RecursionError,
                format!("maximum nesting depth of {} exceeded", MAX_NESTING_DEPTH),
            ));
        }
        self.nesting += 1;
        Ok(())
    }

    fn exec(&mut self, stmt: &Statement) -> ExecResult {
        self.enter()?;
        let result = self.exec_statement(stmt);
        self.nesting -= 1;
        result
    }

    fn exec_statement(&mut self, stmt: &Statement) -> ExecResult {
        match stmt {
            Statement::Var(s) => {
                let value = self.eval(&s.init)?;
                self.declare(&s.name.name, value);
            }
            Statement::Assign(s) => {
                let value = self.eval(&s.value)?;
                self.assign(&s.target.name, value);
            }
            Statement::Function(decl) => {
                self.declare(&decl.name.name, Value::Function(decl.clone()));
            }
            Statement::Return(s) => {
                let value = match &s.value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            Statement::Throw(s) => {
                let value = self.eval(&s.value)?;
                return Err(Exception::new(ExceptionKind::Error, value.to_string()).at(s.span));
            }
            Statement::If(s) => return self.exec_if(s),
            Statement::While(s) => {
                while self.eval(&s.condition)?.is_truthy() {
                    match self.exec_block(&s.body)? {
                        Flow::Break(_) => break,
                        Flow::Normal | Flow::Continue(_) => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            Statement::For(s) => return self.exec_for(s),
            Statement::Try(s) => match self.exec_block(&s.body) {
                Ok(flow) => return Ok(flow),
                Err(exc) => {
                    self.declare(&s.catch_var.name, Value::string(exc.message)?);
                    return self.exec_block(&s.handler);
                }
            },
            Statement::Break(span) => return Ok(Flow::Break(*span)),
            Statement::Continue(span) => return Ok(Flow::Continue(*span)),
            Statement::Expression(s) => {
                self.eval(&s.expr)?;
            }
            Statement::Block(block) => return self.exec_block(block),
        }
        Ok(Flow::Normal)
    }

    fn exec_if(&mut self, stmt: &IfStmt) -> ExecResult {
        let mut current = stmt;
        loop {
            if self.eval(&current.condition)?.is_truthy() {
                return self.exec_block(&current.then_branch);
            }
            match &current.else_branch {
                Some(ElseBranch::ElseIf(inner)) => current = &**inner,
                Some(ElseBranch::Else(block)) => return self.exec_block(block),
                None => return Ok(Flow::Normal),
            }
        }
    }

    fn exec_for(&mut self, stmt: &ForStmt) -> ExecResult {
        let items = match self.eval(&stmt.iterable)? {
            // Iterate a snapshot so the body may modify the list
            Value::List(items) => items.borrow().clone(),
            other => {
                return Err(Exception::type_error(format!(
                    "cannot iterate over {}",
                    other.type_name()
                ))
                .at(stmt.iterable.span()));
            }
        };

        for item in items {
            self.declare(&stmt.var.name, item);
            match self.exec_block(&stmt.body)? {
                Flow::Break(_) => break,
                Flow::Normal | Flow::Continue(_) => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn eval(&mut self, expr: &Expression) -> Result<Value, Exception> {
        self.enter()?;
        let result = self.eval_expression(expr);
        self.nesting -= 1;
        result
    }

    fn eval_expression(&mut self, expr: &Expression) -> Result<Value, Exception> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.value {
                Literal::Int(n) => Value::Int(*n),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::None => Value::None,
            }),
            Expression::Identifier(e) => self.lookup(&e.ident),
            Expression::List(e) => {
                let items = e
                    .elements
                    .iter()
                    .map(|el| self.eval(el))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(items))
            }
            Expression::Unary(e) => {
                let operand = self.eval(&e.operand)?;
                eval_unary(e.op, operand).map_err(|exc| exc.at(e.span))
            }
            Expression::Binary(e) => self.eval_binary(e),
            Expression::Call(e) => {
                let callee = self.eval(&e.callee)?;
                let args = e
                    .args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call_value(&callee, args).map_err(|exc| exc.at(e.span))
            }
            Expression::Member(e) => {
                let object = self.eval(&e.object)?;
                eval_member(&object, &e.member).map_err(|exc| exc.at(e.span))
            }
            Expression::Index(e) => {
                let object = self.eval(&e.object)?;
                let index = self.eval(&e.index)?;
                eval_index(&object, &index).map_err(|exc| exc.at(e.span))
            }
            Expression::Grouped(e) => self.eval(&e.inner),
        }
    }

    fn eval_binary(&mut self, e: &BinaryExpr) -> Result<Value, Exception> {
        let left = self.eval(&e.left)?;
        if e.op.is_logical() {
            let decided = match e.op {
                BinaryOp::And => !left.is_truthy(),
                _ => left.is_truthy(),
            };
            return if decided { Ok(left) } else { self.eval(&e.right) };
        }
        let right = self.eval(&e.right)?;
        eval_binary_op(e.op, &left, &right).map_err(|exc| exc.at(e.span))
    }
}

fn outside_loop(keyword: &str, span: Span) -> Exception {
    Exception::new(ExceptionKind::Error, format!("'{}' outside of a loop", keyword)).at(span)
}

fn eval_unary(op: UnaryOp, operand: Value) -> Result<Value, Exception> {
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| Exception::arithmetic("integer overflow")),
        (UnaryOp::Neg, v) => Err(Exception::type_error(format!(
            "bad operand type for unary -: '{}'",
            v.type_name()
        ))),
    }
}

fn eval_binary_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, Exception> {
    use std::cmp::Ordering;

    let unsupported = || {
        Exception::type_error(format!(
            "unsupported operand types for {}: '{}' and '{}'",
            op,
            left.type_name(),
            right.type_name()
        ))
    };
    let overflow = || Exception::arithmetic("integer overflow");

    match op {
        BinaryOp::Eq => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => return Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = match (left, right) {
                (Value::Int(a), Value::Int(b)) => a.cmp(b),
                (Value::Str(a), Value::Str(b)) => a.cmp(b),
                _ => return Err(unsupported()),
            };
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::LtEq => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            let mut bytes = Vec::with_capacity(a.to_bytes().len() + b.to_bytes().len());
            bytes.extend_from_slice(a.to_bytes());
            bytes.extend_from_slice(b.to_bytes());
            Value::string(bytes)
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (_, Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div | BinaryOp::Mod if b == 0 => {
                    return Err(Exception::arithmetic("division by zero"));
                }
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Mod => a.checked_rem(b),
                _ => return Err(unsupported()),
            };
            result.map(Value::Int).ok_or_else(overflow)
        }
        _ => Err(unsupported()),
    }
}

fn eval_member(object: &Value, member: &Ident) -> Result<Value, Exception> {
    match object {
        Value::Namespace(ns) => ns.get(&member.name).cloned().ok_or_else(|| {
            Exception::new(
                ExceptionKind::AttributeError,
                format!("namespace '{}' has no member '{}'", ns.name(), member.name),
            )
        }),
        other => Err(Exception::new(
            ExceptionKind::AttributeError,
            format!("'{}' object has no member '{}'", other.type_name(), member.name),
        )),
    }
}

fn eval_index(object: &Value, index: &Value) -> Result<Value, Exception> {
    let (Value::List(items), Value::Int(i)) = (object, index) else {
        return Err(Exception::type_error(format!(
            "cannot index {} with {}",
            object.type_name(),
            index.type_name()
        )));
    };
    let items = items.borrow();
    let len = items.len() as i64;
    let pos = if *i < 0 { len + *i } else { *i };
    if pos < 0 || pos >= len {
        return Err(Exception::new(ExceptionKind::IndexError, "list index out of range"));
    }
    Ok(items[pos as usize].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn run(source: &str) -> Result<Interpreter, Exception> {
        let program = parse_source(source).into_result().unwrap();
        let mut interp = Interpreter::new();
        interp.run(&program)?;
        Ok(interp)
    }

    fn global(interp: &Interpreter, name: &str) -> String {
        interp.lookup_root(name).map(|v| v.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_top_level_assignment_creates_global() {
        let interp = run(r#"result = "42";"#).unwrap();
        assert_eq!(interp.lookup_root("result").and_then(Value::as_str), Some("42"));
    }

    #[test]
    fn test_functions_and_recursion() {
        let interp = run(
            r#"
            fn fact(n) {
                if (n <= 1) { return 1; }
                return n * fact(n - 1);
            }
            answer = fact(10);
            "#,
        )
        .unwrap();
        assert_eq!(global(&interp, "answer"), "3628800");
    }

    #[test]
    fn test_function_locals_do_not_leak() {
        let interp = run(
            r#"
            counter = 0;
            fn bump() { counter = counter + 1; var scratch = 5; }
            bump();
            bump();
            "#,
        )
        .unwrap();
        assert_eq!(global(&interp, "counter"), "2");
        assert!(interp.lookup_root("scratch").is_none());
    }

    #[test]
    fn test_division_by_zero_raises() {
        let Err(exc) = run("foo = 1 / 0;") else {
            panic!("expected an exception");
        };
        assert_eq!(exc.kind, ExceptionKind::ArithmeticError);
        assert_eq!(exc.message, "division by zero");
        assert_eq!(exc.span, Some(Span::new(6, 11)));
    }

    #[test]
    fn test_try_catch_binds_message() {
        let interp = run(
            r#"
            try { throw "bad " + "thing"; } catch (e) { caught = e; }
            try { missing(); } catch (e) { name_err = e; }
            "#,
        )
        .unwrap();
        assert_eq!(global(&interp, "caught"), "bad thing");
        assert_eq!(global(&interp, "name_err"), "name 'missing' is not defined");
    }

    #[test]
    fn test_loops() {
        let interp = run(
            r#"
            out = [];
            for (d in ["a", "b", "c", "d"]) {
                if (d == "b") { continue; }
                if (d == "d") { break; }
                out = out + [d];
            }
            i = 0;
            while (i < 5) { i = i + 1; }
            "#,
        )
        .unwrap();
        assert_eq!(global(&interp, "out"), r#"["a", "c"]"#);
        assert_eq!(global(&interp, "i"), "5");
    }

    #[test]
    fn test_short_circuit_returns_operand() {
        let interp = run(r#"a = none || "fallback"; b = 0 && missing();"#).unwrap();
        assert_eq!(global(&interp, "a"), "fallback");
        assert_eq!(global(&interp, "b"), "0");
    }

    #[test]
    fn test_recursion_limit() {
        let program = parse_source("fn f() { return f(); } f();").into_result().unwrap();
        let mut interp = Interpreter::with_max_call_depth(16);
        let exc = interp.run(&program).unwrap_err();
        assert_eq!(exc.kind, ExceptionKind::RecursionError);
        assert_eq!(exc.message, "maximum call depth of 16 exceeded");
    }

    #[test]
    fn test_default_call_depth_raises_before_stack_runs_out() {
        let exc = run(
            r#"
            fn f(n) { if (true) { if (true) { return f(n) + 1; } } }
            x = f("a");
            "#,
        )
        .unwrap_err();
        assert_eq!(exc.kind, ExceptionKind::RecursionError);
        assert_eq!(exc.message, "maximum call depth of 48 exceeded");
    }

    #[test]
    fn test_nesting_limit_holds_for_raised_call_depth() {
        let program = parse_source("fn f() { if (true) { if (true) { return f(); } } } f();")
            .into_result()
            .unwrap();
        let mut interp = Interpreter::with_max_call_depth(10_000);
        let exc = interp.run(&program).unwrap_err();
        assert_eq!(exc.kind, ExceptionKind::RecursionError);
        assert_eq!(exc.message, "maximum nesting depth of 256 exceeded");

        // the interpreter is usable again afterwards
        interp.run(&parse_source("ok = 1;").into_result().unwrap()).unwrap();
        assert_eq!(global(&interp, "ok"), "1");
    }

    #[test]
    fn test_long_operator_chain_hits_nesting_limit() {
        let source = format!("x = 1{};", " + 1".repeat(400));
        let exc = run(&source).unwrap_err();
        assert_eq!(exc.kind, ExceptionKind::RecursionError);
    }

    #[test]
    fn test_long_else_if_chain() {
        let mut source = String::from("n = 299;\nif (n == 0) { hit = 0; }");
        for i in 1..300 {
            source.push_str(&format!(" else if (n == {}) {{ hit = {}; }}", i, i));
        }
        source.push_str(" else { hit = -1; }");
        let interp = run(&source).unwrap();
        assert_eq!(global(&interp, "hit"), "299");
    }

    #[test]
    fn test_call_root_from_host() {
        let mut interp = run(r#"fn greet(who) { return "hello " + who; }"#).unwrap();
        let result = interp
            .call_root("greet", vec![Value::string("world").unwrap()])
            .unwrap();
        assert_eq!(result.as_str(), Some("hello world"));

        let exc = interp.call_root("greet", vec![]).unwrap_err();
        assert_eq!(exc.message, "greet() takes 1 argument but 0 were given");
    }

    #[test]
    fn test_break_outside_loop() {
        let exc = run("break;").unwrap_err();
        assert_eq!(exc.message, "'break' outside of a loop");
    }

    #[test]
    fn test_type_errors() {
        let exc = run(r#"x = "a" - 1;"#).unwrap_err();
        insta::assert_snapshot!(exc.to_string(), @"TypeError: unsupported operand types for -: 'string' and 'int'");
        let exc = run("x = 5; x();").unwrap_err();
        assert_eq!(exc.message, "'int' object is not callable");
    }
}
