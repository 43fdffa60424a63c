//! Name resolution and checking
//!
//! Turns parsed compilation units into linked [`ModuleCode`]. Every problem
//! is recorded as a [`Diagnostic`] at the position of the member being
//! linked; linking carries on after an error so that one compile reports
//! everything it can find.

use std::collections::HashMap;
use std::sync::Arc;

use super::ir::{
    Body, ClassInfo, DeclaredType, FieldCode, FieldId, FuncType, Instr, LambdaCode, MethodCode,
    MethodId, ModuleCode, Node, Segment,
};
use crate::binder::ValueKind;
use crate::error::Diagnostic;
use crate::parser::{
    AssignTarget, ClassDecl, CompilationUnit, Expression, InterpolatedSegment, LambdaBody,
    MemberDecl, Statement, TypeRef,
};
use crate::runtime::Value;

/// Links `units` against reference `exports`
pub fn link(
    units: &[CompilationUnit],
    exports: &HashMap<String, Value>,
) -> Result<ModuleCode, Vec<Diagnostic>> {
    let mut linker = Linker::new(exports);
    let pending = linker.declare(units);
    linker.link_members(pending);

    if linker.diagnostics.is_empty() {
        Ok(linker.code)
    } else {
        Err(linker.diagnostics)
    }
}

/// True when every path through `statements` ends in `return`
pub fn always_returns(statements: &[Statement]) -> bool {
    statements.iter().any(|statement| match statement {
        Statement::Return(_) => true,
        Statement::Block(inner) => always_returns(inner),
        Statement::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => {
            always_returns(std::slice::from_ref(then_branch))
                && always_returns(std::slice::from_ref(else_branch))
        }
        _ => false,
    })
}

enum Pending<'u> {
    Field {
        id: FieldId,
        class: usize,
        decl: &'u MemberDecl,
    },
    Method {
        id: MethodId,
        class: usize,
        decl: &'u MemberDecl,
    },
}

struct Local {
    name: String,
    slot: usize,
    kind: Option<ValueKind>,
}

#[derive(Default)]
struct FunctionScope {
    blocks: Vec<Vec<Local>>,
    next_slot: usize,
}

impl FunctionScope {
    fn with_params(params: &[String], kinds: &[Option<ValueKind>]) -> Self {
        let locals = params
            .iter()
            .enumerate()
            .map(|(slot, name)| Local {
                name: name.clone(),
                slot,
                kind: kinds.get(slot).copied().flatten(),
            })
            .collect();
        FunctionScope {
            blocks: vec![locals],
            next_slot: params.len(),
        }
    }

    fn find(&self, name: &str) -> Option<&Local> {
        self.blocks
            .iter()
            .rev()
            .flat_map(|block| block.iter().rev())
            .find(|local| local.name == name)
    }
}

/// What a name or dotted path refers to
enum Target {
    Local { depth: usize, slot: usize },
    Field(FieldId),
    Methods { class: usize, name: String },
    Export(Value),
}

struct Linker<'e> {
    exports: &'e HashMap<String, Value>,
    code: ModuleCode,
    diagnostics: Vec<Diagnostic>,
    class: usize,
    member: String,
    position: (usize, usize),
    functions: Vec<FunctionScope>,
}

impl<'e> Linker<'e> {
    fn new(exports: &'e HashMap<String, Value>) -> Self {
        Linker {
            exports,
            code: ModuleCode::default(),
            diagnostics: Vec::new(),
            class: 0,
            member: String::new(),
            position: (1, 1),
            functions: Vec::new(),
        }
    }

    fn error(&mut self, message: impl Into<String>) -> Node {
        let (line, column) = self.position;
        self.diagnostics.push(Diagnostic::new(line, column, message));
        Node::Const(Value::Null)
    }

    // ----- declaration pass -----

    fn declare<'u>(&mut self, units: &'u [CompilationUnit]) -> Vec<Pending<'u>> {
        let mut pending = Vec::new();

        for namespace in units.iter().flat_map(|u| u.namespaces.iter()) {
            for class in &namespace.classes {
                self.position = (class.line, class.column);
                let qualified = format!("{}.{}", namespace.name, class.name);
                if self.code.class_index(&qualified).is_some() {
                    self.error(format!(
                        "The namespace '{}' already contains a definition for '{}'",
                        namespace.name, class.name
                    ));
                    continue;
                }

                let index = self.code.classes.len();
                self.code.classes.push(ClassInfo {
                    namespace: namespace.name.clone(),
                    name: class.name.clone(),
                    fields: HashMap::new(),
                    methods: HashMap::new(),
                });
                self.declare_members(index, class, &mut pending);
            }
        }

        pending
    }

    fn declare_members<'u>(
        &mut self,
        class: usize,
        decl: &'u ClassDecl,
        pending: &mut Vec<Pending<'u>>,
    ) {
        for member in &decl.members {
            self.position = member.position();
            let name = member.name();
            let info = &self.code.classes[class];

            match member {
                MemberDecl::Field { ty, .. } => {
                    if info.fields.contains_key(name) || info.methods.contains_key(name) {
                        self.error(format!(
                            "The type '{}' already contains a definition for '{}'",
                            decl.name, name
                        ));
                        continue;
                    }
                    let ty = ty.as_ref().and_then(|ty| self.declared_type(ty));
                    let id = self.code.fields.len();
                    self.code.fields.push(FieldCode {
                        class,
                        name: name.to_string(),
                        ty,
                        init: Node::Const(Value::Null),
                    });
                    self.code.classes[class]
                        .fields
                        .insert(name.to_string(), id);
                    pending.push(Pending::Field {
                        id,
                        class,
                        decl: member,
                    });
                }

                MemberDecl::Method { params, .. } => {
                    if info.fields.contains_key(name) {
                        self.error(format!(
                            "The type '{}' already contains a definition for '{}'",
                            decl.name, name
                        ));
                        continue;
                    }
                    if self.code.overload(class, name, params.len()).is_some() {
                        self.error(format!(
                            "Type '{}' already defines a member called '{}' with the same parameter count",
                            decl.name, name
                        ));
                        continue;
                    }
                    let id = self.code.methods.len();
                    self.code.methods.push(MethodCode {
                        class,
                        name: name.to_string(),
                        code: Arc::new(LambdaCode {
                            name: name.to_string(),
                            params: params.len(),
                            param_kinds: Vec::new(),
                            frame_size: params.len(),
                            body: Body::Expression(Node::Const(Value::Null)),
                        }),
                    });
                    self.code.classes[class]
                        .methods
                        .entry(name.to_string())
                        .or_default()
                        .push(id);
                    pending.push(Pending::Method {
                        id,
                        class,
                        decl: member,
                    });
                }
            }
        }
    }

    fn declared_type(&mut self, ty: &TypeRef) -> Option<DeclaredType> {
        if ty.name == "Func" && !ty.args.is_empty() {
            let mut kinds = Vec::with_capacity(ty.args.len());
            for arg in &ty.args {
                kinds.push(self.value_kind(arg)?);
            }
            let returns = kinds.pop()?;
            return Some(DeclaredType::Func(Arc::new(FuncType {
                params: kinds,
                returns,
            })));
        }
        self.value_kind(ty).map(DeclaredType::Value)
    }

    fn value_kind(&mut self, ty: &TypeRef) -> Option<ValueKind> {
        let kind = if ty.args.is_empty() {
            ValueKind::from_type_name(&ty.name)
        } else {
            None
        };
        if kind.is_none() {
            self.error(format!(
                "The type or namespace name '{}' could not be found",
                ty
            ));
        }
        kind
    }

    // ----- body pass -----

    fn link_members(&mut self, pending: Vec<Pending<'_>>) {
        for item in pending {
            match item {
                Pending::Field { id, class, decl } => {
                    let MemberDecl::Field {
                        name,
                        value,
                        line,
                        column,
                        ..
                    } = decl
                    else {
                        continue;
                    };
                    self.enter_member(class, name, (*line, *column));
                    self.functions.push(FunctionScope::default());
                    let init = self.link_field_init(id, value);
                    self.functions.pop();
                    self.code.fields[id].init = init;
                }

                Pending::Method { id, class, decl } => {
                    let MemberDecl::Method {
                        name,
                        params,
                        body,
                        line,
                        column,
                    } = decl
                    else {
                        continue;
                    };
                    self.enter_member(class, name, (*line, *column));
                    let code = self.link_function(params, &[], body);
                    self.code.methods[id].code = Arc::new(code);
                }
            }
        }
    }

    fn enter_member(&mut self, class: usize, name: &str, position: (usize, usize)) {
        self.class = class;
        self.member = format!("{}.{}", self.code.classes[class].qualified_name(), name);
        self.position = position;
    }

    fn link_field_init(&mut self, id: FieldId, value: &Expression) -> Node {
        let Some(DeclaredType::Func(func)) = self.code.fields[id].ty.clone() else {
            return self.link_expr(value);
        };

        match value {
            Expression::Lambda(lambda) if lambda.params.len() != func.params.len() => {
                return self.error(format!(
                    "Delegate '{}' does not take {} arguments",
                    func,
                    lambda.params.len()
                ));
            }
            Expression::Variable(_) | Expression::Member { .. } => {
                if let Some(Target::Methods { class, name }) = self.resolve_path_expr(value) {
                    return self.method_group_value(class, &name, Some(func.params.len()));
                }
            }
            _ => {}
        }
        self.link_expr(value)
    }

    fn link_function(
        &mut self,
        params: &[String],
        param_kinds: &[Option<ValueKind>],
        body: &LambdaBody,
    ) -> LambdaCode {
        self.functions
            .push(FunctionScope::with_params(params, param_kinds));

        let body = match body {
            LambdaBody::Expression(expr) => Body::Expression(self.link_expr(expr)),
            LambdaBody::Block(statements) => {
                if !always_returns(statements) {
                    self.error("not all code paths return a value");
                }
                Body::Block(self.link_block(statements))
            }
        };

        let frame_size = self
            .functions
            .pop()
            .map(|scope| scope.next_slot)
            .unwrap_or(params.len());

        LambdaCode {
            name: self.member.clone(),
            params: params.len(),
            param_kinds: param_kinds.to_vec(),
            frame_size,
            body,
        }
    }

    fn scope_mut(&mut self) -> &mut FunctionScope {
        if self.functions.is_empty() {
            self.functions.push(FunctionScope::default());
        }
        let last = self.functions.len() - 1;
        &mut self.functions[last]
    }

    fn link_block(&mut self, statements: &[Statement]) -> Vec<Instr> {
        self.scope_mut().blocks.push(Vec::new());
        let mut instrs = Vec::with_capacity(statements.len());
        for statement in statements {
            self.link_statement(statement, &mut instrs);
        }
        self.scope_mut().blocks.pop();
        instrs
    }

    fn link_statement(&mut self, statement: &Statement, out: &mut Vec<Instr>) {
        match statement {
            Statement::LocalDecl {
                type_name,
                name,
                value,
            } => {
                let kind = match type_name.as_str() {
                    "var" => None,
                    other => match ValueKind::from_type_name(other) {
                        Some(kind) => Some(kind),
                        None => {
                            self.error(format!(
                                "The type or namespace name '{}' could not be found",
                                other
                            ));
                            None
                        }
                    },
                };
                let value = self.link_expr(value);

                if self.functions.last().and_then(|f| f.find(name)).is_some() {
                    self.error(format!(
                        "A local variable named '{}' is already defined in this scope",
                        name
                    ));
                    return;
                }
                let scope = self.scope_mut();
                let slot = scope.next_slot;
                scope.next_slot += 1;
                if let Some(block) = scope.blocks.last_mut() {
                    block.push(Local {
                        name: name.clone(),
                        slot,
                        kind,
                    });
                }
                out.push(Instr::Store { slot, value, kind });
            }

            Statement::Assign { target, op, value } => {
                if let Some(instr) = self.link_assign(target, *op, value) {
                    out.push(instr);
                }
            }

            Statement::Return(expr) => out.push(Instr::Return(self.link_expr(expr))),

            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.link_expr(condition);
                let then_branch = self.link_block(std::slice::from_ref(then_branch));
                let else_branch = match else_branch {
                    Some(branch) => self.link_block(std::slice::from_ref(branch)),
                    None => Vec::new(),
                };
                out.push(Instr::If {
                    condition,
                    then_branch,
                    else_branch,
                });
            }

            Statement::Block(statements) => out.extend(self.link_block(statements)),

            Statement::Expression(expr) => out.push(Instr::Eval(self.link_expr(expr))),
        }
    }

    fn link_assign(
        &mut self,
        target: &AssignTarget,
        op: Option<crate::parser::BinaryOp>,
        value: &Expression,
    ) -> Option<Instr> {
        let variable = match target {
            AssignTarget::Variable(name) | AssignTarget::Member { object: name, .. } => name,
        };

        let (slot, kind) = match self.resolve_name(variable) {
            Some(Target::Local { depth: 0, slot }) => {
                let kind = self
                    .functions
                    .last()
                    .and_then(|f| f.find(variable))
                    .and_then(|local| local.kind);
                (slot, kind)
            }
            Some(Target::Local { .. }) => {
                self.error(format!("Cannot assign to captured variable '{}'", variable));
                return None;
            }
            Some(Target::Field(id)) => {
                let name = self.code.field_name(id);
                self.error(format!(
                    "Property or indexer '{}' cannot be assigned to -- it is read only",
                    name
                ));
                return None;
            }
            Some(_) => {
                self.error(format!("Cannot assign to '{}'", target));
                return None;
            }
            None => {
                self.error(format!(
                    "The name '{}' does not exist in the current context",
                    variable
                ));
                return None;
            }
        };

        let value = self.link_expr(value);
        let current = Node::Local { depth: 0, slot };

        Some(match target {
            AssignTarget::Variable(_) => Instr::Store {
                slot,
                value: compound(op, current, value),
                kind,
            },
            AssignTarget::Member { name, .. } => {
                let member = Node::Member {
                    object: Box::new(current),
                    name: name.clone(),
                    null_conditional: false,
                };
                Instr::StoreField {
                    slot,
                    name: name.clone(),
                    value: compound(op, member, value),
                }
            }
        })
    }

    // ----- expressions -----

    fn link_expr(&mut self, expr: &Expression) -> Node {
        match expr {
            Expression::IntLiteral(n) => Node::Const(Value::Int(*n)),
            Expression::FloatLiteral(f) => Node::Const(Value::Float(*f)),
            Expression::StringLiteral(s) => Node::Const(Value::String(s.clone())),
            Expression::BoolLiteral(b) => Node::Const(Value::Bool(*b)),
            Expression::NullLiteral => Node::Const(Value::Null),

            Expression::Interpolated(segments) => Node::Interpolated(
                segments
                    .iter()
                    .map(|segment| match segment {
                        InterpolatedSegment::Text(text) => Segment::Text(text.clone()),
                        InterpolatedSegment::Expr(expr) => Segment::Node(self.link_expr(expr)),
                    })
                    .collect(),
            ),

            Expression::ArrayLiteral(items) => {
                Node::Array(items.iter().map(|item| self.link_expr(item)).collect())
            }

            Expression::ObjectLiteral(fields) => Node::Record(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), self.link_expr(value)))
                    .collect(),
            ),

            Expression::Grouping(inner) => self.link_expr(inner),

            Expression::Binary { op, left, right } => Node::Binary {
                op: *op,
                left: Box::new(self.link_expr(left)),
                right: Box::new(self.link_expr(right)),
            },

            Expression::Unary { op, operand } => Node::Unary {
                op: *op,
                operand: Box::new(self.link_expr(operand)),
            },

            Expression::Ternary {
                condition,
                then_expr,
                else_expr,
            } => Node::Ternary {
                condition: Box::new(self.link_expr(condition)),
                then_node: Box::new(self.link_expr(then_expr)),
                else_node: Box::new(self.link_expr(else_expr)),
            },

            Expression::Variable(name) => match self.resolve_name(name) {
                Some(target) => self.target_value(target),
                None => self.error(format!(
                    "The name '{}' does not exist in the current context",
                    name
                )),
            },

            Expression::Member {
                object,
                name,
                null_conditional,
            } => {
                if let Some(node) = self.link_path(expr) {
                    return node;
                }
                Node::Member {
                    object: Box::new(self.link_expr(object)),
                    name: name.clone(),
                    null_conditional: *null_conditional,
                }
            }

            Expression::Call { callee, args } => self.link_call(callee, args),

            Expression::Index { object, index } => Node::Index {
                object: Box::new(self.link_expr(object)),
                index: Box::new(self.link_expr(index)),
            },

            Expression::Lambda(lambda) => {
                let kinds = self.param_kinds(&lambda.param_types);
                let code = self.link_function(&lambda.params, &kinds, &lambda.body);
                Node::Lambda(Arc::new(code))
            }
        }
    }

    /// Resolves `(int a, b) => ...` parameter type names
    fn param_kinds(&mut self, type_names: &[Option<String>]) -> Vec<Option<ValueKind>> {
        type_names
            .iter()
            .map(|type_name| {
                let name = type_name.as_deref()?;
                let kind = ValueKind::from_type_name(name);
                if kind.is_none() {
                    self.error(format!(
                        "The type or namespace name '{}' could not be found",
                        name
                    ));
                }
                kind
            })
            .collect()
    }

    fn link_args(&mut self, args: &[Expression]) -> Vec<Node> {
        args.iter().map(|arg| self.link_expr(arg)).collect()
    }

    fn link_call(&mut self, callee: &Expression, args: &[Expression]) -> Node {
        if let Some(path) = callee.dotted_path() {
            match self.resolve_path(&path) {
                Some((target, used)) if used == path.len() => {
                    return self.call_target(target, &path.join("."), args);
                }
                Some((target, used)) if used == path.len() - 1 => {
                    let object = self.target_value(target);
                    return Node::MemberCall {
                        object: Box::new(object),
                        name: path[used].clone(),
                        args: self.link_args(args),
                        null_conditional: false,
                    };
                }
                Some(_) => {}
                None => {
                    return self.error(format!(
                        "The name '{}' does not exist in the current context",
                        path[0]
                    ))
                }
            }
        }

        if let Expression::Member {
            object,
            name,
            null_conditional,
        } = callee
        {
            return Node::MemberCall {
                object: Box::new(self.link_expr(object)),
                name: name.clone(),
                args: self.link_args(args),
                null_conditional: *null_conditional,
            };
        }

        Node::Call {
            callee: Box::new(self.link_expr(callee)),
            args: self.link_args(args),
        }
    }

    fn call_target(&mut self, target: Target, display: &str, args: &[Expression]) -> Node {
        match target {
            Target::Methods { class, name } => {
                match self.code.overload(class, &name, args.len()) {
                    Some(method) => Node::CallMethod {
                        method,
                        args: self.link_args(args),
                    },
                    None => self.error(format!(
                        "No overload for method '{}' takes {} arguments",
                        name,
                        args.len()
                    )),
                }
            }

            Target::Field(id) => {
                let args = self.link_args(args);
                match self.code.fields[id].ty.clone() {
                    Some(DeclaredType::Func(func)) => {
                        if func.params.len() != args.len() {
                            return self.error(format!(
                                "Delegate '{}' does not take {} arguments",
                                func,
                                args.len()
                            ));
                        }
                        let callee = Box::new(Node::Field(id));
                        if func.is_dynamic() {
                            Node::Call { callee, args }
                        } else {
                            Node::TypedCall {
                                callee,
                                args,
                                signature: func,
                            }
                        }
                    }
                    _ => Node::Call {
                        callee: Box::new(Node::Field(id)),
                        args,
                    },
                }
            }

            Target::Export(value) => {
                if let Some(expected) = value.parameter_count() {
                    if expected != args.len() {
                        return self.error(format!(
                            "No overload for method '{}' takes {} arguments",
                            display,
                            args.len()
                        ));
                    }
                }
                Node::Call {
                    callee: Box::new(Node::Const(value)),
                    args: self.link_args(args),
                }
            }

            Target::Local { depth, slot } => Node::Call {
                callee: Box::new(Node::Local { depth, slot }),
                args: self.link_args(args),
            },
        }
    }

    /// Value of a resolved target; a method group becomes a function value
    fn target_value(&mut self, target: Target) -> Node {
        match target {
            Target::Local { depth, slot } => Node::Local { depth, slot },
            Target::Field(id) => Node::Field(id),
            Target::Export(value) => Node::Const(value),
            Target::Methods { class, name } => self.method_group_value(class, &name, None),
        }
    }

    fn method_group_value(&mut self, class: usize, name: &str, arity: Option<usize>) -> Node {
        let overloads = self.code.classes[class]
            .methods
            .get(name)
            .cloned()
            .unwrap_or_default();
        let method = match arity {
            Some(arity) => self.code.overload(class, name, arity),
            None if overloads.len() == 1 => overloads.first().copied(),
            None => None,
        };

        let Some(method) = method else {
            return match arity {
                Some(arity) => self.error(format!(
                    "No overload for '{}' matches delegate taking {} arguments",
                    name, arity
                )),
                None => self.error(format!(
                    "Cannot convert method group '{}' to a value: it has {} overloads",
                    name,
                    overloads.len()
                )),
            };
        };

        let params = self.code.methods[method].code.params;
        Node::Lambda(Arc::new(LambdaCode {
            name: format!("{}.{}", self.code.classes[class].qualified_name(), name),
            params,
            param_kinds: Vec::new(),
            frame_size: params,
            body: Body::Expression(Node::CallMethod {
                method,
                args: (0..params)
                    .map(|slot| Node::Local { depth: 0, slot })
                    .collect(),
            }),
        }))
    }

    /// Links a member chain that starts at a class path or reference export.
    /// Returns `None` when the chain starts at a local or current-class member.
    fn link_path(&mut self, expr: &Expression) -> Option<Node> {
        let path = expr.dotted_path()?;
        if self.resolve_name(&path[0]).is_some() {
            return None;
        }
        match self.resolve_path(&path) {
            Some((target, used)) => {
                let mut node = self.target_value(target);
                for name in &path[used..] {
                    node = Node::Member {
                        object: Box::new(node),
                        name: name.clone(),
                        null_conditional: false,
                    };
                }
                Some(node)
            }
            None => Some(self.error(format!(
                "The name '{}' does not exist in the current context",
                path[0]
            ))),
        }
    }

    fn resolve_path_expr(&self, expr: &Expression) -> Option<Target> {
        let path = expr.dotted_path()?;
        match self.resolve_path(&path)? {
            (target, used) if used == path.len() => Some(target),
            _ => None,
        }
    }

    /// Resolves the longest prefix of `path` that names something; returns
    /// the target and how many segments it consumed
    fn resolve_path(&self, path: &[String]) -> Option<(Target, usize)> {
        if let Some(target) = self.resolve_name(&path[0]) {
            return Some((target, 1));
        }
        for used in (2..=path.len()).rev() {
            if let Some(target) = self.resolve_qualified(&path[..used]) {
                return Some((target, used));
            }
        }
        None
    }

    fn resolve_qualified(&self, segments: &[String]) -> Option<Target> {
        let (member, owner) = segments.split_last()?;
        let owner = owner.join(".");
        let namespace = &self.code.classes[self.class].namespace;

        let class = self
            .code
            .class_index(&owner)
            .or_else(|| self.code.class_index(&format!("{}.{}", namespace, owner)));
        if let Some(class) = class {
            if let Some(target) = self.class_member(class, member) {
                return Some(target);
            }
        }

        self.exports
            .get(&segments.join("."))
            .map(|value| Target::Export(value.clone()))
    }

    fn class_member(&self, class: usize, name: &str) -> Option<Target> {
        let info = self.code.classes.get(class)?;
        if let Some(id) = info.fields.get(name) {
            return Some(Target::Field(*id));
        }
        if info.methods.contains_key(name) {
            return Some(Target::Methods {
                class,
                name: name.to_string(),
            });
        }
        None
    }

    /// Resolves a simple name: locals innermost first, then members of the
    /// current class, then undotted reference exports
    fn resolve_name(&self, name: &str) -> Option<Target> {
        for (depth, function) in self.functions.iter().rev().enumerate() {
            if let Some(local) = function.find(name) {
                return Some(Target::Local {
                    depth,
                    slot: local.slot,
                });
            }
        }
        if let Some(target) = self.class_member(self.class, name) {
            return Some(target);
        }
        self.exports
            .get(name)
            .map(|value| Target::Export(value.clone()))
    }
}

fn compound(op: Option<crate::parser::BinaryOp>, current: Node, value: Node) -> Node {
    match op {
        Some(op) => Node::Binary {
            op,
            left: Box::new(current),
            right: Box::new(value),
        },
        None => value,
    }
}
