//! Tree-walking interpreter over linked IR

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use super::builtins;
use super::operators::{apply_binary_op, apply_unary_op};
use super::value::Value;
use crate::compiler::ir::{Body, FuncType, Instr, LambdaCode, Node, Segment};
use crate::compiler::LoadedModule;
use crate::error::{Error, Result};
use crate::parser::BinaryOp;

/// Frame snapshot captured by a function literal. Captures are by value.
#[derive(Debug)]
pub struct Captured {
    slots: Vec<Value>,
    parent: Option<Arc<Captured>>,
}

/// A function literal together with its captured frames.
///
/// Closures reference their module weakly so that module fields holding
/// closures do not keep the module alive. A closure handed back to the host
/// is [`retained`](Closure::retained) instead.
pub struct Closure {
    code: Arc<LambdaCode>,
    captured: Option<Arc<Captured>>,
    module: Weak<LoadedModule>,
    owner: Option<Arc<LoadedModule>>,
}

impl Closure {
    /// Number of declared parameters
    pub fn params(&self) -> usize {
        self.code.params
    }

    /// Copy of the closure that keeps `module` loaded for as long as it lives
    pub fn retained(&self, module: Arc<LoadedModule>) -> Closure {
        Closure {
            code: self.code.clone(),
            captured: self.captured.clone(),
            module: Arc::downgrade(&module),
            owner: Some(module),
        }
    }

    /// Invokes the closure. Fails once its module has been dropped.
    pub fn invoke(&self, args: Vec<Value>) -> Result<Value> {
        let module = self.module.upgrade().ok_or_else(|| Error::ModuleUnloaded {
            name: self.code.name.clone(),
        })?;
        Interpreter::new(&module).call(&self.code, args, self.captured.clone())
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.code.name)
            .field("params", &self.code.params)
            .finish()
    }
}

struct Frame {
    slots: Vec<Value>,
    parent: Option<Arc<Captured>>,
}

/// Evaluates IR against one loaded module
pub struct Interpreter<'m> {
    module: &'m Arc<LoadedModule>,
}

impl<'m> Interpreter<'m> {
    /// Creates an interpreter bound to a module
    pub fn new(module: &'m Arc<LoadedModule>) -> Self {
        Interpreter { module }
    }

    /// Calls compiled code with positional arguments
    pub fn call(
        &self,
        code: &LambdaCode,
        args: Vec<Value>,
        parent: Option<Arc<Captured>>,
    ) -> Result<Value> {
        if args.len() != code.params {
            return Err(Error::ArityMismatch {
                name: code.name.clone(),
                expected: code.params,
                got: args.len(),
            });
        }

        let mut slots = args;
        for (slot, kind) in slots.iter_mut().zip(&code.param_kinds) {
            if let Some(kind) = kind {
                *slot = kind.coerce(std::mem::replace(slot, Value::Null))?;
            }
        }
        slots.resize(code.frame_size.max(code.params), Value::Null);
        let mut frame = Frame { slots, parent };

        match &code.body {
            Body::Expression(node) => self.eval(node, &mut frame),
            Body::Block(instrs) => Ok(self.exec(instrs, &mut frame)?.unwrap_or(Value::Null)),
        }
    }

    /// Evaluates a field initializer
    pub fn eval_init(&self, node: &Node) -> Result<Value> {
        let mut frame = Frame {
            slots: Vec::new(),
            parent: None,
        };
        self.eval(node, &mut frame)
    }

    fn exec(&self, instrs: &[Instr], frame: &mut Frame) -> Result<Option<Value>> {
        for instr in instrs {
            match instr {
                Instr::Store { slot, value, kind } => {
                    let mut value = self.eval(value, frame)?;
                    if let Some(kind) = kind {
                        value = kind.coerce(value)?;
                    }
                    *Self::slot_mut(frame, *slot)? = value;
                }
                Instr::StoreField { slot, name, value } => {
                    let value = self.eval(value, frame)?;
                    match Self::slot_mut(frame, *slot)? {
                        Value::Object(fields) => {
                            Arc::make_mut(fields).insert(name.clone(), value);
                        }
                        other => {
                            return Err(Error::TypeError {
                                expected: "record".to_string(),
                                got: other.type_name(),
                            })
                        }
                    }
                }
                Instr::Return(node) => return Ok(Some(self.eval(node, frame)?)),
                Instr::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    let branch = if self.eval(condition, frame)?.as_bool()? {
                        then_branch
                    } else {
                        else_branch
                    };
                    if let Some(result) = self.exec(branch, frame)? {
                        return Ok(Some(result));
                    }
                }
                Instr::Eval(node) => {
                    self.eval(node, frame)?;
                }
            }
        }
        Ok(None)
    }

    fn eval(&self, node: &Node, frame: &mut Frame) -> Result<Value> {
        match node {
            Node::Const(value) => Ok(value.clone()),
            Node::Local { depth, slot } => Self::read_local(frame, *depth, *slot),
            Node::Field(id) => Ok(self.module.field_value(*id)),

            Node::Interpolated(segments) => {
                let mut text = String::new();
                for segment in segments {
                    match segment {
                        Segment::Text(s) => text.push_str(s),
                        Segment::Node(node) => {
                            text.push_str(&self.eval(node, frame)?.to_display_string())
                        }
                    }
                }
                Ok(Value::String(text))
            }

            Node::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item, frame))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::array(values))
            }

            Node::Record(fields) => {
                let mut record = HashMap::with_capacity(fields.len());
                for (name, node) in fields {
                    record.insert(name.clone(), self.eval(node, frame)?);
                }
                Ok(Value::object(record))
            }

            Node::Binary { op, left, right } => match op {
                BinaryOp::And => {
                    if !self.eval(left, frame)?.as_bool()? {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(self.eval(right, frame)?.as_bool()?))
                }
                BinaryOp::Or => {
                    if self.eval(left, frame)?.as_bool()? {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(self.eval(right, frame)?.as_bool()?))
                }
                BinaryOp::Coalesce => {
                    let left = self.eval(left, frame)?;
                    if left.is_null() {
                        self.eval(right, frame)
                    } else {
                        Ok(left)
                    }
                }
                _ => {
                    let left = self.eval(left, frame)?;
                    let right = self.eval(right, frame)?;
                    apply_binary_op(*op, left, right)
                }
            },

            Node::Unary { op, operand } => apply_unary_op(*op, self.eval(operand, frame)?),

            Node::Ternary {
                condition,
                then_node,
                else_node,
            } => {
                if self.eval(condition, frame)?.as_bool()? {
                    self.eval(then_node, frame)
                } else {
                    self.eval(else_node, frame)
                }
            }

            Node::Call { callee, args } => {
                let callee = self.eval(callee, frame)?;
                let args = self.eval_args(args, frame)?;
                callee.call(args)
            }

            Node::TypedCall {
                callee,
                args,
                signature,
            } => {
                let callee = self.eval(callee, frame)?;
                let args = self.eval_args(args, frame)?;
                Self::typed_call(&callee, args, signature)
            }

            Node::CallMethod { method, args } => {
                let args = self.eval_args(args, frame)?;
                let code = self.module.method_code(*method)?;
                self.call(&code, args, None)
            }

            Node::Member {
                object,
                name,
                null_conditional,
            } => {
                let object = self.eval(object, frame)?;
                if *null_conditional && object.is_null() {
                    return Ok(Value::Null);
                }
                builtins::get_member(&object, name)
            }

            Node::MemberCall {
                object,
                name,
                args,
                null_conditional,
            } => {
                let object = self.eval(object, frame)?;
                if *null_conditional && object.is_null() {
                    return Ok(Value::Null);
                }
                let args = self.eval_args(args, frame)?;
                builtins::invoke_member(&object, name, args)
            }

            Node::Index { object, index } => {
                let object = self.eval(object, frame)?;
                let index = self.eval(index, frame)?;
                object.get_index(&index)
            }

            Node::Lambda(code) => {
                let captured = Captured {
                    slots: frame.slots.clone(),
                    parent: frame.parent.clone(),
                };
                Ok(Value::Function(Arc::new(Closure {
                    code: code.clone(),
                    captured: Some(Arc::new(captured)),
                    module: Arc::downgrade(self.module),
                    owner: None,
                })))
            }
        }
    }

    fn eval_args(&self, args: &[Node], frame: &mut Frame) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, frame)).collect()
    }

    /// Calls through a delegate annotation, coercing at the boundary
    pub fn typed_call(callee: &Value, args: Vec<Value>, signature: &FuncType) -> Result<Value> {
        if args.len() != signature.params.len() {
            return Err(Error::ArityMismatch {
                name: signature.to_string(),
                expected: signature.params.len(),
                got: args.len(),
            });
        }
        let args = args
            .into_iter()
            .zip(signature.params.iter())
            .map(|(arg, kind)| kind.coerce(arg))
            .collect::<Result<Vec<_>>>()?;
        signature.returns.coerce(callee.call(args)?)
    }

    fn read_local(frame: &Frame, depth: usize, slot: usize) -> Result<Value> {
        let value = if depth == 0 {
            frame.slots.get(slot)
        } else {
            let mut scope = frame.parent.as_ref();
            for _ in 1..depth {
                scope = scope.and_then(|s| s.parent.as_ref());
            }
            scope.and_then(|s| s.slots.get(slot))
        };
        value
            .cloned()
            .ok_or_else(|| Error::runtime(format!("Unresolved local (depth {}, slot {})", depth, slot)))
    }

    fn slot_mut(frame: &mut Frame, slot: usize) -> Result<&mut Value> {
        frame
            .slots
            .get_mut(slot)
            .ok_or_else(|| Error::runtime(format!("Unresolved local slot {}", slot)))
    }
}
