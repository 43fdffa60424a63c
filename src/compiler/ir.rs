//! Linked intermediate representation
//!
//! Every name in the IR is already resolved: locals to frame slots, class
//! members to field/method ids, reference exports to constant values.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::binder::ValueKind;
use crate::parser::{BinaryOp, UnaryOp};
use crate::runtime::Value;

/// Index into the module's field store
pub type FieldId = usize;
/// Index into the module's method table
pub type MethodId = usize;

/// Expression nodes
#[derive(Debug, Clone)]
pub enum Node {
    /// Literal or resolved reference export
    Const(Value),
    /// Frame slot, `depth` closure levels up from the current function
    Local {
        /// Number of enclosing functions to walk up (0 = current frame)
        depth: usize,
        /// Slot in that frame
        slot: usize,
    },
    /// Class field
    Field(FieldId),
    /// Interpolated string
    Interpolated(Vec<Segment>),
    /// Array literal
    Array(Vec<Node>),
    /// Record literal
    Record(Vec<(String, Node)>),
    /// Binary operator; `&&`, `||` and `??` short-circuit
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Node>,
        /// Right operand
        right: Box<Node>,
    },
    /// Unary operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Node>,
    },
    /// Conditional expression
    Ternary {
        /// Condition, must evaluate to bool
        condition: Box<Node>,
        /// Value when true
        then_node: Box<Node>,
        /// Value when false
        else_node: Box<Node>,
    },
    /// Invocation of a function value
    Call {
        /// Callee
        callee: Box<Node>,
        /// Arguments
        args: Vec<Node>,
    },
    /// Invocation through a `Func<...>` annotation; arguments and result are
    /// coerced to the declared kinds
    TypedCall {
        /// Callee
        callee: Box<Node>,
        /// Arguments
        args: Vec<Node>,
        /// Declared delegate type
        signature: Arc<FuncType>,
    },
    /// Direct call of a class method overload
    CallMethod {
        /// Resolved overload
        method: MethodId,
        /// Arguments
        args: Vec<Node>,
    },
    /// Member read
    Member {
        /// Receiver
        object: Box<Node>,
        /// Member name
        name: String,
        /// `?.` access
        null_conditional: bool,
    },
    /// Method call on a value (`s.ToUpper()`, `record.fn(x)`)
    MemberCall {
        /// Receiver
        object: Box<Node>,
        /// Method name
        name: String,
        /// Arguments
        args: Vec<Node>,
        /// `?.` access
        null_conditional: bool,
    },
    /// Indexer
    Index {
        /// Receiver
        object: Box<Node>,
        /// Index
        index: Box<Node>,
    },
    /// Function literal
    Lambda(Arc<LambdaCode>),
}

/// Piece of an interpolated string
#[derive(Debug, Clone)]
pub enum Segment {
    /// Literal text
    Text(String),
    /// Embedded expression
    Node(Node),
}

/// Block statements
#[derive(Debug, Clone)]
pub enum Instr {
    /// Write a frame slot, coercing to the declared local kind
    Store {
        /// Target slot in the current frame
        slot: usize,
        /// Value
        value: Node,
        /// Declared kind (`None` for `var`)
        kind: Option<ValueKind>,
    },
    /// Set a field on the record held in a frame slot
    StoreField {
        /// Slot holding the record
        slot: usize,
        /// Field name
        name: String,
        /// Value
        value: Node,
    },
    /// Return from the function
    Return(Node),
    /// Conditional
    If {
        /// Condition
        condition: Node,
        /// Instructions when true
        then_branch: Vec<Instr>,
        /// Instructions when false
        else_branch: Vec<Instr>,
    },
    /// Evaluate for effect
    Eval(Node),
}

/// Function body
#[derive(Debug, Clone)]
pub enum Body {
    /// Expression body
    Expression(Node),
    /// Statement body
    Block(Vec<Instr>),
}

/// A compiled function: a method or a function literal
#[derive(Debug)]
pub struct LambdaCode {
    /// Diagnostic name
    pub name: String,
    /// Parameter count; parameters occupy the first slots of the frame
    pub params: usize,
    /// Declared parameter kinds; typed arguments are coerced on entry. May
    /// be shorter than `params`.
    pub param_kinds: Vec<Option<ValueKind>>,
    /// Total frame slots (parameters plus locals)
    pub frame_size: usize,
    /// Function body
    pub body: Body,
}

/// A `Func<T1, ..., R>` annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncType {
    /// Parameter kinds
    pub params: Vec<ValueKind>,
    /// Return kind
    pub returns: ValueKind,
}

impl FuncType {
    /// True when every slot is the generic object kind
    pub fn is_dynamic(&self) -> bool {
        self.params.iter().all(|k| *k == ValueKind::Object) && self.returns == ValueKind::Object
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Func<")?;
        for kind in &self.params {
            write!(f, "{}, ", kind)?;
        }
        write!(f, "{}>", self.returns)
    }
}

/// Declared type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    /// Delegate type
    Func(Arc<FuncType>),
    /// Plain value kind
    Value(ValueKind),
}

/// A class in the linked module
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Namespace name
    pub namespace: String,
    /// Class name
    pub name: String,
    /// Fields by name
    pub fields: HashMap<String, FieldId>,
    /// Method overloads by name
    pub methods: HashMap<String, Vec<MethodId>>,
}

impl ClassInfo {
    /// `Namespace.Class`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// A field and its initializer
#[derive(Debug, Clone)]
pub struct FieldCode {
    /// Owning class index
    pub class: usize,
    /// Field name
    pub name: String,
    /// Declared type, if annotated
    pub ty: Option<DeclaredType>,
    /// Initializer, evaluated once at load
    pub init: Node,
}

/// A method overload
#[derive(Debug, Clone)]
pub struct MethodCode {
    /// Owning class index
    pub class: usize,
    /// Method name
    pub name: String,
    /// Compiled body
    pub code: Arc<LambdaCode>,
}

/// The linked form of every unit in one compilation
#[derive(Debug, Default)]
pub struct ModuleCode {
    /// Classes in declaration order
    pub classes: Vec<ClassInfo>,
    /// Fields in initialization order
    pub fields: Vec<FieldCode>,
    /// Method overloads
    pub methods: Vec<MethodCode>,
}

impl ModuleCode {
    /// Finds a class by `Namespace.Class`
    pub fn class_index(&self, qualified: &str) -> Option<usize> {
        self.classes
            .iter()
            .position(|c| c.qualified_name() == qualified)
    }

    /// Finds a field by `Namespace.Class.field`
    pub fn field_id(&self, qualified: &str) -> Option<FieldId> {
        let (owner, member) = qualified.rsplit_once('.')?;
        let class = self.class_index(owner)?;
        self.classes[class].fields.get(member).copied()
    }

    /// Finds the overload of `Namespace.Class.method` taking `arity` arguments
    pub fn method_overload(&self, qualified: &str, arity: usize) -> Option<MethodId> {
        let (owner, member) = qualified.rsplit_once('.')?;
        let class = self.class_index(owner)?;
        self.overload(class, member, arity)
    }

    /// Finds an overload in a class by name and arity
    pub fn overload(&self, class: usize, name: &str, arity: usize) -> Option<MethodId> {
        self.classes[class]
            .methods
            .get(name)?
            .iter()
            .copied()
            .find(|id| self.methods[*id].code.params == arity)
    }

    /// Qualified name of a field
    pub fn field_name(&self, id: FieldId) -> String {
        let field = &self.fields[id];
        format!("{}.{}", self.classes[field.class].qualified_name(), field.name)
    }
}
