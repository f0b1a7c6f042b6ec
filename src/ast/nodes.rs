use super::types::TypeNode;
use super::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Constructor,
    Function,
    /// Declared outside any contract; support-library stubs are free functions.
    Free,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    External,
    Internal,
    Private,
}

impl Visibility {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "public" => Some(Self::Public),
            "external" => Some(Self::External),
            "internal" => Some(Self::Internal),
            "private" => Some(Self::Private),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::External => "external",
            Self::Internal => "internal",
            Self::Private => "private",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl Mutability {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "pure" => Some(Self::Pure),
            "view" => Some(Self::View),
            "payable" => Some(Self::Payable),
            _ => None,
        }
    }

    /// Keyword as written in source; non-payable has none.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Pure => Some("pure"),
            Self::View => Some("view"),
            Self::Payable => Some("payable"),
            Self::NonPayable => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    HexNumber,
    Bool,
    String,
}

#[derive(Clone, Debug)]
pub struct SourceUnit {
    pub path: String,
    pub nodes: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct ContractDefinition {
    pub name: String,
    pub is_abstract: bool,
    /// Most-derived first; the contract itself sits at index 0.
    pub linearized_base_contracts: Vec<NodeId>,
    pub inheritance_specifiers: Vec<NodeId>,
    pub members: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct InheritanceSpecifier {
    pub base_name: String,
    pub referenced_declaration: Option<NodeId>,
    pub arguments: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct FunctionDefinition {
    pub name: String,
    pub kind: FunctionKind,
    pub visibility: Visibility,
    pub mutability: Mutability,
    pub scope: Option<NodeId>,
    pub parameters: NodeId,
    pub return_parameters: NodeId,
    pub modifiers: Vec<NodeId>,
    pub body: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct ParameterList {
    pub parameters: Vec<NodeId>,
}

/// `Base(args)` inside a constructor header, or a plain modifier use.
#[derive(Clone, Debug)]
pub struct ModifierInvocation {
    pub name: String,
    pub referenced_declaration: Option<NodeId>,
    pub arguments: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct VariableDeclaration {
    pub name: String,
    pub scope: Option<NodeId>,
    pub ty: TypeNode,
    pub state_variable: bool,
    pub constant: bool,
    pub visibility: Visibility,
    pub value: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub statements: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct VariableDeclarationStatement {
    pub declarations: Vec<NodeId>,
    pub initial_value: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct ExpressionStatement {
    pub expression: NodeId,
}

#[derive(Clone, Debug)]
pub struct IfStatement {
    pub condition: NodeId,
    pub true_body: NodeId,
    pub false_body: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct Return {
    pub expression: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct Identifier {
    pub name: String,
    pub referenced_declaration: Option<NodeId>,
    pub type_string: String,
}

#[derive(Clone, Debug)]
pub struct Literal {
    pub kind: LiteralKind,
    pub value: String,
    pub type_string: String,
}

#[derive(Clone, Debug)]
pub struct IndexAccess {
    pub base: NodeId,
    pub index: Option<NodeId>,
    pub type_string: String,
}

#[derive(Clone, Debug)]
pub struct FunctionCall {
    pub callee: NodeId,
    pub arguments: Vec<NodeId>,
    pub type_string: String,
}

#[derive(Clone, Debug)]
pub struct MemberAccess {
    pub expression: NodeId,
    pub member_name: String,
    pub referenced_declaration: Option<NodeId>,
    pub type_string: String,
}

#[derive(Clone, Debug)]
pub struct BinaryOperation {
    pub operator: String,
    pub left: NodeId,
    pub right: NodeId,
    pub type_string: String,
}

#[derive(Clone, Debug)]
pub struct UnaryOperation {
    pub operator: String,
    pub operand: NodeId,
    pub type_string: String,
}

#[derive(Clone, Debug)]
pub struct Assignment {
    pub operator: String,
    pub lhs: NodeId,
    pub rhs: NodeId,
    pub type_string: String,
}

/// Payload of every node kind the substrate knows about.
#[derive(Clone, Debug)]
pub enum NodeKind {
    SourceUnit(SourceUnit),
    Contract(ContractDefinition),
    InheritanceSpecifier(InheritanceSpecifier),
    Function(FunctionDefinition),
    ParameterList(ParameterList),
    ModifierInvocation(ModifierInvocation),
    Variable(VariableDeclaration),
    Block(Block),
    VariableDeclarationStatement(VariableDeclarationStatement),
    ExpressionStatement(ExpressionStatement),
    If(IfStatement),
    Return(Return),
    Identifier(Identifier),
    Literal(Literal),
    IndexAccess(IndexAccess),
    FunctionCall(FunctionCall),
    MemberAccess(MemberAccess),
    BinaryOperation(BinaryOperation),
    UnaryOperation(UnaryOperation),
    Assignment(Assignment),
}

/// Payload-free discriminant of [`NodeKind`], used for hook dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeTag {
    SourceUnit,
    Contract,
    InheritanceSpecifier,
    Function,
    ParameterList,
    ModifierInvocation,
    Variable,
    Block,
    VariableDeclarationStatement,
    ExpressionStatement,
    If,
    Return,
    Identifier,
    Literal,
    IndexAccess,
    FunctionCall,
    MemberAccess,
    BinaryOperation,
    UnaryOperation,
    Assignment,
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            Self::SourceUnit(_) => NodeTag::SourceUnit,
            Self::Contract(_) => NodeTag::Contract,
            Self::InheritanceSpecifier(_) => NodeTag::InheritanceSpecifier,
            Self::Function(_) => NodeTag::Function,
            Self::ParameterList(_) => NodeTag::ParameterList,
            Self::ModifierInvocation(_) => NodeTag::ModifierInvocation,
            Self::Variable(_) => NodeTag::Variable,
            Self::Block(_) => NodeTag::Block,
            Self::VariableDeclarationStatement(_) => NodeTag::VariableDeclarationStatement,
            Self::ExpressionStatement(_) => NodeTag::ExpressionStatement,
            Self::If(_) => NodeTag::If,
            Self::Return(_) => NodeTag::Return,
            Self::Identifier(_) => NodeTag::Identifier,
            Self::Literal(_) => NodeTag::Literal,
            Self::IndexAccess(_) => NodeTag::IndexAccess,
            Self::FunctionCall(_) => NodeTag::FunctionCall,
            Self::MemberAccess(_) => NodeTag::MemberAccess,
            Self::BinaryOperation(_) => NodeTag::BinaryOperation,
            Self::UnaryOperation(_) => NodeTag::UnaryOperation,
            Self::Assignment(_) => NodeTag::Assignment,
        }
    }

    /// Owned children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            Self::SourceUnit(unit) => out.extend(&unit.nodes),
            Self::Contract(contract) => {
                out.extend(&contract.inheritance_specifiers);
                out.extend(&contract.members);
            }
            Self::InheritanceSpecifier(spec) => out.extend(&spec.arguments),
            Self::Function(func) => {
                out.push(func.parameters);
                out.push(func.return_parameters);
                out.extend(&func.modifiers);
                out.extend(func.body);
            }
            Self::ParameterList(list) => out.extend(&list.parameters),
            Self::ModifierInvocation(invocation) => out.extend(&invocation.arguments),
            Self::Variable(var) => out.extend(var.value),
            Self::Block(block) => out.extend(&block.statements),
            Self::VariableDeclarationStatement(stmt) => {
                out.extend(&stmt.declarations);
                out.extend(stmt.initial_value);
            }
            Self::ExpressionStatement(stmt) => out.push(stmt.expression),
            Self::If(stmt) => {
                out.push(stmt.condition);
                out.push(stmt.true_body);
                out.extend(stmt.false_body);
            }
            Self::Return(ret) => out.extend(ret.expression),
            Self::Identifier(_) | Self::Literal(_) => {}
            Self::IndexAccess(access) => {
                out.push(access.base);
                out.extend(access.index);
            }
            Self::FunctionCall(call) => {
                out.push(call.callee);
                out.extend(&call.arguments);
            }
            Self::MemberAccess(access) => out.push(access.expression),
            Self::BinaryOperation(op) => {
                out.push(op.left);
                out.push(op.right);
            }
            Self::UnaryOperation(op) => out.push(op.operand),
            Self::Assignment(assign) => {
                out.push(assign.lhs);
                out.push(assign.rhs);
            }
        }
        out
    }

    /// Mutable child slots, in the same order as [`NodeKind::children`].
    pub fn children_mut(&mut self) -> Vec<&mut NodeId> {
        let mut out: Vec<&mut NodeId> = Vec::new();
        match self {
            Self::SourceUnit(unit) => out.extend(unit.nodes.iter_mut()),
            Self::Contract(contract) => {
                out.extend(contract.inheritance_specifiers.iter_mut());
                out.extend(contract.members.iter_mut());
            }
            Self::InheritanceSpecifier(spec) => out.extend(spec.arguments.iter_mut()),
            Self::Function(func) => {
                out.push(&mut func.parameters);
                out.push(&mut func.return_parameters);
                out.extend(func.modifiers.iter_mut());
                out.extend(func.body.as_mut());
            }
            Self::ParameterList(list) => out.extend(list.parameters.iter_mut()),
            Self::ModifierInvocation(invocation) => out.extend(invocation.arguments.iter_mut()),
            Self::Variable(var) => out.extend(var.value.as_mut()),
            Self::Block(block) => out.extend(block.statements.iter_mut()),
            Self::VariableDeclarationStatement(stmt) => {
                out.extend(stmt.declarations.iter_mut());
                out.extend(stmt.initial_value.as_mut());
            }
            Self::ExpressionStatement(stmt) => out.push(&mut stmt.expression),
            Self::If(stmt) => {
                out.push(&mut stmt.condition);
                out.push(&mut stmt.true_body);
                out.extend(stmt.false_body.as_mut());
            }
            Self::Return(ret) => out.extend(ret.expression.as_mut()),
            Self::Identifier(_) | Self::Literal(_) => {}
            Self::IndexAccess(access) => {
                out.push(&mut access.base);
                out.extend(access.index.as_mut());
            }
            Self::FunctionCall(call) => {
                out.push(&mut call.callee);
                out.extend(call.arguments.iter_mut());
            }
            Self::MemberAccess(access) => out.push(&mut access.expression),
            Self::BinaryOperation(op) => {
                out.push(&mut op.left);
                out.push(&mut op.right);
            }
            Self::UnaryOperation(op) => out.push(&mut op.operand),
            Self::Assignment(assign) => {
                out.push(&mut assign.lhs);
                out.push(&mut assign.rhs);
            }
        }
        out
    }

    /// Swap `old` for `new` in whichever child slot holds it.
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        for slot in self.children_mut() {
            if *slot == old {
                *slot = new;
                return true;
            }
        }
        false
    }

    /// Append to the kind's list-shaped child slot, if it has one.
    pub fn append_child(&mut self, child: NodeId) -> bool {
        match self {
            Self::SourceUnit(unit) => unit.nodes.push(child),
            Self::Contract(contract) => contract.members.push(child),
            Self::Block(block) => block.statements.push(child),
            Self::ParameterList(list) => list.parameters.push(child),
            _ => return false,
        }
        true
    }

    /// Slot naming the declaration this node refers to.
    pub fn reference_mut(&mut self) -> Option<&mut Option<NodeId>> {
        match self {
            Self::Identifier(ident) => Some(&mut ident.referenced_declaration),
            Self::MemberAccess(access) => Some(&mut access.referenced_declaration),
            Self::ModifierInvocation(invocation) => Some(&mut invocation.referenced_declaration),
            Self::InheritanceSpecifier(spec) => Some(&mut spec.referenced_declaration),
            _ => None,
        }
    }

    pub fn referenced_declaration(&self) -> Option<NodeId> {
        match self {
            Self::Identifier(ident) => ident.referenced_declaration,
            Self::MemberAccess(access) => access.referenced_declaration,
            Self::ModifierInvocation(invocation) => invocation.referenced_declaration,
            Self::InheritanceSpecifier(spec) => spec.referenced_declaration,
            _ => None,
        }
    }

    pub fn scope_mut(&mut self) -> Option<&mut Option<NodeId>> {
        match self {
            Self::Function(func) => Some(&mut func.scope),
            Self::Variable(var) => Some(&mut var.scope),
            _ => None,
        }
    }

    pub fn type_string(&self) -> Option<&str> {
        match self {
            Self::Identifier(n) => Some(&n.type_string),
            Self::Literal(n) => Some(&n.type_string),
            Self::IndexAccess(n) => Some(&n.type_string),
            Self::FunctionCall(n) => Some(&n.type_string),
            Self::MemberAccess(n) => Some(&n.type_string),
            Self::BinaryOperation(n) => Some(&n.type_string),
            Self::UnaryOperation(n) => Some(&n.type_string),
            Self::Assignment(n) => Some(&n.type_string),
            _ => None,
        }
    }

    pub fn type_string_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::Identifier(n) => Some(&mut n.type_string),
            Self::Literal(n) => Some(&mut n.type_string),
            Self::IndexAccess(n) => Some(&mut n.type_string),
            Self::FunctionCall(n) => Some(&mut n.type_string),
            Self::MemberAccess(n) => Some(&mut n.type_string),
            Self::BinaryOperation(n) => Some(&mut n.type_string),
            Self::UnaryOperation(n) => Some(&mut n.type_string),
            Self::Assignment(n) => Some(&mut n.type_string),
            _ => None,
        }
    }

    pub fn is_expression(&self) -> bool {
        self.type_string().is_some()
    }
}
