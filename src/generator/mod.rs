use crate::ast::nodes::*;
use crate::ast::{Ast, NodeId};

/// Render every source unit of `ast` as Solidity-like text.
///
/// Support-library stubs are not printed; their units get an
/// `import {name} from "library";` line instead.
pub fn generate(ast: &Ast) -> String {
    let mut printer = Printer { ast, output: String::new(), indent: 0 };
    for &root in ast.roots() {
        printer.source_unit(root);
    }
    printer.output
}

struct Printer<'a> {
    ast: &'a Ast,
    output: String,
    indent: usize,
}

impl<'a> Printer<'a> {
    fn line(&mut self, text: &str) {
        self.output.push_str(&"    ".repeat(self.indent));
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn source_unit(&mut self, unit: NodeId) {
        let ast = self.ast;
        let NodeKind::SourceUnit(source) = ast.kind(unit) else {
            return;
        };
        self.line(&format!("// {}", source.path));

        let imports: Vec<_> = ast
            .imports()
            .iter()
            .filter(|record| ast.root_of(record.declaration) == unit)
            .collect();
        for record in &imports {
            self.line(&format!("import {{{}}} from \"{}\";", record.name, record.library));
        }
        if !imports.is_empty() {
            self.output.push('\n');
        }

        for &node in &source.nodes {
            if ast.imports().is_stub(node) {
                continue;
            }
            match ast.kind(node) {
                NodeKind::Contract(_) => self.contract(node),
                NodeKind::Function(_) => self.function(node),
                _ => {}
            }
            self.output.push('\n');
        }
    }

    fn contract(&mut self, node: NodeId) {
        let ast = self.ast;
        let NodeKind::Contract(contract) = ast.kind(node) else {
            return;
        };
        let mut header = String::new();
        if contract.is_abstract {
            header.push_str("abstract ");
        }
        header.push_str(&format!("contract {}", contract.name));
        if !contract.inheritance_specifiers.is_empty() {
            let bases: Vec<String> = contract
                .inheritance_specifiers
                .iter()
                .map(|&spec| self.inheritance_specifier(spec))
                .collect();
            header.push_str(&format!(" is {}", bases.join(", ")));
        }
        header.push_str(" {");
        self.line(&header);

        self.indent += 1;
        for &member in &contract.members {
            match ast.kind(member) {
                NodeKind::Function(_) => self.function(member),
                NodeKind::Variable(var) => {
                    let mut text = format!("{} ", var.ty);
                    if var.visibility != Visibility::Internal {
                        text.push_str(&format!("{} ", var.visibility.as_str()));
                    }
                    if var.constant {
                        text.push_str("constant ");
                    }
                    text.push_str(&var.name);
                    if let Some(value) = var.value {
                        text.push_str(&format!(" = {}", self.expression(value)));
                    }
                    text.push(';');
                    self.line(&text);
                }
                _ => {}
            }
        }
        self.indent -= 1;
        self.line("}");
    }

    fn inheritance_specifier(&self, spec: NodeId) -> String {
        let ast = self.ast;
        match ast.kind(spec) {
            NodeKind::InheritanceSpecifier(spec) if spec.arguments.is_empty() => spec.base_name.clone(),
            NodeKind::InheritanceSpecifier(spec) => {
                format!("{}({})", spec.base_name, self.arguments(&spec.arguments))
            }
            _ => String::new(),
        }
    }

    fn function(&mut self, node: NodeId) {
        let ast = self.ast;
        let NodeKind::Function(func) = ast.kind(node) else {
            return;
        };
        let mut header = match func.kind {
            FunctionKind::Constructor => "constructor".to_string(),
            FunctionKind::Function | FunctionKind::Free => format!("function {}", func.name),
        };
        header.push_str(&format!("({})", self.parameters(func.parameters)));
        if func.kind != FunctionKind::Free {
            header.push_str(&format!(" {}", func.visibility.as_str()));
        }
        if let Some(keyword) = func.mutability.keyword() {
            header.push_str(&format!(" {}", keyword));
        }
        for &modifier in &func.modifiers {
            if let NodeKind::ModifierInvocation(invocation) = ast.kind(modifier) {
                header.push_str(&format!(" {}({})", invocation.name, self.arguments(&invocation.arguments)));
            }
        }
        let returns = self.parameters(func.return_parameters);
        if !returns.is_empty() {
            header.push_str(&format!(" returns ({})", returns));
        }

        match func.body {
            Some(body) => {
                header.push_str(" {");
                self.line(&header);
                self.block_contents(body);
                self.line("}");
            }
            None => {
                header.push(';');
                self.line(&header);
            }
        }
    }

    fn parameters(&self, list: NodeId) -> String {
        let ast = self.ast;
        let NodeKind::ParameterList(list) = ast.kind(list) else {
            return String::new();
        };
        list.parameters
            .iter()
            .filter_map(|&param| match ast.kind(param) {
                NodeKind::Variable(var) if var.name.is_empty() => Some(var.ty.to_string()),
                NodeKind::Variable(var) => Some(format!("{} {}", var.ty, var.name)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn block_contents(&mut self, block: NodeId) {
        let ast = self.ast;
        let NodeKind::Block(block) = ast.kind(block) else {
            return;
        };
        self.indent += 1;
        for &stmt in &block.statements {
            self.statement(stmt);
        }
        self.indent -= 1;
    }

    fn statement(&mut self, node: NodeId) {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::Block(_) => {
                self.line("{");
                self.block_contents(node);
                self.line("}");
            }
            NodeKind::VariableDeclarationStatement(stmt) => {
                let declared: Vec<String> = stmt
                    .declarations
                    .iter()
                    .filter_map(|&decl| match ast.kind(decl) {
                        NodeKind::Variable(var) => Some(format!("{} {}", var.ty, var.name)),
                        _ => None,
                    })
                    .collect();
                let text = match stmt.initial_value {
                    Some(value) => format!("{} = {};", declared.join(", "), self.expression(value)),
                    None => format!("{};", declared.join(", ")),
                };
                self.line(&text);
            }
            NodeKind::ExpressionStatement(stmt) => {
                let text = format!("{};", self.expression(stmt.expression));
                self.line(&text);
            }
            NodeKind::If(stmt) => {
                let (condition, true_body, false_body) = (stmt.condition, stmt.true_body, stmt.false_body);
                let text = format!("if ({}) {{", self.expression(condition));
                self.line(&text);
                self.nested(true_body);
                if let Some(false_body) = false_body {
                    self.line("} else {");
                    self.nested(false_body);
                }
                self.line("}");
            }
            NodeKind::Return(ret) => {
                let text = match ret.expression {
                    Some(expr) => format!("return {};", self.expression(expr)),
                    None => "return;".to_string(),
                };
                self.line(&text);
            }
            _ => {}
        }
    }

    fn nested(&mut self, body: NodeId) {
        let ast = self.ast;
        if ast.tag(body) == NodeTag::Block {
            self.block_contents(body);
        } else {
            self.indent += 1;
            self.statement(body);
            self.indent -= 1;
        }
    }

    fn arguments(&self, arguments: &[NodeId]) -> String {
        arguments
            .iter()
            .map(|&arg| self.expression(arg))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn expression(&self, node: NodeId) -> String {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::Identifier(ident) => ident.name.clone(),
            NodeKind::Literal(lit) => lit.value.clone(),
            NodeKind::IndexAccess(access) => match access.index {
                Some(index) => format!("{}[{}]", self.expression(access.base), self.expression(index)),
                None => format!("{}[]", self.expression(access.base)),
            },
            NodeKind::FunctionCall(call) => {
                format!("{}({})", self.expression(call.callee), self.arguments(&call.arguments))
            }
            NodeKind::MemberAccess(access) => {
                format!("{}.{}", self.expression(access.expression), access.member_name)
            }
            NodeKind::BinaryOperation(op) => format!(
                "{} {} {}",
                self.operand(op.left),
                op.operator,
                self.operand(op.right)
            ),
            NodeKind::UnaryOperation(op) => format!("{}{}", op.operator, self.operand(op.operand)),
            NodeKind::Assignment(assign) => format!(
                "{} {} {}",
                self.expression(assign.lhs),
                assign.operator,
                self.expression(assign.rhs)
            ),
            _ => String::new(),
        }
    }

    fn operand(&self, node: NodeId) -> String {
        let ast = self.ast;
        match ast.tag(node) {
            NodeTag::BinaryOperation | NodeTag::Assignment => format!("({})", self.expression(node)),
            _ => self.expression(node),
        }
    }
}
