//! Program layout for the stack machine
//!
//! ```text
//! TSTO / BOV stack_overflow      ; skipped with -n
//! ADDSP #(tables + main variables)
//! method tables from 1(GB)
//! main block, HALT
//! code.Object.equals
//! per class: init.<C>, code.<C>.<m>...
//! runtime error handlers
//! ```

use super::{stack_need, Ima, Operand, Reg, FIRST_POOL_REGISTER, R0, R1};
use crate::codegen::{
    CodegenError, CodegenResult, ErrorManager, Label, LabelFactory, MethodTableLayout, Program,
    RegisterPool, RuntimeError, StackLocations, StackSlot,
};
use crate::compiler::DecacCompiler;
use crate::context::{ExpDefinition, Type};
use crate::tools::Symbol;
use crate::tree::{DeclClass, DeclField, DeclMethod, DeclVar, Ident, Main, MethodBody, Program as Tree};
use decac_log::{debug, trace};
use std::sync::Arc;

pub struct ImaGenerator<'c> {
    pub(super) compiler: &'c mut DecacCompiler,
    pub(super) program: Program<Ima>,
    pub(super) pool: RegisterPool,
    pub(super) labels: LabelFactory,
    pub(super) errors: ErrorManager,
    pub(super) locations: StackLocations,
    pub(super) tables: MethodTableLayout,
    /// Exit label of the method being generated
    pub(super) method_end: Option<Label>,
    register_limit: u8,
}

impl<'c> ImaGenerator<'c> {
    pub fn new(compiler: &'c mut DecacCompiler) -> Self {
        let register_limit = compiler.options.register_count();
        let no_check = compiler.options.no_check;
        let logger = Arc::clone(&compiler.logger);
        ImaGenerator {
            compiler,
            program: Program::new(),
            pool: RegisterPool::new(FIRST_POOL_REGISTER, register_limit),
            labels: LabelFactory::new(),
            errors: ErrorManager::new(no_check, logger),
            locations: StackLocations::new(),
            tables: MethodTableLayout::default(),
            method_end: None,
            register_limit,
        }
    }

    pub fn generate(mut self, tree: &Tree) -> CodegenResult<String> {
        let classes = tree
            .classes
            .iter()
            .map(|class| self.symbol(&class.name))
            .collect::<CodegenResult<Vec<_>>>()?;
        self.tables = MethodTableLayout::build(self.compiler, &classes)?;

        let tables_size = self.tables.size();
        self.locations.enter_scope();
        let main_code = self.buffered(|gen| gen.main_block(&tree.main, tables_size))?;
        self.locations.exit_scope();
        let globals = tables_size as u32 + tree.main.vars.len() as u32;

        let mut out = Program::new();
        out.comment("Main program");
        if let Some(overflow) = self.errors.check_label(RuntimeError::StackOverflow) {
            let need = globals + stack_need(&main_code.instructions().collect::<Vec<_>>());
            out.add(Ima::Tsto(need));
            out.add(Ima::Bov(overflow));
        }
        if globals > 0 {
            out.add(Ima::AddSp(globals));
        }
        self.emit_method_tables(&mut out);
        out.comment("Main block");
        out.append(main_code);
        out.add(Ima::Halt);

        self.emit_object_equals(&mut out);
        for (decl, class) in tree.classes.iter().zip(classes) {
            let code = self.class_code(decl, class)?;
            out.append(code);
        }
        self.emit_error_handlers(&mut out);

        debug!(self.compiler.logger, "{} IMA lines emitted", out.len());
        Ok(out.to_string())
    }

    pub(super) fn symbol(&self, ident: &Ident) -> CodegenResult<Symbol> {
        self.compiler
            .symbols
            .lookup(&ident.name)
            .map_err(|e| CodegenError::Internal(e.to_string()))
    }

    pub(super) fn definition<'i>(&self, ident: &'i Ident) -> CodegenResult<&'i ExpDefinition> {
        ident.exp_definition().ok_or_else(|| {
            CodegenError::Internal(format!("'{}' was not decorated", ident.name))
        })
    }

    pub(super) fn slot_of(&self, ident: &Ident) -> CodegenResult<StackSlot> {
        let symbol = self.symbol(ident)?;
        self.locations.get(symbol).ok_or_else(|| {
            CodegenError::Internal(format!("no stack slot for '{}'", ident.name))
        })
    }

    pub(super) fn table_address(&self, class: Symbol) -> CodegenResult<i32> {
        self.tables.address(class).ok_or_else(|| {
            CodegenError::Internal(format!(
                "no method table for '{}'",
                self.compiler.symbols.name(class)
            ))
        })
    }

    /// Run `f` against an empty buffer and hand back what it emitted
    pub(super) fn buffered(
        &mut self,
        f: impl FnOnce(&mut Self) -> CodegenResult<()>,
    ) -> CodegenResult<Program<Ima>> {
        let outer = std::mem::take(&mut self.program);
        let result = f(self);
        let inner = std::mem::replace(&mut self.program, outer);
        result.map(|()| inner)
    }

    fn main_block(&mut self, main: &Main, globals_base: i32) -> CodegenResult<()> {
        self.declare_locals(&main.vars, |i| StackSlot::global(globals_base + i))?;
        self.insts(&main.insts)
    }

    /// Initialise and bind variables; a variable is bound after its own
    /// initializer, which cannot see it
    fn declare_locals(
        &mut self,
        vars: &[DeclVar],
        slot_for: impl Fn(i32) -> StackSlot,
    ) -> CodegenResult<()> {
        for (i, var) in vars.iter().enumerate() {
            let slot = slot_for(i as i32 + 1);
            if let Some(init) = &var.init {
                let r = self.acquire();
                self.expr(init, r)?;
                self.program.add(Ima::Store(Reg::R(r), Operand::slot(slot)));
                self.release(r);
            }
            let symbol = self.symbol(&var.name)?;
            self.locations.bind(symbol, slot);
        }
        Ok(())
    }

    fn emit_method_tables(&self, out: &mut Program<Ima>) {
        out.comment("Method tables");
        for table in self.tables.tables() {
            let superclass = match table.superclass {
                Some(address) => Ima::Lea(Operand::Indirect(address, Reg::GB), R0),
                None => Ima::Load(Operand::Null, R0),
            };
            out.add_commented(
                superclass,
                format!("table of {}", self.compiler.symbols.name(table.class)),
            );
            out.add(Ima::Store(R0, Operand::Indirect(table.address, Reg::GB)));
            for (i, label) in table.slots.iter().enumerate() {
                let label = Label::new(self.compiler.symbols.name(*label));
                out.add(Ima::Load(Operand::Label(label), R0));
                out.add(Ima::Store(
                    R0,
                    Operand::Indirect(table.address + i as i32 + 1, Reg::GB),
                ));
            }
        }
    }

    fn emit_object_equals(&mut self, out: &mut Program<Ima>) {
        let object = self.compiler.env_types.object();
        let equals = self.compiler.env_types.equals_method();
        let label = self.compiler.symbols.method_label(object, equals);
        out.comment("class Object");
        out.label(Label::new(self.compiler.symbols.name(label)));
        out.add(Ima::Load(Operand::Indirect(-2, Reg::LB), R0));
        out.add(Ima::Cmp(Operand::Indirect(-3, Reg::LB), R0));
        out.add(Ima::Set(super::Cond::Eq, R0));
        out.add(Ima::Rts);
    }

    fn emit_error_handlers(&self, out: &mut Program<Ima>) {
        if self.errors.requested().is_empty() {
            return;
        }
        out.comment("Runtime errors");
        for kind in self.errors.requested() {
            out.label(Label::new(kind.label_name()));
            out.add(Ima::Wstr(kind.message().into()));
            out.add(Ima::Wnl);
            out.add(Ima::Error);
        }
    }

    fn class_code(&mut self, decl: &DeclClass, class: Symbol) -> CodegenResult<Program<Ima>> {
        let mut code = Program::new();
        code.comment(format!("class {}", decl.name.name));
        let init = Label::new(format!("init.{}", decl.name.name));
        code.append(self.method_frame(init, 0, false, |gen| gen.init_body(decl, class))?);
        for method in &decl.methods {
            code.append(self.method_code(class, method)?);
        }
        Ok(code)
    }

    fn field_index(&self, field: &DeclField) -> CodegenResult<i32> {
        self.definition(&field.name)?
            .as_field()
            .map(|def| def.index as i32)
            .ok_or_else(|| CodegenError::Internal(format!("'{}' is not a field", field.name.name)))
    }

    /// Default every own field, run the superclass init, then the
    /// explicit initializers
    fn init_body(&mut self, decl: &DeclClass, class: Symbol) -> CodegenResult<()> {
        for field in &decl.fields {
            let default = match field.ty.type_definition() {
                Some(Type::Float) => Operand::Float(0.0),
                Some(Type::Class(_)) => Operand::Null,
                _ => Operand::Int(0),
            };
            let index = self.field_index(field)?;
            self.program.add(Ima::Load(default, R0));
            self.program.add(Ima::Load(Operand::Indirect(-2, Reg::LB), R1));
            self.program.add(Ima::Store(R0, Operand::Indirect(index, R1)));
        }

        let superclass = self
            .compiler
            .env_types
            .class(class)
            .and_then(|def| def.superclass)
            .and_then(|sup| self.compiler.env_types.class(sup))
            .filter(|sup| sup.number_of_fields > 0)
            .map(|sup| sup.name);
        if let Some(sup) = superclass {
            let label = Label::new(format!("init.{}", self.compiler.symbols.name(sup)));
            self.program.add(Ima::Load(Operand::Indirect(-2, Reg::LB), R0));
            self.program.add(Ima::Push(R0));
            self.program.add(Ima::Bsr(Operand::Label(label)));
            self.program.add(Ima::SubSp(1));
        }

        for field in &decl.fields {
            if let Some(init) = &field.init {
                let index = self.field_index(field)?;
                let r = self.acquire();
                self.expr(init, r)?;
                self.program.add(Ima::Load(Operand::Indirect(-2, Reg::LB), R1));
                self.program.add(Ima::Store(Reg::R(r), Operand::Indirect(index, R1)));
                self.release(r);
            }
        }
        Ok(())
    }

    fn method_code(&mut self, class: Symbol, method: &DeclMethod) -> CodegenResult<Program<Ima>> {
        let name = self.symbol(&method.name)?;
        let label_symbol = self.compiler.symbols.method_label(class, name);
        let label = Label::new(self.compiler.symbols.name(label_symbol));
        trace!(self.compiler.logger, "generating {}", label);

        let (vars, insts) = match &method.body {
            MethodBody::Asm { code } => {
                let mut program = Program::new();
                program.label(label);
                program.raw(code.clone());
                return Ok(program);
            }
            MethodBody::Block { vars, insts } => (vars, insts),
        };

        self.locations.enter_scope();
        for (i, param) in method.params.iter().enumerate() {
            let symbol = self.symbol(&param.name)?;
            self.locations.bind(symbol, StackSlot::local(-3 - i as i32));
        }
        let returns = !method
            .return_type
            .type_definition()
            .unwrap_or(Type::Void)
            .is_void();
        let code = self.method_frame(label, vars.len() as u32, returns, |gen| {
            gen.declare_locals(vars, StackSlot::local)?;
            gen.insts(insts)
        });
        self.locations.exit_scope();
        code
    }

    /// Wrap a body with its stack check, local area and register saves
    fn method_frame(
        &mut self,
        label: Label,
        locals: u32,
        returns: bool,
        body: impl FnOnce(&mut Self) -> CodegenResult<()>,
    ) -> CodegenResult<Program<Ima>> {
        let end = Label::new(format!("fin.{label}"));
        let outer_pool = std::mem::replace(
            &mut self.pool,
            RegisterPool::new(FIRST_POOL_REGISTER, self.register_limit),
        );
        let outer_end = self.method_end.replace(end.clone());
        let body = self.buffered(body);
        let pool = std::mem::replace(&mut self.pool, outer_pool);
        self.method_end = outer_end;
        let mut body = body?;

        if returns {
            if let Some(missing) = self.errors.check_label(RuntimeError::MissingReturn) {
                body.add(Ima::Bra(missing));
            }
        }

        let saved = pool.used_registers();
        let mut frame = Program::new();
        frame.label(label);
        if let Some(overflow) = self.errors.check_label(RuntimeError::StackOverflow) {
            let need = stack_need(&body.instructions().collect::<Vec<_>>())
                + saved.len() as u32
                + locals;
            frame.add(Ima::Tsto(need));
            frame.add(Ima::Bov(overflow));
        }
        if locals > 0 {
            frame.add(Ima::AddSp(locals));
        }
        for r in &saved {
            frame.add(Ima::Push(Reg::R(*r)));
        }
        frame.append(body);
        frame.label(end);
        for r in saved.iter().rev() {
            frame.add(Ima::Pop(Reg::R(*r)));
        }
        frame.add(Ima::Rts);
        Ok(frame)
    }
}
