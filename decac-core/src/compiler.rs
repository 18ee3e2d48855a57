//! Per-file compiler instance
//!
//! A `DecacCompiler` owns every piece of state one compilation needs (symbol
//! table, type environment, scope arena, warnings). Instances share nothing,
//! so several files can be compiled on different threads.

use crate::codegen::{self, CodegenError};
use crate::context::{ContextualError, EnvironmentExp, EnvironmentType, Warning};
use crate::tools::SymbolTable;
use crate::tree::Program;
use crate::verify::Verifier;
use decac_config::{CompilerOptions, Phase, TargetBackend};
use decac_log::{debug, info, Logger};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{0}")]
    Contextual(#[from] ContextualError),

    #[error("{0}")]
    Codegen(#[from] CodegenError),
}

/// Assembly text for one source file
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub text: String,
    pub target: TargetBackend,
    pub warnings: Vec<Warning>,
}

/// How far the pipeline ran, per the stop-after options
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOutcome {
    /// Stop-after-parse: the tree as received
    Parsed(Program),
    /// Stop-after-verification: the decorated tree
    Verified {
        program: Program,
        warnings: Vec<Warning>,
    },
    Assembled(Assembly),
}

pub struct DecacCompiler {
    pub(crate) options: CompilerOptions,
    pub(crate) logger: Arc<Logger>,
    pub(crate) symbols: SymbolTable,
    pub(crate) env_types: EnvironmentType,
    pub(crate) scopes: EnvironmentExp,
    pub(crate) warnings: Vec<Warning>,
}

impl DecacCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self::with_logger(options, Logger::noop())
    }

    pub fn with_logger(options: CompilerOptions, logger: Arc<Logger>) -> Self {
        let mut symbols = SymbolTable::new();
        let mut scopes = EnvironmentExp::new();
        let env_types = EnvironmentType::new(&mut symbols, &mut scopes);
        DecacCompiler {
            options,
            logger,
            symbols,
            env_types,
            scopes,
            warnings: Vec::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn env_types(&self) -> &EnvironmentType {
        &self.env_types
    }

    pub fn scopes(&self) -> &EnvironmentExp {
        &self.scopes
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Record a warning if warnings are enabled
    pub(crate) fn warn(&mut self, warning: Warning) {
        if self.options.warnings {
            decac_log::warn!(self.logger, "{}", warning);
            self.warnings.push(warning);
        }
    }

    /// Run the three verification passes, decorating `program`
    pub fn verify(&mut self, program: &mut Program) -> Result<(), ContextualError> {
        let _phase = self.logger.enter_phase(Phase::Verify);
        Verifier::new(self).run(program)
    }

    /// Emit assembly for a verified program with the configured backend
    pub fn generate(&mut self, program: &Program) -> Result<String, CodegenError> {
        let _phase = self.logger.enter_phase(Phase::Codegen);
        match self.options.target {
            TargetBackend::Ima => codegen::ima::ImaGenerator::new(self).generate(program),
            TargetBackend::Arm => codegen::arm::ArmGenerator::new(self).generate(program),
        }
    }

    /// Whole pipeline, honouring stop-after-parse and stop-after-verification
    pub fn compile(&mut self, mut program: Program) -> Result<CompileOutcome, CompileError> {
        if self.options.parse_only {
            debug!(self.logger, "stopping after parse");
            return Ok(CompileOutcome::Parsed(program));
        }

        self.verify(&mut program)?;
        info!(
            self.logger,
            "verified {} classes, {} symbols",
            program.classes.len(),
            self.symbols.len()
        );
        if self.options.verification_only {
            return Ok(CompileOutcome::Verified {
                program,
                warnings: self.warnings.clone(),
            });
        }

        let text = self.generate(&program)?;
        Ok(CompileOutcome::Assembled(Assembly {
            text,
            target: self.options.target,
            warnings: self.warnings.clone(),
        }))
    }
}
