//! Compilation unit driver
//!
//! Turns every class of a unit into definitions: the class itself, its
//! fields, and one declaration or definition per method.

use crate::ast::{ClassDef, ClassKind, CompilationUnit, MethodDef};
use crate::classify::{NameEncoder, QualifiedNames, StandardClassifier, TypeClassifier};
use crate::error::{LowerError, LowerResult};
use crate::ir::{Defn, DefnTable, IrType, Signature};
use crate::lower::Lowerer;
use crate::options::LowerOptions;

/// Lowers compilation units with a fixed pair of collaborators
pub struct Driver<'a> {
    classifier: &'a dyn TypeClassifier,
    names: &'a dyn NameEncoder,
    options: LowerOptions,
}

impl<'a> Driver<'a> {
    pub fn new(
        classifier: &'a dyn TypeClassifier,
        names: &'a dyn NameEncoder,
        options: LowerOptions,
    ) -> Self {
        Self {
            classifier,
            names,
            options,
        }
    }

    pub fn options(&self) -> &LowerOptions {
        &self.options
    }

    /// Lower every class of `unit`; the first failing method aborts the unit
    pub fn lower_unit(&self, unit: &CompilationUnit) -> LowerResult<DefnTable> {
        let jobs = self.options.jobs.max(1).min(unit.classes.len().max(1));
        tracing::debug!(classes = unit.classes.len(), jobs, "lowering compilation unit");

        let per_class = if jobs > 1 {
            self.lower_parallel(&unit.classes, jobs)
        } else {
            unit.classes.iter().map(|c| self.lower_class(c)).collect()
        };

        let mut table = DefnTable::new();
        for defns in per_class {
            table.extend(defns?);
        }

        if self.options.validate {
            table
                .validate()
                .map_err(|errors| LowerError::InvalidGraph { errors })?;
        }
        Ok(table)
    }

    /// Classes are dealt round-robin to `jobs` scoped threads and the results
    /// put back in source order
    fn lower_parallel(&self, classes: &[ClassDef], jobs: usize) -> Vec<LowerResult<Vec<Defn>>> {
        let mut indexed: Vec<(usize, LowerResult<Vec<Defn>>)> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..jobs)
                .map(|worker| {
                    scope.spawn(move || {
                        classes
                            .iter()
                            .enumerate()
                            .skip(worker)
                            .step_by(jobs)
                            .map(|(i, class)| (i, self.lower_class(class)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            workers
                .into_iter()
                .flat_map(|worker| match worker.join() {
                    Ok(results) => results,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });
        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, result)| result).collect()
    }

    /// Definitions of one class, class header first
    pub fn lower_class(&self, class: &ClassDef) -> LowerResult<Vec<Defn>> {
        let name = self.names.encode(&class.sym);
        let _span = tracing::debug_span!("class", name = %name).entered();

        let parent = class.parent.as_ref().map(|p| self.names.encode(p));
        let interfaces = class.interfaces.iter().map(|i| self.names.encode(i)).collect();
        let header = match class.kind {
            ClassKind::Class => Defn::Class {
                name: name.clone(),
                parent,
                interfaces,
            },
            ClassKind::Interface => Defn::Interface {
                name: name.clone(),
                interfaces,
            },
            ClassKind::Module => Defn::Module {
                name: name.clone(),
                parent,
                interfaces,
            },
        };

        let mut defns = vec![header];
        for field in class.fields() {
            defns.push(Defn::Field {
                name: self.names.encode(&field.sym),
                ty: self.classifier.classify(&field.ty),
                mutable: field.mutable,
            });
        }

        let owner = IrType::Class(name);
        for method in class.methods() {
            defns.push(self.lower_method(&owner, method)?);
        }
        Ok(defns)
    }

    fn lower_method(&self, owner: &IrType, method: &MethodDef) -> LowerResult<Defn> {
        let name = self.names.encode(&method.sym);
        let mut params = Vec::with_capacity(method.params.len() + 1);
        params.push(owner.clone());
        params.extend(method.params.iter().map(|p| self.classifier.classify(&p.ty)));
        let sig = Signature {
            params,
            ret: self.classifier.classify(&method.ret),
        };

        if method.body.is_none() || !self.options.selects(name.as_str()) {
            return Ok(Defn::Declare { name, sig });
        }

        let body = Lowerer::new(self.classifier, self.names)
            .lower_method(owner, method)
            .map_err(|source| LowerError::InMethod {
                method: name.clone(),
                source: Box::new(source),
            })?;
        Ok(Defn::Define { name, sig, body })
    }
}

/// Lower a unit with the default collaborators
pub fn lower_unit(unit: &CompilationUnit, options: LowerOptions) -> LowerResult<DefnTable> {
    Driver::new(&StandardClassifier, &QualifiedNames, options).lower_unit(unit)
}
