//! The Registry - schema lookup by ID.

use crate::{Module, Namespace, RegistryError};
use std::collections::HashMap;
use tessera_core::{ModuleId, NamespaceId};

/// The Registry provides lookup of namespaces and module definitions.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    namespaces: HashMap<NamespaceId, Namespace>,
    modules: HashMap<ModuleId, Module>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a namespace.
    pub fn add_namespace(&mut self, namespace: Namespace) -> &mut Self {
        self.namespaces.insert(namespace.id, namespace);
        self
    }

    /// Register (or replace) a module.
    pub fn add_module(&mut self, module: Module) -> &mut Self {
        self.modules.insert(module.id, module);
        self
    }

    pub fn namespace(&self, id: NamespaceId) -> Option<&Namespace> {
        self.namespaces.get(&id)
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    /// Resolve a module together with its namespace.
    ///
    /// The module must belong to the namespace.
    pub fn module_with_namespace(
        &self,
        namespace_id: NamespaceId,
        module_id: ModuleId,
    ) -> Result<(&Namespace, &Module), RegistryError> {
        let namespace = self
            .namespace(namespace_id)
            .ok_or(RegistryError::NamespaceNotFound(namespace_id))?;
        let module = self
            .module(module_id)
            .filter(|m| m.namespace_id == namespace_id)
            .ok_or(RegistryError::ModuleNotFound(module_id))?;
        Ok((namespace, module))
    }

    /// Get the number of modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}
