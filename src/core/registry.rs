//! Build-time symbol registry.
//!
//! Modules register their symbols with [`export_symbol!`](crate::export_symbol),
//! which submits them to `inventory`. A symbol only becomes resolvable once an
//! archive for its module is on the module path, or, for built-in symbols,
//! through the launcher's own scope.

use crate::domain::model::{ModuleLocation, Symbol};
use crate::domain::ports::SymbolScope;

inventory::collect!(Symbol);

/// Registers a symbol with the linked registry.
///
/// ```ignore
/// modloader::export_symbol!(module = "greeter", name = "app.Greeter", main = run);
/// ```
///
/// Leave out `module` for a symbol built into the launcher itself. Extra
/// methods are listed as `name => path` pairs after `main`.
#[macro_export]
macro_rules! export_symbol {
    (module = $module:expr, name = $name:expr, main = $main:path $(, $method:literal => $func:path)* $(,)?) => {
        const _: () = {
            const METHODS: &[$crate::Method] = &[
                $crate::Method::new($crate::MAIN_METHOD, $main),
                $($crate::Method::new($method, $func),)*
            ];

            $crate::inventory::submit! {
                $crate::Symbol::new($module, $name, METHODS)
            }
        };
    };
    (name = $name:expr, main = $main:path $(, $method:literal => $func:path)* $(,)?) => {
        $crate::export_symbol!(module = "", name = $name, main = $main $(, $method => $func)*);
    };
}

#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    symbols: Vec<Symbol>,
}

impl SymbolRegistry {
    /// Every symbol submitted anywhere in the final binary.
    pub fn linked() -> Self {
        let symbols: Vec<Symbol> = inventory::iter::<Symbol>.into_iter().copied().collect();
        tracing::debug!("Linked registry holds {} symbols", symbols.len());
        Self { symbols }
    }

    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The symbol `name` as exported by the module stored at `location`.
    pub fn find_in_module(&self, location: &ModuleLocation, name: &str) -> Option<Symbol> {
        let module = location.module_name();
        self.symbols
            .iter()
            .find(|s| !s.is_builtin() && s.module == module && s.name == name)
            .copied()
    }

    pub fn find_builtin(&self, name: &str) -> Option<Symbol> {
        self.symbols
            .iter()
            .find(|s| s.is_builtin() && s.name == name)
            .copied()
    }
}

/// Scope of the launcher binary itself: built-in symbols only.
#[derive(Debug, Clone)]
pub struct RegistryScope {
    registry: SymbolRegistry,
}

impl RegistryScope {
    pub fn new(registry: SymbolRegistry) -> Self {
        Self { registry }
    }
}

impl SymbolScope for RegistryScope {
    fn scope_name(&self) -> &str {
        "bootstrap"
    }

    fn find_symbol(&self, name: &str) -> Option<Symbol> {
        self.registry.find_builtin(name)
    }
}

/// The platform root scope. Nothing resolves here; it only terminates the
/// delegation chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootScope;

impl SymbolScope for RootScope {
    fn scope_name(&self) -> &str {
        "system"
    }

    fn find_symbol(&self, _name: &str) -> Option<Symbol> {
        None
    }
}
