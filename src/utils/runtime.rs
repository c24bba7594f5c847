use std::sync::OnceLock;

use tokio::runtime::Runtime;

/// Shared runtime for the blocking convenience wrappers around the async
/// loading paths. Built on first use.
pub(crate) fn loader_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create effigy loader runtime"))
}
