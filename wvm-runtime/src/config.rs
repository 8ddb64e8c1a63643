//! Engine configuration.

use wvm_types::types::MAX_MEMORY_PAGES;

/// How function bodies are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpretMode {
    /// Always interpret; pre-compiled constructors are ignored.
    #[default]
    Pure,
    /// Honor a pre-compiled module's constructor when one is attached.
    CompiledIfPresent,
}

/// Tunables the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper cap, in 64 KiB pages, across all memory allocations and
    /// growth. Never exceeds the architectural 65536.
    pub memory_max_pages: u32,
    /// Execution mode.
    pub interpret_mode: InterpretMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_max_pages: MAX_MEMORY_PAGES,
            interpret_mode: InterpretMode::Pure,
        }
    }
}
