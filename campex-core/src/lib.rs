use mimalloc::MiMalloc;

pub mod engine;

pub use engine::prelude;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
