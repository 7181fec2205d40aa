use std::sync::OnceLock;

static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

/// Shared multi-thread runtime; decode and encode work goes to its blocking pool.
pub fn rt() -> &'static tokio::runtime::Runtime {
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .thread_name("intake-worker")
            .enable_all()
            .build()
            .expect("tokio runtime")
    })
}
