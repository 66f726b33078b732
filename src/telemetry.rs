/// Installs the log sink for the current platform. Call once at startup.
pub fn init() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("portfolio_web=info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    // tracing's `log` feature forwards events to the console logger.
    #[cfg(target_arch = "wasm32")]
    wasm_logger::init(wasm_logger::Config::default());
}
