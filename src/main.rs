use aniparadise::run;

fn main() -> anyhow::Result<()> {
    // Load .env before reading any configuration
    dotenvy::dotenv().ok();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run())
}
