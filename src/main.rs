use anyhow::Result;
use toy_rasterizer::{init, renderer, Config};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let mut context = init(Config::default());
    renderer::run_all(&mut context)?;
    Ok(())
}
