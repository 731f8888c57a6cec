use ctxkit::context::Context;
use ctxkit::init::init_tracing;
use ctxkit::log::{self, Field, TracingLogger};
use ctxkit::time;

#[derive(Debug)]
struct Order {
    id: i64,
    lines: Vec<&'static str>,
}

fn handle(ctx: &Context, order: &Order) -> Result<(), log::WriteError> {
    let ctx = log::with(&log::named(ctx, "orders"), vec![Field::int64("order", order.id)]);
    log::entry(
        &ctx,
        "received",
        &[
            Field::reflect("lines", order.lines.clone()),
            Field::stringer("at", time::now(&ctx)),
        ],
    )?;
    log::entry(&log::named(&ctx, "billing"), "charged", &[Field::int("cents", 1250)])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let ctx = log::using(&time::default(&Context::background()), TracingLogger::new());
    for id in 1..=3 {
        let order = Order {
            id,
            lines: vec!["bread", "butter"],
        };
        handle(&ctx, &order)?;
    }
    Ok(())
}
