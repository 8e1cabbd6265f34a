//! Counter: state carried through the client and bound back per click.

use crate::app::Context;
use crate::target::Target;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counter {
    pub count: i64,
}

crate::bindable!(Counter { count as "Count" });

pub fn increment(counter: &mut Counter, ctx: &Context<'_>) -> String {
    counter.count = counter.count.saturating_add(1);
    render(ctx, counter)
}

/// Clamps at zero.
pub fn decrement(counter: &mut Counter, ctx: &Context<'_>) -> String {
    if counter.count <= 0 {
        counter.count = 0;
        ctx.info("the counter stops at zero");
    } else {
        counter.count -= 1;
    }
    render(ctx, counter)
}

fn panel(ctx: &Context<'_>) -> Target {
    Target::with_id(format!("{}-counter", ctx.content_root())).outline()
}

pub fn render(ctx: &Context<'_>, counter: &Counter) -> String {
    let panel = panel(ctx);
    let minus = ctx.call(counter, decrement).swap(&panel);
    let plus = ctx.call(counter, increment).swap(&panel);
    format!(
        r#"<div id="{panel}" class="pw-counter"><button {minus}>-</button><span class="pw-count">{}</span><button {plus}>+</button></div>"#,
        counter.count
    )
}
