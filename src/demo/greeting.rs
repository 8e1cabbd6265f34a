//! Greeting form: submitted fields bound over the carried state.

use crate::app::Context;
use crate::target::Target;
use crate::utils::html::{escape, escape_attr};

/// Upper bound on repeated greetings.
pub const MAX_TIMES: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub name: String,
    pub times: u8,
}

impl Default for Greeting {
    fn default() -> Self {
        Self {
            name: String::new(),
            times: 1,
        }
    }
}

crate::bindable!(Greeting { name as "Name", times as "Times" });

pub fn greet(greeting: &mut Greeting, ctx: &Context<'_>) -> String {
    if let Some(err) = ctx.bind_errors().field("Times") {
        crate::debug!("action"; "greeting rejected: {}", err);
        ctx.error("times must be a whole number");
        return render(ctx, greeting, None);
    }
    let name = greeting.name.trim();
    if name.is_empty() {
        ctx.error("tell me your name first");
        return render(ctx, greeting, None);
    }
    if greeting.times == 0 || greeting.times > MAX_TIMES {
        ctx.error(&format!("times must be between 1 and {MAX_TIMES}"));
        return render(ctx, greeting, None);
    }

    let line = format!("Hello, {}!", escape(name));
    let lines = vec![line.as_str(); greeting.times as usize].join("<br>");
    ctx.success("greeted");
    render(ctx, greeting, Some(&lines))
}

fn panel(ctx: &Context<'_>) -> Target {
    Target::with_id(format!("{}-greeting", ctx.content_root())).outline()
}

pub fn render(ctx: &Context<'_>, greeting: &Greeting, output: Option<&str>) -> String {
    let panel = panel(ctx);
    let submit = ctx.submit(greeting, greet).swap(&panel);
    let output = output
        .map(|html| format!(r#"<p class="pw-greeting-output">{html}</p>"#))
        .unwrap_or_default();
    format!(
        concat!(
            r#"<form id="{panel}" class="pw-greeting" {submit}>"#,
            r#"<input name="Name" value="{name}" placeholder="name">"#,
            r#"<input name="Times" type="number" min="1" max="{max}" value="{times}">"#,
            r#"<button type="submit">greet</button>"#,
            "{output}</form>"
        ),
        panel = panel,
        submit = submit,
        name = escape_attr(&greeting.name),
        max = MAX_TIMES,
        times = greeting.times,
        output = output,
    )
}
