//! Demo app served by `patchwire serve`.
//!
//! One page exercising each moving part: a counter whose state travels with
//! its buttons, a clock ticker, a deferred report and a bound form.

mod counter;
mod greeting;
mod live;

use crate::app::{App, Context};
use crate::config::PatchwireConfig;
use crate::core::Runtime;
use crate::utils::html::escape;

use counter::Counter;
use greeting::Greeting;

/// Build a demo instance named `name`.
pub fn app(name: &str, runtime: &Runtime, config: &PatchwireConfig) -> App {
    App::builder(name)
        .title(format!("patchwire: {name}"))
        .page("/", home)
        .build(runtime, config)
}

fn home(ctx: &Context<'_>) -> String {
    let start = ctx
        .items()
        .iter()
        .find(|item| item.name == "start")
        .and_then(|item| item.value.parse::<i64>().ok())
        .unwrap_or(0)
        .max(0);

    [
        format!("<h1>{}</h1>", escape(ctx.app().title())),
        section("Counter", counter::render(ctx, &Counter { count: start })),
        section("Clock", live::clock(ctx)),
        section("Report", live::report(ctx)),
        section("Greeting", greeting::render(ctx, &Greeting::default(), None)),
    ]
    .concat()
}

fn section(heading: &str, body: String) -> String {
    format!(r#"<section class="pw-demo"><h2>{heading}</h2>{body}</section>"#)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_app_on;
    use crate::serve::HttpRequest;
    use tiny_http::Method;

    #[test]
    fn test_home_renders_every_section() {
        let runtime = Runtime::new(1).unwrap();
        let app = app("home", &runtime, &PatchwireConfig::default());

        let resp = app.handle(&HttpRequest::new(Method::Get, "/?start=4"), "/");
        assert_eq!(resp.status, 200);
        let html = resp.text();
        assert!(html.contains("<h1>patchwire: home</h1>"));
        assert!(html.contains(r#"<span class="pw-count">4</span>"#));
        assert!(html.contains("pw-clock"));
        assert!(html.contains("pw-skeleton-list"));
        assert!(html.contains(r#"<form id=""#));
        runtime.close();
    }

    #[test]
    fn test_negative_start_is_clamped() {
        let runtime = Runtime::new(1).unwrap();
        let app = test_app_on("clamp", &runtime);
        let ctx = Context::new(&app, crate::app::test_tab(&app).1, Vec::new(), None);
        let html = counter::render(&ctx, &Counter { count: 0 });
        assert!(html.contains(r#"<span class="pw-count">0</span>"#));

        let demo = super::app("clamp-home", &runtime, &PatchwireConfig::default());
        let resp = demo.handle(&HttpRequest::new(Method::Get, "/?start=-3"), "/");
        assert!(resp.text().contains(r#"<span class="pw-count">0</span>"#));
        runtime.close();
    }
}
