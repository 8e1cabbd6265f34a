//! Live fragments: a ticking clock and a deferred report.

use std::thread;
use std::time::Duration;

use crate::app::Context;
use crate::target::{SkeletonKind, Target};
use crate::utils::date::DateTimeUtc;

/// One hour of ticks at one per second.
pub const CLOCK_MAX_TICKS: u32 = 3600;

/// Simulated work behind the deferred report.
pub const REPORT_DELAY: Duration = Duration::from_millis(600);

fn clock_face() -> String {
    DateTimeUtc::now().to_clock_string()
}

/// Clock patched once a second until its element disappears.
pub fn clock(ctx: &Context<'_>) -> String {
    let face = Target::new();
    ctx.ticker(&face, Duration::from_secs(1), CLOCK_MAX_TICKS, |_| clock_face());
    format!(
        r#"<p class="pw-clock">UTC <time id="{face}">{}</time></p>"#,
        clock_face()
    )
}

/// Skeleton first; the list arrives over the push channel.
pub fn report(ctx: &Context<'_>) -> String {
    let session = ctx.session().to_string();
    ctx.defer(SkeletonKind::List, move || {
        thread::sleep(REPORT_DELAY);
        report_list(&session)
    })
}

fn report_list(session: &str) -> String {
    let rows = [
        ("session", session.to_string()),
        ("rendered", DateTimeUtc::now().to_rfc3339()),
        ("delay", format!("{} ms", REPORT_DELAY.as_millis())),
    ];
    let items: String = rows
        .iter()
        .map(|(k, v)| format!("<li><b>{k}</b> {v}</li>"))
        .collect();
    format!(r#"<ul class="pw-report">{items}</ul>"#)
}
