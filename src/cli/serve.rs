//! `patchwire serve`: mount the demo apps and block until Ctrl+C.

use anyhow::{Context, Result};

use crate::config::PatchwireConfig;
use crate::core::Runtime;
use crate::serve::Listener;
use crate::{demo, log};

/// Apps mounted by `serve`, as `(name, prefix)`.
const MOUNTS: &[(&str, &str)] = &[("main", "/"), ("second", "/second")];

pub fn serve(config: &PatchwireConfig) -> Result<()> {
    let runtime = Runtime::new(config.serve.runtime_workers)?;
    let listener = Listener::bind(config, &runtime)?;

    for &(name, prefix) in MOUNTS {
        listener
            .mount(prefix, demo::app(name, &runtime, config))
            .with_context(|| format!("failed to mount `{name}` at `{prefix}`"))?;
    }

    let result = listener.run();
    runtime.close();
    log!("serve"; "stopped");
    result
}
