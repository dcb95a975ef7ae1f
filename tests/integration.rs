#[path = "integration/common.rs"]
mod common;

#[path = "integration/registry_flow.rs"]
mod registry_flow;

#[path = "integration/history_log.rs"]
mod history_log;

#[path = "integration/launcher_spawn.rs"]
mod launcher_spawn;
