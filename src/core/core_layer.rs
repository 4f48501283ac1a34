// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "guild_config/config_service.rs"]
pub mod guild_config;

#[path = "permissions/permission_gate.rs"]
pub mod permissions;

#[path = "dice/dice_roller.rs"]
pub mod dice;

#[path = "scheduler/delayed_task.rs"]
pub mod scheduler;

#[path = "monitor/monitor_service.rs"]
pub mod monitor;
