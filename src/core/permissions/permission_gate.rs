// The permission gate every privileged command consults before acting.
//
// Decision order matters and is fixed:
// 1. Administrator or Manage Guild authorizes unconditionally.
// 2. Otherwise, a configured mod role authorizes iff the caller holds it.
// 3. Otherwise deny - no mod role configured means non-admins are never
//    authorized (fails closed).

use crate::core::guild_config::GuildConfig;
use std::collections::HashSet;

/// Everything one authorization decision needs. Built per invocation from
/// platform-supplied caller attributes and the guild's config; never stored.
pub struct PermissionContext<'a> {
    pub is_administrator: bool,
    pub has_manage_guild: bool,
    pub caller_role_names: &'a HashSet<String>,
    pub config: &'a GuildConfig,
}

pub fn is_authorized(ctx: &PermissionContext<'_>) -> bool {
    if ctx.is_administrator || ctx.has_manage_guild {
        return true;
    }

    match ctx.config.mod_role.as_deref() {
        Some(mod_role) => ctx.caller_role_names.contains(mod_role),
        None => false,
    }
}

// ============================================================================
// TESTS
// ============================================================================
