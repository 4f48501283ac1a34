// Translates platform-supplied caller state into the attributes the core
// permission gate consumes.

use crate::discord::commands::{Context, Error};
use poise::serenity_prelude as serenity;
use std::collections::HashSet;

pub struct CallerAttributes {
    pub is_administrator: bool,
    pub has_manage_guild: bool,
    pub role_names: HashSet<String>,
}

/// Caller attributes for one invocation. Interactions carry the member's
/// computed permissions; prefix messages fall back to folding role
/// permissions out of the cached guild.
pub async fn caller_attributes(ctx: &Context<'_>) -> Result<CallerAttributes, Error> {
    let member = ctx
        .author_member()
        .await
        .ok_or("This command only works in servers")?;
    let guild = ctx.guild().ok_or("Guild is not in the cache")?;

    let permissions = member
        .permissions
        .unwrap_or_else(|| fold_permissions(&guild, &member));
    let role_names = member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id).map(|role| role.name.clone()))
        .collect();

    Ok(CallerAttributes {
        is_administrator: permissions.administrator(),
        has_manage_guild: permissions.manage_guild(),
        role_names,
    })
}

// Owner gets everything; everyone else is the union of @everyone and their
// role permissions.
fn fold_permissions(guild: &serenity::Guild, member: &serenity::Member) -> serenity::Permissions {
    if member.user.id == guild.owner_id {
        return serenity::Permissions::all();
    }

    let everyone = serenity::RoleId::new(guild.id.get());
    let mut permissions = guild
        .roles
        .get(&everyone)
        .map(|role| role.permissions)
        .unwrap_or_else(serenity::Permissions::empty);
    for role_id in &member.roles {
        if let Some(role) = guild.roles.get(role_id) {
            permissions |= role.permissions;
        }
    }
    permissions
}
