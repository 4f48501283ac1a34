// Relay a direct message to a guild member on behalf of an allow-listed
// caller. Target resolution and image-URL detection are pure helpers so the
// lookup order stays testable.

use crate::discord::commands::{Context, Error};
use poise::serenity_prelude as serenity;

const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Send a DM to a member (restricted command).
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn dm(
    ctx: Context<'_>,
    #[description = "Member identifier (ID, mention, username#discrim, or name)"] target: String,
    #[description = "Message content"] message: String,
    #[description = "Optional image attachment to forward"] image: Option<serenity::Attachment>,
) -> Result<(), Error> {
    if let Some(allowed) = ctx.data().allowed_dm_user {
        if ctx.author().id != allowed {
            ctx.send(
                poise::CreateReply::default()
                    .content("You are not allowed to use this command.")
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    }

    // Keep the relayed content out of the channel when invoked by prefix.
    if let poise::Context::Prefix(prefix_ctx) = ctx {
        let _ = prefix_ctx.msg.delete(ctx.serenity_context()).await;
    }

    let candidates: Vec<MemberIdentity> = {
        let guild = ctx.guild().ok_or("Guild is not in the cache")?;
        guild
            .members
            .values()
            .map(|member| MemberIdentity {
                user_id: member.user.id,
                username: member.user.name.clone(),
                discriminator: member.user.discriminator.map(|d| d.get()),
                display_name: member.display_name().to_string(),
            })
            .collect()
    };

    let Some(resolved) = resolve_member(&target, &candidates) else {
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "Could not resolve target member: {target}. \
                     Use a mention, ID, or username#discrim."
                ))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    let reply = match send_dm(&ctx, resolved.user_id, &message, image.as_ref()).await {
        Ok(()) => format!("Sent DM to {}.", resolved.display_name),
        Err(e) => format!("Failed to send DM to {}: {e}", resolved.display_name),
    };
    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}

async fn send_dm(
    ctx: &Context<'_>,
    user_id: serenity::UserId,
    message: &str,
    image: Option<&serenity::Attachment>,
) -> Result<(), Error> {
    let builder = if let Some(attachment) = image {
        let file =
            serenity::CreateAttachment::url(&ctx.serenity_context().http, &attachment.url).await?;
        serenity::CreateMessage::new().content(message).add_file(file)
    } else if let Some(url) = find_image_url(message) {
        // Bare image links render as an embedded image instead of plain text.
        serenity::CreateMessage::new()
            .content(message)
            .embed(serenity::CreateEmbed::new().image(url))
    } else {
        serenity::CreateMessage::new().content(message)
    };

    let channel = user_id.create_dm_channel(ctx.serenity_context()).await?;
    channel.id.send_message(ctx.serenity_context(), builder).await?;
    Ok(())
}

struct MemberIdentity {
    user_id: serenity::UserId,
    username: String,
    discriminator: Option<u16>,
    display_name: String,
}

// Resolution order: mention or numeric id, then name#discriminator, then
// exact display name or username. First match wins.
fn resolve_member<'a>(target: &str, members: &'a [MemberIdentity]) -> Option<&'a MemberIdentity> {
    if let Some(id) = mention_or_id(target) {
        if let Some(member) = members.iter().find(|m| m.user_id.get() == id) {
            return Some(member);
        }
    }

    if let Some((name, discriminator)) = target.rsplit_once('#') {
        if let Ok(discriminator) = discriminator.parse::<u16>() {
            if let Some(member) = members
                .iter()
                .find(|m| m.username == name && m.discriminator == Some(discriminator))
            {
                return Some(member);
            }
        }
    }

    members
        .iter()
        .find(|m| m.display_name == target || m.username == target)
}

fn mention_or_id(target: &str) -> Option<u64> {
    if let Some(inner) = target.strip_prefix("<@").and_then(|s| s.strip_suffix('>')) {
        let digits: String = inner.chars().filter(char::is_ascii_digit).collect();
        return digits.parse().ok();
    }
    if !target.is_empty() && target.chars().all(|c| c.is_ascii_digit()) {
        return target.parse().ok();
    }
    None
}

fn find_image_url(message: &str) -> Option<&str> {
    message.split_whitespace().find(|token| {
        let lower = token.to_lowercase();
        (lower.starts_with("http://") || lower.starts_with("https://"))
            && IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn members() -> Vec<MemberIdentity> {
        vec![
            MemberIdentity {
                user_id: serenity::UserId::new(100),
                username: "alice".into(),
                discriminator: Some(1234),
                display_name: "Alice".into(),
            },
            MemberIdentity {
                user_id: serenity::UserId::new(200),
                username: "bob".into(),
                discriminator: None,
                display_name: "bobby".into(),
            },
        ]
    }

    #[test]
    fn resolves_mentions_and_numeric_ids_first() {
        let members = members();
        assert_eq!(resolve_member("<@100>", &members).unwrap().username, "alice");
        assert_eq!(resolve_member("<@!200>", &members).unwrap().username, "bob");
        assert_eq!(resolve_member("200", &members).unwrap().username, "bob");
    }

    #[test]
    fn resolves_name_and_discriminator() {
        let members = members();
        assert_eq!(
            resolve_member("alice#1234", &members).unwrap().user_id,
            serenity::UserId::new(100)
        );
        assert!(resolve_member("alice#9999", &members).is_none());
    }

    #[test]
    fn falls_back_to_display_name_or_username() {
        let members = members();
        assert_eq!(resolve_member("bobby", &members).unwrap().username, "bob");
        assert_eq!(resolve_member("alice", &members).unwrap().username, "alice");
        assert!(resolve_member("charlie", &members).is_none());
    }

    #[test]
    fn detects_image_urls_case_insensitively() {
        assert_eq!(
            find_image_url("look at https://example.com/cat.PNG please"),
            Some("https://example.com/cat.PNG")
        );
        assert_eq!(
            find_image_url("http://example.com/pic.jpeg"),
            Some("http://example.com/pic.jpeg")
        );
        assert_eq!(find_image_url("no links here"), None);
        assert_eq!(find_image_url("https://example.com/page.html"), None);
    }
}
