use crate::flags::{display_value, Flag};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/// Show the flags this server can set and their current values
#[poise::command(slash_command, guild_only)]
pub async fn flags(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;
    let settings = ctx.data().settings.list(&guild_id.to_string());

    let mut embed = serenity::CreateEmbed::new()
        .title("⚙️ Server Flags")
        .description("Change them in chat with `--setFlag=\"name: value\"`, `--removeFlag=\"name\"` or `--setPersonality <text>`.")
        .color(0x5865F2);

    for flag in Flag::ALL {
        let current = settings
            .get(flag.name())
            .map(|v| format!("`{}`", display_value(v)))
            .unwrap_or_else(|| "not set".to_string());
        embed = embed.field(
            format!("{} ({})", flag.name(), flag.kind()),
            format!("{}\nCurrent: {}", flag.description(), current),
            false,
        );
    }

    let personality = if settings.contains_key(crate::flags::PERSONALITY_KEY) {
        "Set"
    } else {
        "Not set"
    };
    embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
        "Personality: {}",
        personality
    )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
