use crate::config::DISCORD_MESSAGE_LIMIT;
use crate::conversation::{Conversation, Plan};
use crate::discord_text::{mention_names, split_message, to_chat_message, GuildDirectory};
use crate::formatter::ChatMessage;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use tracing::{debug, error, info};

/// Whether `message` is addressed to the bot: a DM, a mention, or a reply to
/// one of its messages. Bot authors never trigger a response.
pub fn is_addressed_to_bot(message: &serenity::Message, bot_id: u64) -> bool {
    if message.author.bot || message.author.id.get() == bot_id {
        return false;
    }

    let is_reply_to_bot = message
        .referenced_message
        .as_deref()
        .is_some_and(|referenced| referenced.author.id.get() == bot_id);

    message.guild_id.is_none()
        || is_reply_to_bot
        || message.mentions.iter().any(|user| user.id.get() == bot_id)
}

/// Handle a message addressed to the bot.
pub async fn handle_message(
    ctx: &serenity::Context,
    new_message: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    info!(
        "Handling message from {} in channel {}",
        new_message.author.name, new_message.channel_id
    );

    let community_id = new_message.guild_id.map(|id| id.to_string());
    let community_id = community_id.as_deref();
    let conversation = Conversation::new(data.settings.as_ref(), &data.config, data.bot_id);

    let plan = match conversation.plan(community_id, &new_message.content) {
        Plan::CommandReply(reply) => {
            send_reply(&ctx.http, new_message, &reply).await?;
            return Ok(());
        }
        // Avoid noisy replies when someone only pings the bot.
        Plan::Ignore => return Ok(()),
        Plan::Respond(plan) => plan,
    };

    let typing = new_message.channel_id.start_typing(&ctx.http);

    let history = fetch_history(ctx, new_message, plan.context_size).await;
    // History fetched over HTTP has no guild id of its own.
    let directory = GuildDirectory::from_cache(
        &ctx.cache,
        new_message.guild_id,
        std::iter::once(new_message).chain(&history),
    );
    let mut names = mention_names(new_message, &directory);
    for message in &history {
        names.extend(mention_names(message, &directory));
    }
    let history: Vec<ChatMessage> = history
        .iter()
        .map(|message| to_chat_message(message, &directory))
        .collect();

    let mut current = to_chat_message(new_message, &directory);
    current.content = plan.text.clone();

    let response = match conversation
        .respond(
            data.llm_client.as_ref(),
            community_id,
            &plan,
            &history,
            &current,
            &names,
        )
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!("LLM error handling message: {}", e);
            format!("❌ Assistant Error: {}", e)
        }
    };

    drop(typing);

    send_reply(&ctx.http, new_message, &response).await?;
    info!(
        "Assistant reply sent to {} in channel {}",
        new_message.author.name, new_message.channel_id
    );

    Ok(())
}

/// Messages before `message`, oldest first. Fetch failures produce an empty
/// history rather than aborting the reply.
async fn fetch_history(
    ctx: &serenity::Context,
    message: &serenity::Message,
    limit: usize,
) -> Vec<serenity::Message> {
    let limit = limit.clamp(1, 100) as u8;
    let request = serenity::GetMessages::new().before(message.id).limit(limit);

    match message.channel_id.messages(ctx, request).await {
        Ok(mut messages) => {
            // The API returns newest first.
            messages.reverse();
            debug!(
                "Fetched {} history messages for channel {}",
                messages.len(),
                message.channel_id
            );
            messages
        }
        Err(e) => {
            error!(
                "Failed to fetch history for channel {}: {}",
                message.channel_id, e
            );
            Vec::new()
        }
    }
}

/// Sends `content` in Discord-sized chunks, the first one as a reply.
async fn send_reply(
    http: &serenity::Http,
    original: &serenity::Message,
    content: &str,
) -> Result<(), Error> {
    for (i, chunk) in split_message(content, DISCORD_MESSAGE_LIMIT)
        .into_iter()
        .enumerate()
    {
        let mut builder = serenity::CreateMessage::new()
            .content(chunk)
            .allowed_mentions(serenity::CreateAllowedMentions::new());
        if i == 0 {
            builder = builder.reference_message(original);
        }
        original.channel_id.send_message(http, builder).await?;
    }
    Ok(())
}
