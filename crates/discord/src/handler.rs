//! Discord event handler for serenity.
//!
//! Feeds guild messages into the relay pipeline and answers slash commands.

use std::sync::Arc;

use {
    mediacopy_channels::GuildId,
    mediacopy_config::SettingsStore,
    mediacopy_relay::{BatchScheduler, Intake},
    serenity::{
        all::{
            ActivityData, Command as DiscordCommand, CommandInteraction, Context, EventHandler,
            GatewayIntents, Guild, GuildId as DiscordGuildId, Interaction, Message, Ready,
        },
        async_trait,
    },
    tracing::{debug, error, info, warn},
};

use crate::{
    DiscordGateway,
    commands::{CommandReply, execute},
    convert::inbound_message,
    interaction,
};

/// Handler for Discord gateway events.
pub struct MediaCopyHandler {
    pub scheduler: Arc<BatchScheduler>,
    pub settings: Arc<dyn SettingsStore>,
    pub gateway: Arc<DiscordGateway>,
    /// "Watching ..." status text; empty for none.
    pub activity: String,
    pub register_commands: bool,
}

impl MediaCopyHandler {
    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }

    async fn ensure_guild(&self, guild_id: DiscordGuildId) {
        if let Err(e) = self.settings.ensure(GuildId(guild_id.get())).await {
            warn!(guild_id = %guild_id, error = %e, "failed to initialise guild settings");
        }
    }

    async fn run_command(&self, command: &CommandInteraction) -> CommandReply {
        let Some(guild_id) = command.guild_id else {
            return CommandReply::error("This command can only be used in a server.");
        };
        let parsed = match interaction::parse(command) {
            Ok(parsed) => parsed,
            Err(message) => return CommandReply::error(message),
        };
        match execute(parsed, GuildId(guild_id.get()), self.settings.as_ref()).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(guild_id = %guild_id, command = parsed.name(), error = %e, "command failed");
                CommandReply::error("Could not save the settings, please try again.")
            },
        }
    }
}

#[async_trait]
impl EventHandler for MediaCopyHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
        self.gateway.attach(&ctx);

        for guild in &ready.guilds {
            self.ensure_guild(guild.id).await;
        }

        if self.register_commands {
            match DiscordCommand::set_global_commands(&ctx.http, interaction::definitions()).await
            {
                Ok(registered) => info!(count = registered.len(), "registered slash commands"),
                Err(e) => warn!(error = %e, "failed to register slash commands"),
            }
        }

        if !self.activity.is_empty() {
            ctx.set_activity(Some(ActivityData::watching(self.activity.clone())));
        }

        if self.scheduler.start() {
            info!(
                batch_delay_secs = self.scheduler.pipeline().batch_delay().as_secs(),
                "relay scheduler started"
            );
        }
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        debug!(guild_id = %guild.id, name = %guild.name, "guild available");
        self.ensure_guild(guild.id).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Cheap pre-filter; the pipeline checks again.
        if msg.author.bot || msg.guild_id.is_none() {
            return;
        }
        let channel_name = DiscordGateway::channel_name(&ctx.cache, msg.guild_id, msg.channel_id);
        let message_id = msg.id;
        let intake = self
            .scheduler
            .pipeline()
            .submit(inbound_message(&msg, channel_name))
            .await;
        if intake == Intake::Enqueued {
            debug!(message_id = %message_id, channel_id = %msg.channel_id, "message queued");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        let reply = self.run_command(&command).await;
        if let Err(e) = command
            .create_response(&ctx.http, interaction::response(&reply))
            .await
        {
            warn!(command = %command.data.name, error = %e, "failed to send command response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_cover_guild_messages() {
        let intents = MediaCopyHandler::intents();
        assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(intents.contains(GatewayIntents::GUILD_MESSAGES));
        assert!(!intents.contains(GatewayIntents::DIRECT_MESSAGES));
    }
}
