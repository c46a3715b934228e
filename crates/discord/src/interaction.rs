//! Slash-command registration, parsing and reply rendering.

use {
    mediacopy_channels::ChannelId,
    serenity::all::{
        ChannelType, CommandInteraction, CommandOptionType, CreateCommand, CreateCommandOption,
        CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage, Permissions,
        ResolvedOption, ResolvedValue,
    },
};

use crate::commands::{Command, CommandReply};

const CHANNEL_OPTION: &str = "channel";
const ENABLED_OPTION: &str = "enabled";

fn channel_option(description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Channel, CHANNEL_OPTION, description)
        .channel_types(vec![ChannelType::Text, ChannelType::News])
        .required(true)
}

fn channel_subcommand(name: &str, description: &str, option: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::SubCommand, name, description)
        .add_sub_option(channel_option(option))
}

fn admin(command: CreateCommand) -> CreateCommand {
    command
        .default_member_permissions(Permissions::MANAGE_CHANNELS)
        .dm_permission(false)
}

/// Global command definitions.
#[must_use]
pub fn definitions() -> Vec<CreateCommand> {
    vec![
        admin(
            CreateCommand::new("setup")
                .description("Set the channel where media will be copied to")
                .add_option(channel_option("The channel to copy media to")),
        ),
        admin(
            CreateCommand::new("monitor")
                .description("Manage monitored channels")
                .add_option(channel_subcommand(
                    "add",
                    "Add a channel to monitor for media",
                    "The channel to monitor",
                ))
                .add_option(channel_subcommand(
                    "remove",
                    "Stop monitoring a channel",
                    "The channel to stop monitoring",
                ))
                .add_option(channel_subcommand(
                    "exclude",
                    "Exclude a channel when monitoring all channels",
                    "The channel to exclude",
                ))
                .add_option(channel_subcommand(
                    "include",
                    "Remove a channel from the exclusion list",
                    "The channel to include again",
                ))
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "all",
                        "Toggle monitoring all channels",
                    )
                    .add_sub_option(CreateCommandOption::new(
                        CommandOptionType::Boolean,
                        ENABLED_OPTION,
                        "Enable or disable; omit to toggle",
                    )),
                )
                .add_option(CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "list",
                    "Show monitored channels and configuration",
                )),
        ),
        admin(
            CreateCommand::new("toggle_author")
                .description("Toggle whether to show who posted the media"),
        ),
        CreateCommand::new("help")
            .description("Show help for the media copy bot")
            .dm_permission(false),
    ]
}

/// Option value, stripped of serenity's borrowed types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OptionValue {
    Channel(ChannelId),
    Boolean(bool),
    Other,
}

fn flatten(options: &[ResolvedOption<'_>]) -> (Option<String>, Vec<(String, OptionValue)>) {
    let mut subcommand = None;
    let mut values = Vec::new();
    for option in options {
        match &option.value {
            ResolvedValue::SubCommand(nested) => {
                subcommand = Some(option.name.to_string());
                values.extend(flatten(nested).1);
            },
            ResolvedValue::Channel(channel) => values.push((
                option.name.to_string(),
                OptionValue::Channel(ChannelId(channel.id.get())),
            )),
            ResolvedValue::Boolean(b) => {
                values.push((option.name.to_string(), OptionValue::Boolean(*b)))
            },
            _ => values.push((option.name.to_string(), OptionValue::Other)),
        }
    }
    (subcommand, values)
}

/// Map a command name, optional subcommand and its options to a [`Command`].
pub(crate) fn command_from_options(
    name: &str,
    subcommand: Option<&str>,
    options: &[(String, OptionValue)],
) -> Result<Command, String> {
    let channel = || {
        options
            .iter()
            .find_map(|(n, v)| match v {
                OptionValue::Channel(id) if n == CHANNEL_OPTION => Some(*id),
                _ => None,
            })
            .ok_or_else(|| "Please choose a channel.".to_string())
    };
    let command = match (name, subcommand) {
        ("setup", _) => Command::Setup {
            channel: channel()?,
        },
        ("monitor", Some("add")) => Command::MonitorAdd {
            channel: channel()?,
        },
        ("monitor", Some("remove")) => Command::MonitorRemove {
            channel: channel()?,
        },
        ("monitor", Some("exclude")) => Command::MonitorExclude {
            channel: channel()?,
        },
        ("monitor", Some("include")) => Command::MonitorInclude {
            channel: channel()?,
        },
        ("monitor", Some("all")) => Command::MonitorAll {
            enabled: options.iter().find_map(|(n, v)| match v {
                OptionValue::Boolean(b) if n == ENABLED_OPTION => Some(*b),
                _ => None,
            }),
        },
        ("monitor", Some("list")) => Command::MonitorList,
        ("toggle_author", _) => Command::ToggleAuthor,
        ("help", _) => Command::Help,
        (name, Some(sub)) => return Err(format!("Unknown command `/{name} {sub}`.")),
        (name, None) => return Err(format!("Unknown command `/{name}`.")),
    };
    Ok(command)
}

/// Parse an application command interaction.
pub fn parse(interaction: &CommandInteraction) -> Result<Command, String> {
    let (subcommand, options) = flatten(&interaction.data.options());
    command_from_options(&interaction.data.name, subcommand.as_deref(), &options)
}

#[must_use]
pub fn render(reply: &CommandReply) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(&reply.title)
        .colour(reply.tone.colour());
    if let Some(description) = &reply.description {
        embed = embed.description(description);
    }
    for field in &reply.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }
    embed
}

#[must_use]
pub fn response(reply: &CommandReply) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .embed(render(reply))
            .ephemeral(reply.ephemeral),
    )
}
