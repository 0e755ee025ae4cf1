use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    application::{
        notifier::{self, NotifyError},
        reconcile,
        state::SharedState,
    },
    domain::models::{Channel, Channels, Member, Teams},
};

const JOIN_CHANNEL_HINT: &str = "You need to run the command inside the channel you want to add. \
If you are trying to add a private channel please run /invite @connect-management.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    CreateTeam { team: String },
    RemoveTeam { team: String },
    AddMember { team: String, member_id: String },
    RemoveMember { team: String, member_id: String },
    PrintTeams,
    PrintChannels,
    PrintMembers { team: String },
    Invite { team: String },
    Ping { team: String, channel: String },
    AddChannel,
    RemoveChannel { channel: String },
    Unknown { verb: String },
}

/// Arity and option problems found while parsing; the message is shown to the user verbatim.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CommandError(&'static str);

impl Command {
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let tokens = text.split_whitespace().collect::<Vec<_>>();
        let Some((verb, args)) = tokens.split_first() else {
            return Ok(Self::Help);
        };

        let arg = |index: usize| args.get(index).map(|value| (*value).to_owned());
        let command = match *verb {
            "help" | "-h" => Self::Help,
            "create-team" => Self::CreateTeam {
                team: arg(0).ok_or(CommandError("Please provide a team name to create."))?,
            },
            "remove-team" => Self::RemoveTeam {
                team: arg(0).ok_or(CommandError("Please provide a team name to remove."))?,
            },
            "add" => match (arg(0), arg(1)) {
                (Some(team), Some(member_id)) => Self::AddMember { team, member_id },
                _ => {
                    return Err(CommandError(
                        "Please provide a team name and a member ID to add.",
                    ));
                }
            },
            "remove" => match (arg(0), arg(1)) {
                (Some(team), Some(member_id)) => Self::RemoveMember { team, member_id },
                _ => {
                    return Err(CommandError(
                        "Please provide a team name and a member ID to remove.",
                    ));
                }
            },
            "print" => match args.first().copied() {
                None => {
                    return Err(CommandError(
                        "Please specify what to print: teams, channels, or members <team>.",
                    ));
                }
                Some("teams") => Self::PrintTeams,
                Some("channels") => Self::PrintChannels,
                Some("members") => Self::PrintMembers {
                    team: arg(1).ok_or(CommandError("Please provide a team name to print members."))?,
                },
                Some(_) => {
                    return Err(CommandError(
                        "Invalid print option. Use 'teams', 'channels', or 'members <team>'.",
                    ));
                }
            },
            "invite" => Self::Invite {
                team: arg(0).ok_or(CommandError("Please provide a team name for invitation."))?,
            },
            "ping" => match (arg(0), arg(1)) {
                (Some(team), Some(channel)) => Self::Ping { team, channel },
                _ => {
                    return Err(CommandError(
                        "Please provide a team name and a channel name to ping.",
                    ));
                }
            },
            "add-channel" => Self::AddChannel,
            "remove-channel" => Self::RemoveChannel {
                channel: arg(0).ok_or(CommandError("Please provide a channel name to remove."))?,
            },
            other => Self::Unknown {
                verb: other.to_owned(),
            },
        };

        Ok(command)
    }
}

/// Where the slash command was typed. Only `add-channel` reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandContext {
    pub channel_id: String,
    pub channel_name: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub text: String,
    pub ok: bool,
}

impl CommandReply {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ok: true,
        }
    }

    #[must_use]
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ok: false,
        }
    }
}

type Outcome = Result<String, String>;

#[must_use]
pub fn usage_text(command_name: &str) -> String {
    [
        "Available commands:".to_owned(),
        format!("- {command_name} create-team <team>"),
        format!("- {command_name} remove-team <team>"),
        format!("- {command_name} add <team> <member_id>"),
        format!("- {command_name} remove <team> <member_id>"),
        format!("- {command_name} print teams"),
        format!("- {command_name} print channels"),
        format!("- {command_name} print members <team>"),
        format!("- {command_name} invite <team>"),
        format!("- {command_name} ping <team> <channel>"),
        format!("- {command_name} add-channel"),
        format!("- {command_name} remove-channel <channel>"),
        format!("- {command_name} help or {command_name} -h (shows this help message)"),
    ]
    .join("\n")
}

/// Executes parsed commands against the store. Every path ends in a [`CommandReply`]; store and
/// Slack failures are logged here and turned into text.
#[derive(Clone)]
pub struct CommandRouter {
    state: SharedState,
}

impl CommandRouter {
    #[must_use]
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    pub async fn handle(&self, text: &str, context: &CommandContext) -> CommandReply {
        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(usage) => return CommandReply::failure(usage.to_string()),
        };
        self.execute(command, context).await
    }

    pub async fn execute(&self, command: Command, context: &CommandContext) -> CommandReply {
        info!("processing command {command:?} from user={}", context.user_id);

        let outcome = match command {
            Command::Help => Ok(self.usage()),
            Command::Unknown { verb } => {
                warn!("unknown command verb: {verb}");
                Ok(self.usage())
            }
            Command::CreateTeam { team } => self.create_team(&team).await,
            Command::RemoveTeam { team } => self.remove_team(&team).await,
            Command::AddMember { team, member_id } => self.add_member(&team, &member_id).await,
            Command::RemoveMember { team, member_id } => {
                self.remove_member(&team, &member_id).await
            }
            Command::PrintTeams => self.print_teams().await,
            Command::PrintChannels => self.print_channels().await,
            Command::PrintMembers { team } => self.print_members(&team).await,
            Command::Invite { team } => self.invite(&team).await,
            Command::Ping { team, channel } => self.ping(&team, &channel).await,
            Command::AddChannel => self.add_channel(context).await,
            Command::RemoveChannel { channel } => self.remove_channel(&channel).await,
        };

        match outcome {
            Ok(text) => CommandReply::success(text),
            Err(text) => {
                info!("command rejected: {text}");
                CommandReply::failure(text)
            }
        }
    }

    fn usage(&self) -> String {
        usage_text(&self.state.config().command_name)
    }

    async fn create_team(&self, team: &str) -> Outcome {
        let mut teams = self.load_teams().await?;
        if !teams.create(team) {
            return Err(format!("Team '{team}' already exists."));
        }
        self.save_teams(&teams).await?;
        Ok(format!("Team '{team}' has been created."))
    }

    async fn remove_team(&self, team: &str) -> Outcome {
        let mut teams = self.load_teams().await?;
        if !teams.remove(team) {
            return Err(missing_team(team));
        }
        self.save_teams(&teams).await?;
        Ok(format!("Team '{team}' has been removed."))
    }

    async fn add_member(&self, team: &str, member_id: &str) -> Outcome {
        let mut teams = self.load_teams().await?;
        let Some(entry) = teams.get_mut(team) else {
            return Err(missing_team(team));
        };
        if entry.has_member(member_id) {
            return Err(format!("User {member_id} is already in team '{team}'."));
        }

        let profile = self
            .state
            .slack()
            .user_profile(member_id)
            .await
            .map_err(|error| {
                error!("failed to fetch user info for {member_id}: {error}");
                format!("Error getting user info: {error}")
            })?;
        let name = profile.resolved_name().to_owned();

        info!("adding user {member_id} ({name}) to team {team}");
        entry.push_member(Member::new(member_id, name.as_str()));
        self.save_teams(&teams).await?;

        // The users registry is a separate document; a failure here leaves the team updated and is
        // repaired by the next refresh of a channel the user is in.
        match self.state.store().load_users().await {
            Ok(mut users) => {
                users.reset(member_id, &name, Utc::now());
                if let Err(error) = self.state.store().save_users(&users).await {
                    error!("failed to save users after adding {member_id}: {error}");
                }
            }
            Err(error) => error!("failed to read users after adding {member_id}: {error}"),
        }

        Ok(format!("Added user {name} ({member_id}) to team '{team}'."))
    }

    async fn remove_member(&self, team: &str, member_id: &str) -> Outcome {
        let mut teams = self.load_teams().await?;
        let Some(entry) = teams.get_mut(team) else {
            return Err(missing_team(team));
        };
        if entry.remove_member(member_id).is_none() {
            return Err(format!("User {member_id} is not in team '{team}'."));
        }
        self.save_teams(&teams).await?;
        Ok(format!("Removed user {member_id} from team '{team}'."))
    }

    async fn print_teams(&self) -> Outcome {
        let teams = self.load_teams().await?;
        let names = teams.names().collect::<Vec<_>>();
        if names.is_empty() {
            return Ok("No teams found.".to_owned());
        }
        Ok(format!("Teams: {}", names.join(", ")))
    }

    async fn print_channels(&self) -> Outcome {
        let channels = self.load_channels().await?;
        let names = channels.names().collect::<Vec<_>>();
        if names.is_empty() {
            return Ok("No channels found.".to_owned());
        }
        Ok(format!("Channels: {}", names.join(", ")))
    }

    async fn print_members(&self, team: &str) -> Outcome {
        let teams = self.load_teams().await?;
        let entry = teams.get(team).ok_or_else(|| missing_team(team))?;
        if entry.members.is_empty() {
            return Ok(format!("No members found in team '{team}'."));
        }
        let labels = entry.members.iter().map(Member::label).collect::<Vec<_>>();
        Ok(format!("Members of team '{team}': {}", labels.join(", ")))
    }

    async fn invite(&self, team: &str) -> Outcome {
        let teams = self.load_teams().await?;
        let entry = teams.get(team).ok_or_else(|| missing_team(team))?;
        let ids = entry.member_ids().collect::<Vec<_>>();
        Ok(format!(
            "To invite team '{team}', use these member IDs: {}",
            ids.join(", ")
        ))
    }

    async fn ping(&self, team: &str, channel_name: &str) -> Outcome {
        let teams = self.load_teams().await?;
        let entry = teams.get(team).ok_or_else(|| missing_team(team))?;

        let channels = self.load_channels().await?;
        let channel_id = channels
            .find_id_by_name(channel_name)
            .ok_or_else(|| format!("Channel '{channel_name}' not found."))?;

        match notifier::ping_members(self.state.slack(), channel_id, entry.member_ids()).await {
            Ok(_) => Ok(format!(
                "Successfully pinged team '{team}' in #{channel_name}."
            )),
            Err(NotifyError::NoRecipients) => Err(format!("No members of team '{team}' found.")),
            Err(error) => {
                error!("failed to ping team {team} in channel {channel_id}: {error}");
                Err(format!("Error pinging team: {error}"))
            }
        }
    }

    async fn add_channel(&self, context: &CommandContext) -> Outcome {
        let channel_id = context.channel_id.trim();
        let channel_name = context.channel_name.trim();
        if channel_id.is_empty() || channel_name.is_empty() {
            warn!("add-channel invoked without channel context");
            return Err(JOIN_CHANNEL_HINT.to_owned());
        }

        let mut channels = self
            .load_channels()
            .await
            .map_err(|_| JOIN_CHANNEL_HINT.to_owned())?;
        if channels.contains(channel_id) {
            return Err(format!("Channel #{channel_name} is already being tracked."));
        }

        if let Err(error) = self.state.slack().join_channel(channel_id).await {
            error!("failed to join channel {channel_id}: {error}");
            return Err(JOIN_CHANNEL_HINT.to_owned());
        }

        channels.insert(Channel {
            id: channel_id.to_owned(),
            name: channel_name.to_owned(),
        });
        self.save_channels(&channels).await?;

        let _detached = reconcile::spawn_channel_refresh(self.state.clone(), channel_id.to_owned());
        info!("tracking channel #{channel_name} ({channel_id})");
        Ok(format!(
            "Channel #{channel_name} has been added to the tracking list."
        ))
    }

    async fn remove_channel(&self, channel_name: &str) -> Outcome {
        let mut channels = self.load_channels().await?;
        let Some(channel_id) = channels.find_id_by_name(channel_name).map(str::to_owned) else {
            return Err(format!("Channel #{channel_name} is not being tracked."));
        };
        channels.remove(&channel_id);
        self.save_channels(&channels).await?;
        Ok(format!(
            "Channel #{channel_name} has been removed from the tracking list."
        ))
    }

    async fn load_teams(&self) -> Result<Teams, String> {
        self.state.store().load_teams().await.map_err(|error| {
            error!("failed to read teams: {error}");
            "Error reading teams.".to_owned()
        })
    }

    async fn save_teams(&self, teams: &Teams) -> Result<(), String> {
        self.state.store().save_teams(teams).await.map_err(|error| {
            error!("failed to write teams: {error}");
            "Error writing to teams.".to_owned()
        })
    }

    async fn load_channels(&self) -> Result<Channels, String> {
        self.state.store().load_channels().await.map_err(|error| {
            error!("failed to read channels: {error}");
            "Error reading channels.".to_owned()
        })
    }

    async fn save_channels(&self, channels: &Channels) -> Result<(), String> {
        self.state
            .store()
            .save_channels(channels)
            .await
            .map_err(|error| {
                error!("failed to write channels: {error}");
                "Error writing to channels file.".to_owned()
            })
    }
}

fn missing_team(team: &str) -> String {
    format!("Team '{team}' does not exist.")
}
